//! Per-resource editing strategies: each backend resource declares its
//! path, columns, and its own save-time field coercion rules.

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::grid::editor::Row;
use crate::ledger::records::{Account, Booking, Entry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Date,
    Text,
    /// References a chart account; edited through the account picker.
    AccountRef,
    Amount,
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

pub trait Resource {
    type Record: DeserializeOwned + Clone;

    fn path(&self) -> &'static str;
    fn payload_key(&self) -> &'static str;
    fn columns(&self) -> &'static [Column];
    fn cells(&self, record: &Self::Record) -> Vec<String>;
    fn sort_key(&self, record: &Self::Record) -> i64;
    /// Serialize one dirty row into the backend diff shape. Cleared and
    /// deleted fields go out as JSON null.
    fn row_payload(&self, row: &Row) -> Value;
}

fn integer_value(cell: &str) -> Value {
    cell.trim()
        .parse::<i64>()
        .ok()
        .map(Value::from)
        .unwrap_or(Value::Null)
}

fn amount_value(cell: &str) -> Value {
    cell.trim()
        .parse::<f64>()
        .ok()
        .map(Value::from)
        .unwrap_or(Value::Null)
}

pub struct AccountsResource;

const ACCOUNT_COLUMNS: &[Column] = &[
    Column {
        name: "number",
        kind: ColumnKind::Integer,
    },
    Column {
        name: "name",
        kind: ColumnKind::Text,
    },
];

impl Resource for AccountsResource {
    type Record = Account;

    fn path(&self) -> &'static str {
        "accounts"
    }

    fn payload_key(&self) -> &'static str {
        "accounts"
    }

    fn columns(&self) -> &'static [Column] {
        ACCOUNT_COLUMNS
    }

    fn cells(&self, record: &Account) -> Vec<String> {
        vec![
            record.number.to_string(),
            record.name.clone().unwrap_or_default(),
        ]
    }

    fn sort_key(&self, record: &Account) -> i64 {
        record.number
    }

    fn row_payload(&self, row: &Row) -> Value {
        let mut object = Map::new();
        for (idx, column) in self.columns().iter().enumerate() {
            let cell = row.cell(idx);
            let value = if column.kind == ColumnKind::Integer {
                // A deleted row keeps its number so the backend knows
                // which record to drop.
                integer_value(cell)
            } else if row.deleted || cell.is_empty() {
                Value::Null
            } else {
                Value::String(cell.to_string())
            };
            object.insert(column.name.to_string(), value);
        }
        Value::Object(object)
    }
}

pub struct BookingsResource;

const BOOKING_COLUMNS: &[Column] = &[
    Column {
        name: "number",
        kind: ColumnKind::Integer,
    },
    Column {
        name: "date",
        kind: ColumnKind::Date,
    },
    Column {
        name: "text",
        kind: ColumnKind::Text,
    },
    Column {
        name: "debit",
        kind: ColumnKind::AccountRef,
    },
    Column {
        name: "credit",
        kind: ColumnKind::AccountRef,
    },
    Column {
        name: "amount",
        kind: ColumnKind::Amount,
    },
];

pub const COL_NUMBER: usize = 0;
pub const COL_DATE: usize = 1;
pub const COL_TEXT: usize = 2;
pub const COL_DEBIT: usize = 3;
pub const COL_CREDIT: usize = 4;
pub const COL_AMOUNT: usize = 5;

impl Resource for BookingsResource {
    type Record = Booking;

    fn path(&self) -> &'static str {
        "bookings"
    }

    fn payload_key(&self) -> &'static str {
        "entries"
    }

    fn columns(&self) -> &'static [Column] {
        BOOKING_COLUMNS
    }

    fn cells(&self, record: &Booking) -> Vec<String> {
        vec![
            record.number.to_string(),
            record.date.clone().unwrap_or_default(),
            record.text.clone().unwrap_or_default(),
            record.debit.map(|n| n.to_string()).unwrap_or_default(),
            record.credit.map(|n| n.to_string()).unwrap_or_default(),
            record.amount.map(|a| a.to_string()).unwrap_or_default(),
        ]
    }

    fn sort_key(&self, record: &Booking) -> i64 {
        record.number
    }

    fn row_payload(&self, row: &Row) -> Value {
        let mut object = Map::new();
        // The booking id rides in the number column; rows without a
        // parseable number are creates and send a null id.
        object.insert("id".to_string(), integer_value(row.cell(COL_NUMBER)));

        for (idx, column) in self.columns().iter().enumerate().skip(1) {
            let cell = row.cell(idx);
            let value = if row.deleted || cell.is_empty() {
                Value::Null
            } else {
                match column.kind {
                    ColumnKind::AccountRef => integer_value(cell),
                    ColumnKind::Amount => amount_value(cell),
                    _ => Value::String(cell.to_string()),
                }
            };
            object.insert(column.name.to_string(), value);
        }
        Value::Object(object)
    }
}

impl BookingsResource {
    /// Snapshot the grid's current rows for the aggregator. Soft-deleted
    /// rows still count until they are saved away; unparseable amounts
    /// count as zero.
    pub fn entries(rows: &[Row]) -> Vec<Entry> {
        fn non_empty(cell: &str) -> Option<String> {
            (!cell.is_empty()).then(|| cell.to_string())
        }

        rows.iter()
            .map(|row| Entry {
                date: row.cell(COL_DATE).to_string(),
                debit: non_empty(row.cell(COL_DEBIT)),
                credit: non_empty(row.cell(COL_CREDIT)),
                amount: row
                    .cell(COL_AMOUNT)
                    .trim()
                    .parse()
                    .unwrap_or(Decimal::ZERO),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(cells: &[&str]) -> Row {
        Row {
            cells: cells.iter().map(|c| c.to_string()).collect(),
            is_new: false,
            deleted: false,
        }
    }

    #[test]
    fn booking_payload_coerces_fields() {
        let row = row(&["7", "2024-03-01", "office rent", "3000", "1000", "450.50"]);

        let payload = BookingsResource.row_payload(&row);
        assert_eq!(
            payload,
            json!({
                "id": 7,
                "date": "2024-03-01",
                "text": "office rent",
                "debit": 3000,
                "credit": 1000,
                "amount": 450.5,
            })
        );
    }

    #[test]
    fn booking_blank_and_garbage_cells_become_null() {
        let row = row(&["7", "", "x", "abc", "1000", "oops"]);

        let payload = BookingsResource.row_payload(&row);
        assert_eq!(payload["date"], json!(null));
        assert_eq!(payload["debit"], json!(null));
        assert_eq!(payload["amount"], json!(null));
        assert_eq!(payload["credit"], json!(1000));
    }

    #[test]
    fn new_booking_without_number_sends_null_id() {
        let row = row(&["", "2024-03-01", "opening", "1000", "2000", "10"]);

        let payload = BookingsResource.row_payload(&row);
        assert_eq!(payload["id"], json!(null));
    }

    #[test]
    fn deleted_booking_keeps_only_its_id() {
        let mut row = row(&["7", "2024-03-01", "office rent", "3000", "1000", "450.50"]);
        row.deleted = true;

        let payload = BookingsResource.row_payload(&row);
        assert_eq!(
            payload,
            json!({
                "id": 7,
                "date": null,
                "text": null,
                "debit": null,
                "credit": null,
                "amount": null,
            })
        );
    }

    #[test]
    fn account_payload_sends_strings_and_numbers() {
        let row = row(&["1000", "Cash"]);

        let payload = AccountsResource.row_payload(&row);
        assert_eq!(payload, json!({ "number": 1000, "name": "Cash" }));
    }

    #[test]
    fn deleted_account_keeps_number_and_nulls_the_rest() {
        let mut row = row(&["1000", "Cash"]);
        row.deleted = true;

        let payload = AccountsResource.row_payload(&row);
        assert_eq!(payload, json!({ "number": 1000, "name": null }));
    }

    #[test]
    fn blank_account_cells_become_null() {
        let row = row(&["", ""]);

        let payload = AccountsResource.row_payload(&row);
        assert_eq!(payload, json!({ "number": null, "name": null }));
    }

    #[test]
    fn entries_snapshot_parses_amounts_and_drops_empty_refs() {
        let rows = vec![
            row(&["1", "2024-01-01", "sale", "1000", "4000", "99.90"]),
            row(&["2", "", "draft", "", "2000", "junk"]),
        ];

        let entries = BookingsResource::entries(&rows);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].amount, "99.90".parse().unwrap());
        assert_eq!(entries[0].debit.as_deref(), Some("1000"));
        assert_eq!(entries[1].debit, None);
        assert_eq!(entries[1].credit.as_deref(), Some("2000"));
        assert_eq!(entries[1].amount, Decimal::ZERO);
        assert_eq!(entries[1].date, "");
    }
}
