use fibu::grid::editor::GridEditor;
use fibu::grid::resource::{AccountsResource, BookingsResource, COL_AMOUNT, COL_DATE, COL_TEXT};
use fibu::ledger::records::{Account, Booking};
use serde_json::json;

fn booking(number: i64, date: &str, text: &str, debit: i64, credit: i64, amount: &str) -> Booking {
    Booking {
        number,
        date: Some(date.to_string()),
        text: Some(text.to_string()),
        debit: Some(debit),
        credit: Some(credit),
        amount: Some(amount.parse().unwrap()),
    }
}

fn account(number: i64, name: &str) -> Account {
    Account {
        number,
        name: Some(name.to_string()),
    }
}

#[test]
fn edited_row_serializes_and_reload_clears_dirty_state() {
    let mut grid = GridEditor::new(BookingsResource);
    grid.apply_records(vec![
        booking(1, "2024-01-01", "sale", 1000, 4000, "100"),
        booking(2, "2024-01-02", "rent", 3000, 1000, "50"),
    ]);

    grid.edit(1, COL_AMOUNT, "75".to_string());
    assert!(grid.has_changes());

    // Only the edited row travels, in backend shape.
    let payload = grid.build_payload().unwrap();
    assert_eq!(
        payload,
        json!({
            "entries": [{
                "id": 2,
                "date": "2024-01-02",
                "text": "rent",
                "debit": 3000,
                "credit": 1000,
                "amount": 75.0,
            }]
        })
    );

    // The backend answers the subsequent load with the persisted state.
    grid.apply_records(vec![
        booking(1, "2024-01-01", "sale", 1000, 4000, "100"),
        booking(2, "2024-01-02", "rent", 3000, 1000, "75"),
    ]);

    assert!(!grid.has_changes());
    assert_eq!(grid.rows()[1].cell(COL_AMOUNT), "75");
    assert_eq!(grid.build_payload(), None);
}

#[test]
fn added_row_travels_without_an_id_and_lands_with_one() {
    let mut grid = GridEditor::new(BookingsResource);
    grid.apply_records(vec![booking(1, "2024-01-01", "sale", 1000, 4000, "100")]);

    grid.add_row();
    let idx = grid.row_count() - 1;
    grid.edit(idx, COL_DATE, "2024-02-01".to_string());
    grid.edit(idx, COL_TEXT, "wages".to_string());
    grid.edit(idx, COL_AMOUNT, "20".to_string());

    let payload = grid.build_payload().unwrap();
    let entries = payload["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["id"], json!(null));
    assert_eq!(entries[0]["text"], json!("wages"));
    assert_eq!(entries[0]["debit"], json!(null));

    // After the save the backend hands the row back with its number.
    grid.apply_records(vec![
        booking(1, "2024-01-01", "sale", 1000, 4000, "100"),
        booking(2, "2024-02-01", "wages", 3000, 1000, "20"),
    ]);

    assert!(!grid.has_changes());
    assert_eq!(grid.row_count(), 2);
    assert!(!grid.rows()[1].is_new);
}

#[test]
fn deleted_row_is_gone_after_the_reload() {
    let mut grid = GridEditor::new(BookingsResource);
    grid.apply_records(vec![
        booking(1, "2024-01-01", "sale", 1000, 4000, "100"),
        booking(2, "2024-01-02", "rent", 3000, 1000, "50"),
    ]);

    grid.toggle_delete(0);
    let payload = grid.build_payload().unwrap();
    assert_eq!(
        payload,
        json!({
            "entries": [{
                "id": 1,
                "date": null,
                "text": null,
                "debit": null,
                "credit": null,
                "amount": null,
            }]
        })
    );

    grid.apply_records(vec![booking(2, "2024-01-02", "rent", 3000, 1000, "50")]);

    assert_eq!(grid.row_count(), 1);
    assert_eq!(grid.rows()[0].cell(0), "2");
    assert!(!grid.has_changes());
}

#[test]
fn accounts_grid_roundtrip_keeps_backend_sorted_order() {
    let mut grid = GridEditor::new(AccountsResource);
    grid.apply_records(vec![account(1000, "Cash"), account(4000, "Sales")]);

    grid.add_row();
    grid.edit(2, 0, "3000".to_string());
    grid.edit(2, 1, "Rent".to_string());

    let payload = grid.build_payload().unwrap();
    assert_eq!(
        payload,
        json!({ "accounts": [{ "number": 3000, "name": "Rent" }] })
    );

    // Reload comes back sorted by number, new row in the middle.
    grid.apply_records(vec![
        account(4000, "Sales"),
        account(1000, "Cash"),
        account(3000, "Rent"),
    ]);

    let numbers: Vec<&str> = grid.rows().iter().map(|row| row.cell(0)).collect();
    assert_eq!(numbers, vec!["1000", "3000", "4000"]);
    assert!(!grid.has_changes());
}
