use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Chart-of-accounts record as the backend serves it. The first digit of
/// `number` classifies the account: 1 asset, 2 liability, 3 expense,
/// 4 revenue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub number: i64,
    #[serde(default)]
    pub name: Option<String>,
}

/// One journal entry: debits one account and credits another for a fixed
/// amount. Persisted bookings always carry a numeric `number`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub number: i64,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub debit: Option<i64>,
    #[serde(default)]
    pub credit: Option<i64>,
    #[serde(default)]
    pub amount: Option<Decimal>,
}

/// Snapshot of one bookings grid row as the aggregator consumes it.
/// Dates stay strings on purpose: the cutoff comparison is lexicographic
/// and only correct for zero-padded ISO dates. Account references are
/// strings because they key the balance maps.
#[derive(Debug, Clone)]
pub struct Entry {
    pub date: String,
    pub debit: Option<String>,
    pub credit: Option<String>,
    pub amount: Decimal,
}
