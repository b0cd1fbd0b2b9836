//! Per-account balance aggregation over the booking list, as of an
//! inclusive cutoff date.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::ledger::records::Entry;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebitCredit {
    pub debit: Decimal,
    pub credit: Decimal,
}

/// Running debit/credit totals per account for every entry on or before
/// the cutoff. The comparison is plain string order; an entry with an
/// empty date sorts before any cutoff and is therefore counted. An empty
/// cutoff yields an empty map.
pub fn account_totals(entries: &[Entry], cutoff: &str) -> HashMap<String, DebitCredit> {
    let mut totals: HashMap<String, DebitCredit> = HashMap::new();
    if cutoff.is_empty() {
        return totals;
    }

    for entry in entries {
        if entry.date.as_str() > cutoff {
            continue;
        }
        if let Some(account) = &entry.debit {
            totals.entry(account.clone()).or_default().debit += entry.amount;
        }
        if let Some(account) = &entry.credit {
            totals.entry(account.clone()).or_default().credit += entry.amount;
        }
    }

    totals
}

/// Income-statement balances: revenue accounts (prefix "4") carry
/// debit - credit, expense accounts (prefix "3") credit - debit. Other
/// accounts are absent; callers treat absent as zero.
pub fn statement_balances(entries: &[Entry], cutoff: &str) -> HashMap<String, Decimal> {
    let mut saldo = HashMap::new();
    for (account, totals) in account_totals(entries, cutoff) {
        if account.starts_with('4') {
            saldo.insert(account, totals.debit - totals.credit);
        } else if account.starts_with('3') {
            saldo.insert(account, totals.credit - totals.debit);
        }
    }
    saldo
}

/// Balance-sheet balances: asset accounts (prefix "1") carry
/// debit - credit, liability accounts (prefix "2") credit - debit.
pub fn balance_sheet_balances(entries: &[Entry], cutoff: &str) -> HashMap<String, Decimal> {
    let mut saldo = HashMap::new();
    for (account, totals) in account_totals(entries, cutoff) {
        if account.starts_with('1') {
            saldo.insert(account, totals.debit - totals.credit);
        } else if account.starts_with('2') {
            saldo.insert(account, totals.credit - totals.debit);
        }
    }
    saldo
}

/// Profit as of the cutoff: expense minus revenue over the statement
/// balances. The sign convention follows the statement balances above
/// and must not be "corrected".
pub fn profit(entries: &[Entry], cutoff: &str) -> Decimal {
    let saldo = statement_balances(entries, cutoff);

    let mut revenue = Decimal::ZERO;
    let mut expense = Decimal::ZERO;
    for (account, balance) in &saldo {
        if account.starts_with('4') {
            revenue += *balance;
        } else if account.starts_with('3') {
            expense += *balance;
        }
    }

    expense - revenue
}
