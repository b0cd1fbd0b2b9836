//! Two-sided report assembly for the statement and balance-sheet views.

use std::collections::HashMap;

use rust_decimal::Decimal;

/// A chart account as the view layer knows it: the raw number cell plus
/// the display name. Numbers stay strings so they match the balance-map
/// keys regardless of edit state.
#[derive(Debug, Clone)]
pub struct ChartAccount {
    pub number: String,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct ReportLine {
    pub left: Option<(String, Decimal)>,
    pub right: Option<(String, Decimal)>,
}

#[derive(Debug, Clone)]
pub struct Report {
    pub lines: Vec<ReportLine>,
    pub left_total: Decimal,
    pub right_total: Decimal,
}

impl Report {
    /// Side totals agree within the view tolerance of 0.0001.
    pub fn balanced(&self) -> bool {
        let tolerance = Decimal::new(1, 4);
        (self.left_total - self.right_total).abs() <= tolerance
    }
}

fn side(
    accounts: &[ChartAccount],
    prefix: char,
    balances: &HashMap<String, Decimal>,
) -> Vec<(String, Decimal)> {
    accounts
        .iter()
        .filter(|a| a.number.starts_with(prefix))
        .map(|a| {
            let balance = balances.get(&a.number).copied().unwrap_or(Decimal::ZERO);
            (format!("{} - {}", a.number, a.name), balance)
        })
        .collect()
}

fn two_sided(left: Vec<(String, Decimal)>, right: Vec<(String, Decimal)>) -> Report {
    let left_total: Decimal = left.iter().map(|(_, amount)| *amount).sum();
    let right_total: Decimal = right.iter().map(|(_, amount)| *amount).sum();

    let rows = left.len().max(right.len());
    let mut left = left.into_iter();
    let mut right = right.into_iter();
    let lines = (0..rows)
        .map(|_| ReportLine {
            left: left.next(),
            right: right.next(),
        })
        .collect();

    Report {
        lines,
        left_total,
        right_total,
    }
}

/// Income statement: expense accounts (prefix "3") on the left against
/// revenue accounts (prefix "4") on the right. Totals cover chart
/// accounts only; an account that is booked but missing from the chart
/// shows up in `profit` yet not here.
pub fn statement_report(
    accounts: &[ChartAccount],
    balances: &HashMap<String, Decimal>,
) -> Report {
    two_sided(side(accounts, '3', balances), side(accounts, '4', balances))
}

/// Balance sheet: assets (prefix "1") against liabilities (prefix "2"),
/// with the period profit/loss appended to the liability side.
pub fn balance_report(
    accounts: &[ChartAccount],
    balances: &HashMap<String, Decimal>,
    profit: Decimal,
) -> Report {
    let mut report = two_sided(side(accounts, '1', balances), side(accounts, '2', balances));
    report.lines.push(ReportLine {
        left: None,
        right: Some(("Profit / loss".to_string(), profit)),
    });
    report.right_total += profit;
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart(entries: &[(&str, &str)]) -> Vec<ChartAccount> {
        entries
            .iter()
            .map(|(number, name)| ChartAccount {
                number: number.to_string(),
                name: name.to_string(),
            })
            .collect()
    }

    fn balances(entries: &[(&str, i64)]) -> HashMap<String, Decimal> {
        entries
            .iter()
            .map(|(account, amount)| (account.to_string(), Decimal::from(*amount)))
            .collect()
    }

    #[test]
    fn statement_pairs_expenses_against_revenues() {
        let accounts = chart(&[
            ("1000", "Cash"),
            ("3000", "Rent"),
            ("3100", "Wages"),
            ("4000", "Sales"),
        ]);
        let saldo = balances(&[("3000", 40), ("3100", 10), ("4000", -100)]);

        let report = statement_report(&accounts, &saldo);

        assert_eq!(report.lines.len(), 2);
        assert_eq!(
            report.lines[0].left,
            Some(("3000 - Rent".to_string(), Decimal::from(40)))
        );
        assert_eq!(
            report.lines[0].right,
            Some(("4000 - Sales".to_string(), Decimal::from(-100)))
        );
        assert_eq!(report.lines[1].right, None);
        assert_eq!(report.left_total, Decimal::from(50));
        assert_eq!(report.right_total, Decimal::from(-100));
    }

    #[test]
    fn chart_account_without_bookings_shows_zero() {
        let accounts = chart(&[("3000", "Rent")]);
        let report = statement_report(&accounts, &HashMap::new());

        assert_eq!(
            report.lines[0].left,
            Some(("3000 - Rent".to_string(), Decimal::ZERO))
        );
        assert_eq!(report.left_total, Decimal::ZERO);
    }

    #[test]
    fn booked_account_missing_from_chart_is_not_summed() {
        let accounts = chart(&[("3000", "Rent")]);
        let saldo = balances(&[("3000", 40), ("3999", 60)]);

        let report = statement_report(&accounts, &saldo);
        assert_eq!(report.left_total, Decimal::from(40));
    }

    #[test]
    fn balance_report_appends_profit_to_the_liability_side() {
        let accounts = chart(&[("1000", "Cash"), ("2000", "Loan")]);
        let saldo = balances(&[("1000", 100), ("2000", 60)]);

        let report = balance_report(&accounts, &saldo, Decimal::from(40));

        let last = report.lines.last().unwrap();
        assert_eq!(last.left, None);
        assert_eq!(
            last.right,
            Some(("Profit / loss".to_string(), Decimal::from(40)))
        );
        assert_eq!(report.left_total, Decimal::from(100));
        assert_eq!(report.right_total, Decimal::from(100));
        assert!(report.balanced());
    }

    #[test]
    fn imbalance_beyond_tolerance_is_flagged() {
        let accounts = chart(&[("1000", "Cash"), ("2000", "Loan")]);
        let saldo = balances(&[("1000", 100), ("2000", 99)]);

        let report = balance_report(&accounts, &saldo, Decimal::ZERO);
        assert!(!report.balanced());

        let report = balance_report(&accounts, &saldo, Decimal::from(1));
        assert!(report.balanced());
    }
}
