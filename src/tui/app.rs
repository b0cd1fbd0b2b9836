use std::collections::HashSet;
use std::time::{Duration, Instant};

use chrono::Local;

use crate::api::Session;
use crate::grid::editor::GridEditor;
use crate::grid::resource::{AccountsResource, BookingsResource, COL_CREDIT, COL_DEBIT};
use crate::ledger::records::Entry;
use crate::ledger::report::ChartAccount;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Screen {
    Accounts,
    Bookings,
    Statement,
    BalanceSheet,
    Help,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    EditingCell,
    PickingAccount,
    EditingDate,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Error,
}

/// Transient notification; expires on its own after three seconds.
#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    raised_at: Instant,
}

impl Toast {
    const LIFETIME: Duration = Duration::from_secs(3);

    pub fn new(kind: ToastKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
            raised_at: Instant::now(),
        }
    }

    pub fn expired(&self) -> bool {
        self.raised_at.elapsed() >= Self::LIFETIME
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LoginStep {
    Choose,
    Login,
    Register,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LoginField {
    Project,
    Password,
}

pub struct LoginApp {
    pub project: String,
    pub password: String,
    pub field: LoginField,
    pub step: LoginStep,
    pub toast: Option<Toast>,
    pub should_quit: bool,
}

impl LoginApp {
    pub fn new() -> Self {
        Self {
            project: String::new(),
            password: String::new(),
            field: LoginField::Project,
            step: LoginStep::Choose,
            toast: None,
            should_quit: false,
        }
    }

    pub fn notify(&mut self, kind: ToastKind, message: impl Into<String>) {
        self.toast = Some(Toast::new(kind, message));
    }

    pub fn tick(&mut self) {
        if self.toast.as_ref().is_some_and(Toast::expired) {
            self.toast = None;
        }
    }
}

impl Default for LoginApp {
    fn default() -> Self {
        Self::new()
    }
}

pub struct App {
    pub session: Session,
    pub accounts: GridEditor<AccountsResource>,
    pub bookings: GridEditor<BookingsResource>,
    pub current_screen: Screen,
    pub input_mode: InputMode,
    pub accounts_cursor: (usize, usize),
    pub bookings_cursor: (usize, usize),
    pub edit_buffer: String,
    /// (account number, display label) pairs; index 0 is the empty choice.
    pub picker_options: Vec<(String, String)>,
    pub picker_idx: usize,
    pub statement_to: String,
    pub balance_date: String,
    pub date_buffer: String,
    pub toast: Option<Toast>,
    pub should_quit: bool,
    pub logout: bool,
}

impl App {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            accounts: GridEditor::new(AccountsResource),
            bookings: GridEditor::new(BookingsResource),
            current_screen: Screen::Accounts,
            input_mode: InputMode::Normal,
            accounts_cursor: (0, 0),
            bookings_cursor: (0, 0),
            edit_buffer: String::new(),
            picker_options: Vec::new(),
            picker_idx: 0,
            statement_to: String::new(),
            balance_date: String::new(),
            date_buffer: String::new(),
            toast: None,
            should_quit: false,
            logout: false,
        }
    }

    pub fn next_screen(&mut self) {
        self.current_screen = match self.current_screen {
            Screen::Accounts => Screen::Bookings,
            Screen::Bookings => Screen::Statement,
            Screen::Statement => Screen::BalanceSheet,
            Screen::BalanceSheet => Screen::Help,
            Screen::Help => Screen::Accounts,
        };
    }

    pub fn prev_screen(&mut self) {
        self.current_screen = match self.current_screen {
            Screen::Accounts => Screen::Help,
            Screen::Bookings => Screen::Accounts,
            Screen::Statement => Screen::Bookings,
            Screen::BalanceSheet => Screen::Statement,
            Screen::Help => Screen::BalanceSheet,
        };
    }

    pub fn notify(&mut self, kind: ToastKind, message: impl Into<String>) {
        self.toast = Some(Toast::new(kind, message));
    }

    pub fn tick(&mut self) {
        if self.toast.as_ref().is_some_and(Toast::expired) {
            self.toast = None;
        }
    }

    pub fn today() -> String {
        Local::now().date_naive().to_string()
    }

    /// Cursor of the grid behind the current screen.
    pub fn cursor(&self) -> (usize, usize) {
        match self.current_screen {
            Screen::Bookings => self.bookings_cursor,
            _ => self.accounts_cursor,
        }
    }

    pub fn move_cursor(&mut self, delta_row: isize, delta_col: isize) {
        let (rows, cols) = match self.current_screen {
            Screen::Accounts => (self.accounts.row_count(), self.accounts.columns().len()),
            Screen::Bookings => (self.bookings.row_count(), self.bookings.columns().len()),
            _ => return,
        };
        if rows == 0 {
            return;
        }
        let cursor = match self.current_screen {
            Screen::Bookings => &mut self.bookings_cursor,
            _ => &mut self.accounts_cursor,
        };
        let row = cursor.0.saturating_add_signed(delta_row).min(rows - 1);
        let col = cursor.1.saturating_add_signed(delta_col).min(cols - 1);
        *cursor = (row, col);
    }

    /// Clamp both cursors after loads and deletions shrink the grids.
    pub fn clamp_cursors(&mut self) {
        let clamp = |cursor: &mut (usize, usize), rows: usize| {
            if rows == 0 {
                cursor.0 = 0;
            } else if cursor.0 >= rows {
                cursor.0 = rows - 1;
            }
        };
        clamp(&mut self.accounts_cursor, self.accounts.row_count());
        clamp(&mut self.bookings_cursor, self.bookings.row_count());
    }

    /// Chart accounts as the report layer sees them, straight from the
    /// grid's current cells.
    pub fn chart_accounts(&self) -> Vec<ChartAccount> {
        self.accounts
            .rows()
            .iter()
            .map(|row| ChartAccount {
                number: row.cell(0).to_string(),
                name: row.cell(1).to_string(),
            })
            .collect()
    }

    /// Aggregation input: the bookings grid's current, possibly unsaved
    /// rows.
    pub fn entries(&self) -> Vec<Entry> {
        BookingsResource::entries(self.bookings.rows())
    }

    /// Account choices for the debit/credit picker: the empty choice
    /// first, then every chart row that has a number.
    pub fn account_options(&self) -> Vec<(String, String)> {
        let mut options = vec![(String::new(), "---".to_string())];
        for row in self.accounts.rows() {
            let number = row.cell(0);
            if number.is_empty() {
                continue;
            }
            options.push((number.to_string(), format!("{} - {}", number, row.cell(1))));
        }
        options
    }

    /// Post-save contract between the grids: once the chart changed,
    /// clear every booking debit/credit reference to an account that no
    /// longer exists and mark those rows for the next save.
    pub fn reconcile_booking_accounts(&mut self) {
        let known: HashSet<String> = self
            .accounts
            .rows()
            .iter()
            .map(|row| row.cell(0).to_string())
            .filter(|number| !number.is_empty())
            .collect();

        for idx in 0..self.bookings.row_count() {
            for col in [COL_DEBIT, COL_CREDIT] {
                let cell = self.bookings.rows()[idx].cell(col).to_string();
                if !cell.is_empty() && !known.contains(&cell) {
                    self.bookings.edit(idx, col, String::new());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::records::{Account, Booking};

    fn app() -> App {
        App::new(Session::new("http://localhost:1"))
    }

    fn chart(app: &mut App, numbers: &[(i64, &str)]) {
        app.accounts.apply_records(
            numbers
                .iter()
                .map(|(number, name)| Account {
                    number: *number,
                    name: Some(name.to_string()),
                })
                .collect(),
        );
    }

    fn booking(number: i64, debit: Option<i64>, credit: Option<i64>) -> Booking {
        Booking {
            number,
            date: Some("2024-01-01".to_string()),
            text: None,
            debit,
            credit,
            amount: Some(rust_decimal::Decimal::from(10)),
        }
    }

    #[test]
    fn account_options_start_with_the_empty_choice() {
        let mut app = app();
        chart(&mut app, &[(1000, "Cash"), (2000, "Loan")]);

        let options = app.account_options();
        assert_eq!(options[0], (String::new(), "---".to_string()));
        assert_eq!(options[1], ("1000".to_string(), "1000 - Cash".to_string()));
        assert_eq!(options.len(), 3);
    }

    #[test]
    fn reconcile_clears_dangling_references_and_marks_rows() {
        let mut app = app();
        chart(&mut app, &[(1000, "Cash")]);
        app.bookings.apply_records(vec![
            booking(1, Some(1000), Some(4000)),
            booking(2, Some(1000), Some(1000)),
        ]);

        app.reconcile_booking_accounts();

        // 4000 vanished from the chart; the reference is cleared and the
        // row flagged for the next save.
        assert_eq!(app.bookings.rows()[0].cell(COL_CREDIT), "");
        assert_eq!(app.bookings.rows()[0].cell(COL_DEBIT), "1000");
        assert!(app.bookings.is_changed(0));
        assert!(!app.bookings.is_changed(1));
    }

    #[test]
    fn screen_cycle_is_a_loop() {
        let mut app = app();
        let start = app.current_screen;
        for _ in 0..5 {
            app.next_screen();
        }
        assert_eq!(app.current_screen, start);
        app.prev_screen();
        assert_eq!(app.current_screen, Screen::Help);
    }

    #[test]
    fn cursor_clamps_to_grid_bounds() {
        let mut app = app();
        chart(&mut app, &[(1000, "Cash"), (2000, "Loan")]);

        app.move_cursor(10, 10);
        assert_eq!(app.accounts_cursor, (1, 1));
        app.move_cursor(-10, -10);
        assert_eq!(app.accounts_cursor, (0, 0));
    }
}
