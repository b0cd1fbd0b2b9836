use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, List, ListItem, Paragraph, Row, Table},
};
use rust_decimal::Decimal;
use tokio::runtime::Runtime;

use super::app::{App, InputMode, LoginApp, LoginField, LoginStep, Screen, Toast, ToastKind};
use crate::api::{Session, TokenStore};
use crate::grid::editor::GridEditor;
use crate::grid::resource::{ColumnKind, Resource};
use crate::ledger::{aggregate, report};

pub fn run(rt: &Runtime, base_url: String, store: TokenStore) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_sessions(rt, &mut terminal, &base_url, &store);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_sessions(
    rt: &Runtime,
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    base_url: &str,
    store: &TokenStore,
) -> Result<()> {
    loop {
        let mut session = Session::new(base_url);
        let mut login = LoginApp::new();
        if !login_loop(rt, terminal, &mut login, &mut session, store)? {
            return Ok(());
        }

        let mut app = App::new(session);
        init_app(rt, &mut app);
        app_loop(rt, terminal, &mut app)?;

        if app.logout {
            store.clear().ok();
            continue;
        }
        return Ok(());
    }
}

fn init_app(rt: &Runtime, app: &mut App) {
    if let Err(e) = rt.block_on(app.accounts.load(&app.session)) {
        app.notify(ToastKind::Error, e.to_string());
        return;
    }
    if let Err(e) = rt.block_on(app.bookings.load(&app.session)) {
        app.notify(ToastKind::Error, e.to_string());
    }
}

// ---------------------------------------------------------------- login

fn login_loop(
    rt: &Runtime,
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    login: &mut LoginApp,
    session: &mut Session,
    store: &TokenStore,
) -> Result<bool> {
    loop {
        terminal.draw(|f| draw_login(f, login))?;

        if login.should_quit {
            return Ok(false);
        }
        if session.is_authenticated() {
            return Ok(true);
        }

        if event::poll(Duration::from_millis(200))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_login_key(rt, login, session, store, key);
                }
            }
        }
        login.tick();
    }
}

fn handle_login_key(
    rt: &Runtime,
    login: &mut LoginApp,
    session: &mut Session,
    store: &TokenStore,
    key: KeyEvent,
) {
    use KeyCode::*;

    match login.step {
        LoginStep::Choose => match key.code {
            Char('l') => {
                login.step = LoginStep::Login;
                login.field = LoginField::Project;
            }
            Char('r') => {
                login.step = LoginStep::Register;
                login.field = LoginField::Project;
            }
            Char('q') | Esc => login.should_quit = true,
            _ => {}
        },
        LoginStep::Login | LoginStep::Register => match key.code {
            Esc => {
                login.step = LoginStep::Choose;
                login.password.clear();
            }
            Tab | BackTab | Up | Down => {
                login.field = match login.field {
                    LoginField::Project => LoginField::Password,
                    LoginField::Password => LoginField::Project,
                };
            }
            Enter => submit_auth(rt, login, session, store),
            Backspace => {
                match login.field {
                    LoginField::Project => login.project.pop(),
                    LoginField::Password => login.password.pop(),
                };
            }
            Char(c) => match login.field {
                LoginField::Project => login.project.push(c),
                LoginField::Password => login.password.push(c),
            },
            _ => {}
        },
    }
}

fn submit_auth(rt: &Runtime, login: &mut LoginApp, session: &mut Session, store: &TokenStore) {
    let project = login.project.trim().to_string();
    let password = login.password.clone();

    match login.step {
        LoginStep::Login => match rt.block_on(session.login(&project, &password)) {
            Ok(()) => {
                if let Some(token) = session.token() {
                    if let Err(e) = store.store(token) {
                        login.notify(ToastKind::Error, format!("could not persist token: {e}"));
                    }
                }
            }
            Err(e) => login.notify(ToastKind::Error, e.to_string()),
        },
        LoginStep::Register => match rt.block_on(session.register(&project, &password)) {
            Ok(true) => {
                login.notify(ToastKind::Success, "Project created - log in now.");
                login.step = LoginStep::Login;
                login.password.clear();
            }
            Ok(false) => login.notify(ToastKind::Error, "Project cannot be created."),
            Err(e) => login.notify(ToastKind::Error, e.to_string()),
        },
        LoginStep::Choose => {}
    }
}

fn draw_login(f: &mut Frame<'_>, login: &LoginApp) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    let header = Paragraph::new("fibu - bookkeeping").block(Block::default().borders(Borders::ALL));
    f.render_widget(header, chunks[0]);

    let (title, body) = match login.step {
        LoginStep::Choose => (
            "Welcome",
            "l: log in\nr: register a new project\nq: quit".to_string(),
        ),
        LoginStep::Login | LoginStep::Register => {
            let masked = "*".repeat(login.password.chars().count());
            (
                if login.step == LoginStep::Login {
                    "Log in"
                } else {
                    "Register"
                },
                format!(
                    "{} Project:  {}\n{} Password: {}",
                    focus_marker(login.field == LoginField::Project),
                    login.project,
                    focus_marker(login.field == LoginField::Password),
                    masked,
                ),
            )
        }
    };
    let form = Paragraph::new(body).block(Block::default().title(title).borders(Borders::ALL));
    f.render_widget(form, chunks[1]);

    let fallback = match login.step {
        LoginStep::Choose => "fibu terminal client",
        _ => "Enter: submit  |  Tab: switch field  |  Esc: back",
    };
    draw_footer(f, chunks[2], &login.toast, fallback);
}

fn focus_marker(focused: bool) -> &'static str {
    if focused { ">" } else { " " }
}

// ------------------------------------------------------------------ app

fn app_loop(
    rt: &Runtime,
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        app.clamp_cursors();
        terminal.draw(|f| ui(f, app))?;

        if app.should_quit || app.logout {
            return Ok(());
        }

        if event::poll(Duration::from_millis(200))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(rt, app, key);
                }
            }
        }
        app.tick();
    }
}

fn handle_key(rt: &Runtime, app: &mut App, key: KeyEvent) {
    match app.input_mode {
        InputMode::Normal => handle_key_normal(rt, app, key),
        InputMode::EditingCell => handle_key_edit_cell(app, key),
        InputMode::PickingAccount => handle_key_pick_account(app, key),
        InputMode::EditingDate => handle_key_edit_date(app, key),
    }
}

fn handle_key_normal(rt: &Runtime, app: &mut App, key: KeyEvent) {
    use KeyCode::*;

    match key.code {
        // Quit / logout
        Char('q') => app.should_quit = true,
        Char('L') => {
            app.session.logout();
            app.logout = true;
        }

        // Screen switch
        Tab => app.next_screen(),
        BackTab => app.prev_screen(),

        // Grid navigation
        Up => app.move_cursor(-1, 0),
        Down => app.move_cursor(1, 0),
        Left => app.move_cursor(0, -1),
        Right => app.move_cursor(0, 1),

        Char('a') => match app.current_screen {
            Screen::Accounts => {
                app.accounts.add_row();
                app.accounts_cursor = (app.accounts.row_count() - 1, 0);
            }
            Screen::Bookings => {
                app.bookings.add_row();
                app.bookings_cursor = (app.bookings.row_count() - 1, 0);
            }
            _ => {}
        },

        Char('d') => match app.current_screen {
            Screen::Accounts => app.accounts.toggle_delete(app.accounts_cursor.0),
            Screen::Bookings => app.bookings.toggle_delete(app.bookings_cursor.0),
            _ => {}
        },

        Char('e') | Enter => match app.current_screen {
            Screen::Accounts | Screen::Bookings => begin_cell_edit(app),
            Screen::Statement | Screen::BalanceSheet => begin_date_edit(app),
            Screen::Help => {}
        },

        Char('t') => match app.current_screen {
            Screen::Statement => app.statement_to = App::today(),
            Screen::BalanceSheet => app.balance_date = App::today(),
            _ => {}
        },

        Char('r') => reload_current(rt, app),
        Char('s') => save_current(rt, app),

        _ => {}
    }
}

fn begin_cell_edit(app: &mut App) {
    let (row, col) = app.cursor();
    let (row_count, columns) = match app.current_screen {
        Screen::Accounts => (app.accounts.row_count(), app.accounts.columns()),
        Screen::Bookings => (app.bookings.row_count(), app.bookings.columns()),
        _ => return,
    };
    if row >= row_count {
        return;
    }

    if columns[col].kind == ColumnKind::AccountRef {
        app.picker_options = app.account_options();
        let current = app.bookings.rows()[row].cell(col);
        app.picker_idx = app
            .picker_options
            .iter()
            .position(|(number, _)| number == current)
            .unwrap_or(0);
        app.input_mode = InputMode::PickingAccount;
    } else {
        app.edit_buffer = match app.current_screen {
            Screen::Bookings => app.bookings.rows()[row].cell(col).to_string(),
            _ => app.accounts.rows()[row].cell(col).to_string(),
        };
        app.input_mode = InputMode::EditingCell;
    }
}

fn begin_date_edit(app: &mut App) {
    app.date_buffer = match app.current_screen {
        Screen::Statement => app.statement_to.clone(),
        _ => app.balance_date.clone(),
    };
    app.input_mode = InputMode::EditingDate;
}

fn current_column_kind(app: &App) -> ColumnKind {
    let (_, col) = app.cursor();
    let columns = match app.current_screen {
        Screen::Bookings => app.bookings.columns(),
        _ => app.accounts.columns(),
    };
    columns.get(col).map(|c| c.kind).unwrap_or(ColumnKind::Text)
}

fn handle_key_edit_cell(app: &mut App, key: KeyEvent) {
    use KeyCode::*;

    match key.code {
        Esc => {
            app.edit_buffer.clear();
            app.input_mode = InputMode::Normal;
        }
        Enter => {
            let (row, col) = app.cursor();
            let value = std::mem::take(&mut app.edit_buffer);
            match app.current_screen {
                Screen::Bookings => app.bookings.edit(row, col, value),
                _ => app.accounts.edit(row, col, value),
            }
            app.input_mode = InputMode::Normal;
        }
        Backspace => {
            app.edit_buffer.pop();
        }
        Char(c) => {
            let accepted = match current_column_kind(app) {
                ColumnKind::Integer => c.is_ascii_digit() || c == '-',
                ColumnKind::Amount => c.is_ascii_digit() || c == '.' || c == '-',
                ColumnKind::Date => c.is_ascii_digit() || c == '-',
                _ => true,
            };
            if accepted {
                app.edit_buffer.push(c);
            }
        }
        _ => {}
    }
}

fn handle_key_pick_account(app: &mut App, key: KeyEvent) {
    use KeyCode::*;

    match key.code {
        Esc => app.input_mode = InputMode::Normal,
        Up | Char('k') => app.picker_idx = app.picker_idx.saturating_sub(1),
        Down | Char('j') => {
            if app.picker_idx + 1 < app.picker_options.len() {
                app.picker_idx += 1;
            }
        }
        Enter => {
            if let Some((number, _)) = app.picker_options.get(app.picker_idx) {
                let value = number.clone();
                let (row, col) = app.cursor();
                app.bookings.edit(row, col, value);
            }
            app.input_mode = InputMode::Normal;
        }
        _ => {}
    }
}

fn handle_key_edit_date(app: &mut App, key: KeyEvent) {
    use KeyCode::*;

    match key.code {
        Esc => {
            app.date_buffer.clear();
            app.input_mode = InputMode::Normal;
        }
        Enter => {
            let value = std::mem::take(&mut app.date_buffer);
            match app.current_screen {
                Screen::Statement => app.statement_to = value,
                _ => app.balance_date = value,
            }
            app.input_mode = InputMode::Normal;
        }
        Backspace => {
            app.date_buffer.pop();
        }
        Char(c) if c.is_ascii_digit() || c == '-' => app.date_buffer.push(c),
        _ => {}
    }
}

fn reload_current(rt: &Runtime, app: &mut App) {
    let result = match app.current_screen {
        Screen::Accounts => rt.block_on(app.accounts.load(&app.session)),
        Screen::Bookings => rt.block_on(app.bookings.load(&app.session)),
        _ => return,
    };
    match result {
        Ok(()) => app.notify(ToastKind::Success, "Data refreshed."),
        Err(e) => app.notify(ToastKind::Error, e.to_string()),
    }
}

fn save_current(rt: &Runtime, app: &mut App) {
    use crate::grid::editor::SaveOutcome;

    let outcome = match app.current_screen {
        Screen::Accounts => rt.block_on(app.accounts.save(&app.session)),
        Screen::Bookings => rt.block_on(app.bookings.save(&app.session)),
        _ => return,
    };
    match outcome {
        Ok(SaveOutcome::Saved) => {
            if app.current_screen == Screen::Accounts {
                // The chart changed: bookings may now point at accounts
                // that no longer exist.
                app.reconcile_booking_accounts();
            }
            app.notify(ToastKind::Success, "Saved.");
        }
        Ok(SaveOutcome::NothingToSave) => app.notify(ToastKind::Info, "No changes to save."),
        Err(e) => app.notify(ToastKind::Error, e.to_string()),
    }
}

// ------------------------------------------------------------- drawing

fn ui(f: &mut Frame<'_>, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Min(0),    // main
            Constraint::Length(1), // footer
        ])
        .split(f.area());

    // Header
    let screen_name = match app.current_screen {
        Screen::Accounts => "Accounts",
        Screen::Bookings => "Bookings",
        Screen::Statement => "Income Statement",
        Screen::BalanceSheet => "Balance Sheet",
        Screen::Help => "Help",
    };
    let header_text = format!("fibu - {screen_name}   |   {}", app.session.base_url());
    let header = Paragraph::new(header_text).block(Block::default().borders(Borders::ALL));
    f.render_widget(header, chunks[0]);

    // Main content
    match app.current_screen {
        Screen::Accounts => {
            let editing =
                (app.input_mode == InputMode::EditingCell).then_some(app.edit_buffer.as_str());
            draw_grid(
                f,
                chunks[1],
                &app.accounts,
                app.accounts_cursor,
                editing,
                "Accounts",
            );
        }
        Screen::Bookings => {
            if app.input_mode == InputMode::PickingAccount {
                draw_account_picker(f, chunks[1], app);
            } else {
                let editing =
                    (app.input_mode == InputMode::EditingCell).then_some(app.edit_buffer.as_str());
                draw_grid(
                    f,
                    chunks[1],
                    &app.bookings,
                    app.bookings_cursor,
                    editing,
                    "Bookings",
                );
            }
        }
        Screen::Statement => draw_statement(f, chunks[1], app),
        Screen::BalanceSheet => draw_balance(f, chunks[1], app),
        Screen::Help => draw_help(f, chunks[1]),
    }

    // Footer
    let fallback = match app.input_mode {
        InputMode::Normal => {
            "Tab: switch view  |  arrows: move  |  e: edit  |  a: add  |  d: delete  |  s: save  |  r: reload  |  t: today  |  L: logout  |  q: quit"
        }
        InputMode::EditingCell => "Editing cell: type, Enter to apply, Esc to cancel",
        InputMode::PickingAccount => "Select account: Up/Down, Enter to apply, Esc to cancel",
        InputMode::EditingDate => "Editing date: digits and '-', Enter to apply, Esc to cancel",
    };
    draw_footer(f, chunks[2], &app.toast, fallback);
}

fn draw_footer(f: &mut Frame<'_>, area: Rect, toast: &Option<Toast>, fallback: &str) {
    let footer = match toast {
        Some(toast) => {
            let style = match toast.kind {
                ToastKind::Info => Style::default().fg(Color::Cyan),
                ToastKind::Success => Style::default().fg(Color::Green),
                ToastKind::Error => Style::default().fg(Color::Red),
            };
            Paragraph::new(toast.message.clone()).style(style)
        }
        None => Paragraph::new(fallback.to_string()),
    };
    f.render_widget(footer, area);
}

fn row_marker(deleted: bool, is_new: bool, changed: bool) -> &'static str {
    if deleted {
        "x"
    } else if is_new {
        "+"
    } else if changed {
        "*"
    } else {
        ""
    }
}

fn column_width(kind: ColumnKind) -> u16 {
    match kind {
        ColumnKind::Integer => 8,
        ColumnKind::Date => 12,
        ColumnKind::Text => 24,
        ColumnKind::AccountRef => 10,
        ColumnKind::Amount => 12,
    }
}

fn draw_grid<R: Resource>(
    f: &mut Frame<'_>,
    area: Rect,
    grid: &GridEditor<R>,
    cursor: (usize, usize),
    editing: Option<&str>,
    title: &str,
) {
    let columns = grid.columns();

    let rows = grid.rows().iter().enumerate().map(|(i, row)| {
        let changed = grid.is_changed(i);
        let mut cells: Vec<Cell> = row
            .cells
            .iter()
            .enumerate()
            .map(|(j, cell)| {
                let selected = (i, j) == cursor;
                let text = match editing {
                    Some(buffer) if selected => format!("{buffer}_"),
                    _ => cell.clone(),
                };

                let mut style = Style::default();
                if row.deleted {
                    style = style.fg(Color::Red).add_modifier(Modifier::CROSSED_OUT);
                } else if row.is_new {
                    style = style.fg(Color::Green);
                } else if changed {
                    style = style.fg(Color::Yellow);
                }
                if selected {
                    style = style.add_modifier(Modifier::REVERSED);
                }
                Cell::from(text).style(style)
            })
            .collect();
        cells.push(Cell::from(row_marker(row.deleted, row.is_new, changed)));
        Row::new(cells)
    });

    let mut widths: Vec<Constraint> = columns
        .iter()
        .map(|c| Constraint::Length(column_width(c.kind)))
        .collect();
    widths.push(Constraint::Length(3));

    let mut header: Vec<Cell> = columns.iter().map(|c| Cell::from(c.name)).collect();
    header.push(Cell::from(""));

    let table = Table::new(rows, widths)
        .header(Row::new(header).style(Style::default().add_modifier(Modifier::BOLD)))
        .block(Block::default().title(title.to_string()).borders(Borders::ALL));

    f.render_widget(table, area);
}

fn draw_account_picker(f: &mut Frame<'_>, area: Rect, app: &App) {
    let items: Vec<ListItem> = app
        .picker_options
        .iter()
        .enumerate()
        .map(|(idx, (_, label))| {
            let mut item = ListItem::new(label.clone());
            if idx == app.picker_idx {
                item = item.style(Style::default().add_modifier(Modifier::REVERSED));
            }
            item
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title("Select account")
            .borders(Borders::ALL),
    );
    f.render_widget(list, area);
}

fn cutoff_label(cutoff: &str, editing: Option<&str>) -> String {
    match editing {
        Some(buffer) => format!("{buffer}_"),
        None if cutoff.is_empty() => "(no date)".to_string(),
        None => cutoff.to_string(),
    }
}

fn draw_statement(f: &mut Frame<'_>, area: Rect, app: &App) {
    let entries = app.entries();
    let saldo = aggregate::statement_balances(&entries, &app.statement_to);
    let chart = app.chart_accounts();
    let rpt = report::statement_report(&chart, &saldo);
    let profit = rpt.left_total - rpt.right_total;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(area);

    let editing = (app.input_mode == InputMode::EditingDate).then_some(app.date_buffer.as_str());
    let title = format!(
        "Income statement to {}",
        cutoff_label(&app.statement_to, editing)
    );
    draw_report_table(
        f,
        chunks[0],
        &rpt,
        ["Expense account", "Balance", "Revenue account", "Balance"],
        &title,
    );

    let summary = format!(
        "Expenses: {:.2}   Revenues: {:.2}   Profit: {:.2}",
        rpt.left_total, rpt.right_total, profit
    );
    let summary = Paragraph::new(summary).block(Block::default().borders(Borders::ALL));
    f.render_widget(summary, chunks[1]);
}

fn draw_balance(f: &mut Frame<'_>, area: Rect, app: &App) {
    let entries = app.entries();
    let saldo = aggregate::balance_sheet_balances(&entries, &app.balance_date);
    let profit = aggregate::profit(&entries, &app.balance_date);
    let chart = app.chart_accounts();
    let rpt = report::balance_report(&chart, &saldo, profit);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(area);

    let editing = (app.input_mode == InputMode::EditingDate).then_some(app.date_buffer.as_str());
    let title = format!(
        "Balance sheet as of {}",
        cutoff_label(&app.balance_date, editing)
    );
    draw_report_table(
        f,
        chunks[0],
        &rpt,
        ["Asset account", "Balance", "Liability account", "Balance"],
        &title,
    );

    let summary = format!(
        "Assets: {:.2}   Liabilities: {:.2}",
        rpt.left_total, rpt.right_total
    );
    let mut summary = Paragraph::new(summary).block(Block::default().borders(Borders::ALL));
    if !rpt.balanced() {
        summary = summary.style(Style::default().fg(Color::Red));
    }
    f.render_widget(summary, chunks[1]);
}

fn draw_report_table(
    f: &mut Frame<'_>,
    area: Rect,
    rpt: &report::Report,
    headers: [&'static str; 4],
    title: &str,
) {
    fn fmt_side(side: &Option<(String, Decimal)>) -> (String, String) {
        match side {
            Some((label, amount)) => (label.clone(), format!("{amount:.2}")),
            None => (String::new(), String::new()),
        }
    }

    let rows = rpt.lines.iter().map(|line| {
        let (left_label, left_amount) = fmt_side(&line.left);
        let (right_label, right_amount) = fmt_side(&line.right);
        Row::new(vec![left_label, left_amount, right_label, right_amount])
    });

    let widths = [
        Constraint::Length(28),
        Constraint::Length(12),
        Constraint::Length(28),
        Constraint::Length(12),
    ];

    let table = Table::new(rows, widths)
        .header(Row::new(headers.to_vec()).style(Style::default().add_modifier(Modifier::BOLD)))
        .block(Block::default().title(title.to_string()).borders(Borders::ALL));

    f.render_widget(table, area);
}

fn draw_help(f: &mut Frame<'_>, area: Rect) {
    let text = "\
Tab / Shift+Tab   switch between views
Arrow keys        move the cell cursor
e or Enter        edit the selected cell (account picker on debit/credit)
a                 append a blank row
d                 mark / unmark the selected row for deletion
s                 save the current grid (dirty rows only), then reload
r                 reload the current grid, discarding local edits
e (reports)       set the cutoff date
t (reports)       set the cutoff date to today
L                 log out and return to the login screen
q                 quit

Rows are marked '+' when new, '*' when edited and 'x' when pending
deletion. The statement and balance sheet recompute from the bookings
grid as you type, including unsaved rows.";
    let p = Paragraph::new(text).block(Block::default().title("Help").borders(Borders::ALL));
    f.render_widget(p, area);
}
