// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use probeview_app::{Column, FilterColumn, SortDirection, TableView, ViewCommand, ViewEvent};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState};
use std::io;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_PANEL_HEIGHT: u16 = 12;

const PAGE_ROWS: isize = 10;
const SORT_PANEL_WIDTH: u16 = 24;
const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);
const CHECKED_MARK: &str = "[x]";
const UNCHECKED_MARK: &str = "[ ]";
const CURSOR_MARK: &str = ">";
const SORT_ASC_MARK: &str = "▲";
const SORT_DESC_MARK: &str = "▼";
const FILTER_PANEL_HINT: &str = "a all | n none";

/// Side effects the table view needs from its host.
pub trait ViewRuntime {
    /// Writes the current view somewhere durable and returns where.
    fn export_view(&mut self, view: &TableView) -> Result<PathBuf>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiOptions {
    /// Height in rows of the filter/sort band above the table.
    pub panel_height: u16,
}

impl Default for UiOptions {
    fn default() -> Self {
        Self {
            panel_height: DEFAULT_PANEL_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Filter(FilterColumn),
    Sort,
    Table,
}

impl Focus {
    const ORDER: [Self; 5] = [
        Self::Filter(FilterColumn::Host),
        Self::Filter(FilterColumn::StatusCode),
        Self::Filter(FilterColumn::Technologies),
        Self::Sort,
        Self::Table,
    ];

    fn rotate(self, delta: isize) -> Self {
        let current = Self::ORDER
            .iter()
            .position(|focus| *focus == self)
            .unwrap_or(0) as isize;
        let len = Self::ORDER.len() as isize;
        Self::ORDER[(current + delta).rem_euclid(len) as usize]
    }

    fn label(self) -> &'static str {
        match self {
            Self::Filter(column) => column.label(),
            Self::Sort => "Sort",
            Self::Table => "Table",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct UiState {
    focus: Focus,
    filter_cursor: [usize; 3],
    sort_cursor: usize,
    table_row: usize,
    help_visible: bool,
    status: Option<String>,
    status_token: u64,
    panel_height: u16,
}

impl UiState {
    fn new(options: UiOptions) -> Self {
        Self {
            focus: Focus::Filter(FilterColumn::Host),
            filter_cursor: [0; 3],
            sort_cursor: 0,
            table_row: 0,
            help_visible: false,
            status: None,
            status_token: 0,
            panel_height: options.panel_height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UiCommand {
    FocusNext,
    FocusPrev,
    Move(isize),
    JumpFirst,
    JumpLast,
    Toggle,
    SelectAll,
    SelectNone,
    Activate,
    SortBy(Column),
    Export,
    ToggleHelp,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum UiOutcome {
    Continue,
    Status(String),
    Quit,
}

pub fn run_app<R: ViewRuntime>(
    view: &mut TableView,
    runtime: &mut R,
    options: UiOptions,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut ui = UiState::new(options);
    let (internal_tx, internal_rx) = mpsc::channel();
    info!(
        rows = view.row_count(),
        panel_height = options.panel_height,
        "starting table view"
    );

    let mut result = Ok(());
    loop {
        process_internal_events(&mut ui, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, view, &ui)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if has_event {
            match event::read().context("read event") {
                Ok(Event::Key(key)) => {
                    if handle_key_event(view, runtime, &mut ui, &internal_tx, key) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    result = Err(error);
                    break;
                }
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events(ui: &mut UiState, rx: &Receiver<InternalEvent>) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == ui.status_token => {
                ui.status = None;
            }
            InternalEvent::ClearStatus { .. } => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_AFTER);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    ui: &mut UiState,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    ui.status = Some(message.into());
    ui.status_token = ui.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, ui.status_token);
}

fn handle_key_event<R: ViewRuntime>(
    view: &mut TableView,
    runtime: &mut R,
    ui: &mut UiState,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if ui.help_visible {
        if matches!(
            key.code,
            KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')
        ) {
            ui.help_visible = false;
        }
        return false;
    }

    let Some(command) = ui_command_for_key(key) else {
        return false;
    };
    match apply_ui_command(view, runtime, ui, command) {
        UiOutcome::Quit => true,
        UiOutcome::Status(message) => {
            emit_status(ui, internal_tx, message);
            false
        }
        UiOutcome::Continue => false,
    }
}

fn ui_command_for_key(key: KeyEvent) -> Option<UiCommand> {
    match (key.code, key.modifiers) {
        (KeyCode::Char('c'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            Some(UiCommand::Quit)
        }
        (KeyCode::Char('q'), _) => Some(UiCommand::Quit),
        (KeyCode::Tab, _) | (KeyCode::Char('l'), _) | (KeyCode::Right, _) => {
            Some(UiCommand::FocusNext)
        }
        (KeyCode::BackTab, _) | (KeyCode::Char('h'), _) | (KeyCode::Left, _) => {
            Some(UiCommand::FocusPrev)
        }
        (KeyCode::Char('j'), _) | (KeyCode::Down, _) => Some(UiCommand::Move(1)),
        (KeyCode::Char('k'), _) | (KeyCode::Up, _) => Some(UiCommand::Move(-1)),
        (KeyCode::PageDown, _) => Some(UiCommand::Move(PAGE_ROWS)),
        (KeyCode::PageUp, _) => Some(UiCommand::Move(-PAGE_ROWS)),
        (KeyCode::Char('g'), _) | (KeyCode::Home, _) => Some(UiCommand::JumpFirst),
        (KeyCode::Char('G'), _) | (KeyCode::End, _) => Some(UiCommand::JumpLast),
        (KeyCode::Char(' '), _) => Some(UiCommand::Toggle),
        (KeyCode::Char('a'), KeyModifiers::NONE) => Some(UiCommand::SelectAll),
        (KeyCode::Char('n'), KeyModifiers::NONE) => Some(UiCommand::SelectNone),
        (KeyCode::Enter, _) => Some(UiCommand::Activate),
        (KeyCode::Char(digit @ '1'..='4'), _) => {
            let index = digit as usize - '1' as usize;
            Column::ALL.get(index).copied().map(UiCommand::SortBy)
        }
        (KeyCode::Char('w'), KeyModifiers::NONE) => Some(UiCommand::Export),
        (KeyCode::Char('?'), _) => Some(UiCommand::ToggleHelp),
        _ => None,
    }
}

fn apply_ui_command<R: ViewRuntime>(
    view: &mut TableView,
    runtime: &mut R,
    ui: &mut UiState,
    command: UiCommand,
) -> UiOutcome {
    match command {
        UiCommand::FocusNext => {
            ui.focus = ui.focus.rotate(1);
            UiOutcome::Continue
        }
        UiCommand::FocusPrev => {
            ui.focus = ui.focus.rotate(-1);
            UiOutcome::Continue
        }
        UiCommand::Move(delta) => {
            move_cursor(view, ui, delta);
            UiOutcome::Continue
        }
        UiCommand::JumpFirst => {
            *cursor_mut(ui) = 0;
            UiOutcome::Continue
        }
        UiCommand::JumpLast => {
            let len = cursor_len(view, ui.focus);
            *cursor_mut(ui) = len.saturating_sub(1);
            UiOutcome::Continue
        }
        UiCommand::Toggle => match ui.focus {
            Focus::Filter(column) => toggle_focused_value(view, ui, column),
            Focus::Sort | Focus::Table => {
                UiOutcome::Status("focus a filter list to toggle values".to_owned())
            }
        },
        UiCommand::SelectAll | UiCommand::SelectNone => {
            let Focus::Filter(column) = ui.focus else {
                return UiOutcome::Status("focus a filter list first".to_owned());
            };
            let command = if command == UiCommand::SelectAll {
                ViewCommand::SelectAll(column)
            } else {
                ViewCommand::SelectNone(column)
            };
            let events = view.dispatch(command);
            clamp_table_row(view, ui);
            UiOutcome::Status(events_message(&events))
        }
        UiCommand::Activate => match ui.focus {
            Focus::Filter(column) => toggle_focused_value(view, ui, column),
            Focus::Sort => match Column::ALL.get(ui.sort_cursor) {
                Some(column) => sort_view(view, ui, *column),
                None => UiOutcome::Continue,
            },
            Focus::Table => UiOutcome::Continue,
        },
        UiCommand::SortBy(column) => sort_view(view, ui, column),
        UiCommand::Export => match runtime.export_view(view) {
            Ok(path) => {
                info!(path = %path.display(), "exported view");
                UiOutcome::Status(format!("exported {}", path.display()))
            }
            Err(error) => {
                warn!(error = %format!("{error:#}"), "export failed");
                UiOutcome::Status(format!("export failed: {error:#}"))
            }
        },
        UiCommand::ToggleHelp => {
            ui.help_visible = !ui.help_visible;
            UiOutcome::Continue
        }
        UiCommand::Quit => UiOutcome::Quit,
    }
}

fn toggle_focused_value(
    view: &mut TableView,
    ui: &mut UiState,
    column: FilterColumn,
) -> UiOutcome {
    let entries = view.domain(column).entries();
    let Some(entry) = entries.get(ui.filter_cursor[column.index()]) else {
        return UiOutcome::Status(format!("no {} values", column.label()));
    };
    let events = view.dispatch(ViewCommand::Toggle {
        column,
        value: entry.value.clone(),
    });
    clamp_table_row(view, ui);
    UiOutcome::Status(events_message(&events))
}

fn sort_view(view: &mut TableView, ui: &mut UiState, column: Column) -> UiOutcome {
    let events = view.dispatch(ViewCommand::SortBy(column));
    if let Some(index) = Column::ALL.iter().position(|candidate| *candidate == column) {
        ui.sort_cursor = index;
    }
    clamp_table_row(view, ui);
    UiOutcome::Status(events_message(&events))
}

fn events_message(events: &[ViewEvent]) -> String {
    events
        .iter()
        .map(ViewEvent::message)
        .collect::<Vec<_>>()
        .join(" | ")
}

fn cursor_len(view: &TableView, focus: Focus) -> usize {
    match focus {
        Focus::Filter(column) => view.domain(column).len(),
        Focus::Sort => Column::ALL.len(),
        Focus::Table => view.visible_count(),
    }
}

fn cursor_mut(ui: &mut UiState) -> &mut usize {
    match ui.focus {
        Focus::Filter(column) => &mut ui.filter_cursor[column.index()],
        Focus::Sort => &mut ui.sort_cursor,
        Focus::Table => &mut ui.table_row,
    }
}

fn move_cursor(view: &TableView, ui: &mut UiState, delta: isize) {
    let len = cursor_len(view, ui.focus);
    let cursor = cursor_mut(ui);
    if len == 0 {
        *cursor = 0;
        return;
    }
    let next = (*cursor as isize + delta).clamp(0, len as isize - 1);
    *cursor = next as usize;
}

fn clamp_table_row(view: &TableView, ui: &mut UiState) {
    ui.table_row = ui.table_row.min(view.visible_count().saturating_sub(1));
}

/// First line to draw so that `cursor` stays inside a window of `height`.
fn scroll_offset(cursor: usize, height: usize) -> u16 {
    if height == 0 || cursor < height {
        return 0;
    }
    u16::try_from(cursor + 1 - height).unwrap_or(u16::MAX)
}

fn filter_panel_title(view: &TableView, column: FilterColumn) -> String {
    format!(
        "{} {}/{}",
        column.label(),
        view.selection(column).len(),
        view.domain(column).len()
    )
}

fn filter_panel_lines(view: &TableView, ui: &UiState, column: FilterColumn) -> Vec<String> {
    let focused = ui.focus == Focus::Filter(column);
    let cursor = ui.filter_cursor[column.index()];
    let mut lines = vec![FILTER_PANEL_HINT.to_owned()];
    for (index, entry) in view.domain(column).entries().into_iter().enumerate() {
        let pointer = if focused && index == cursor {
            CURSOR_MARK
        } else {
            " "
        };
        let mark = if view.is_selected(column, &entry.value) {
            CHECKED_MARK
        } else {
            UNCHECKED_MARK
        };
        lines.push(format!("{pointer}{mark} {}", entry.label));
    }
    lines
}

fn sort_marker(view: &TableView, column: Column) -> &'static str {
    match view.sort_state() {
        Some(state) if state.column == column => match state.direction {
            SortDirection::Asc => SORT_ASC_MARK,
            SortDirection::Desc => SORT_DESC_MARK,
        },
        _ => "",
    }
}

fn sort_panel_lines(view: &TableView, ui: &UiState) -> Vec<String> {
    let focused = ui.focus == Focus::Sort;
    Column::ALL
        .iter()
        .enumerate()
        .map(|(index, column)| {
            let pointer = if focused && index == ui.sort_cursor {
                CURSOR_MARK
            } else {
                " "
            };
            let marker = sort_marker(view, *column);
            let suffix = if marker.is_empty() {
                String::new()
            } else {
                format!(" {marker}")
            };
            format!("{pointer}{} {}{suffix}", index + 1, column.label())
        })
        .collect()
}

fn table_title(view: &TableView) -> String {
    let mut title = format!("rows {}/{}", view.visible_count(), view.row_count());
    if let Some(state) = view.sort_state() {
        title.push_str(&format!(
            " | sort {} {}",
            state.column.label(),
            state.direction.as_str()
        ));
    }
    title
}

fn status_text(ui: &UiState) -> String {
    let hints = "tab focus | j/k move | space toggle | a/n all/none | enter/1-4 sort | w export | ? help | q quit";
    let focus = ui.focus.label().to_uppercase();
    match &ui.status {
        Some(status) => format!("{focus} | {status} | {hints}"),
        None => format!("{focus} | {hints}"),
    }
}

fn help_overlay_text() -> &'static str {
    "focus: tab/l next | shift+tab/h prev (Host, Status Code, Technologies, Sort, Table)\n\
filters: j/k move | g/G first/last | space or enter toggle | a select all | n select none\n\
sort: enter sort focused column | 1-4 sort by column | repeat to reverse\n\
table: j/k pgup/pgdn g/G move\n\
global: w export view | ? help | q or ctrl+c quit"
}

fn panel_block(title: String, focused: bool) -> Block<'static> {
    let style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(style)
}

fn render(frame: &mut ratatui::Frame<'_>, view: &TableView, ui: &UiState) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(ui.panel_height),
            Constraint::Min(3),
            Constraint::Length(3),
        ])
        .split(frame.area());

    render_panels(frame, layout[0], view, ui);
    render_table(frame, layout[1], view, ui);

    let status_widget = Paragraph::new(status_text(ui))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status_widget, layout[2]);

    if ui.help_visible {
        let area = centered_rect(80, 40, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_panels(frame: &mut ratatui::Frame<'_>, area: Rect, view: &TableView, ui: &UiState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Fill(1),
            Constraint::Fill(1),
            Constraint::Length(SORT_PANEL_WIDTH),
        ])
        .split(area);

    for (slot, column) in FilterColumn::ALL.into_iter().enumerate() {
        let block_area = columns[slot];
        let inner_height = usize::from(block_area.height.saturating_sub(2));
        // Line 0 is the hint, so entry N sits on line N + 1.
        let cursor_line = ui.filter_cursor[column.index()] + 1;
        let panel = Paragraph::new(filter_panel_lines(view, ui, column).join("\n"))
            .scroll((scroll_offset(cursor_line, inner_height), 0))
            .block(panel_block(
                filter_panel_title(view, column),
                ui.focus == Focus::Filter(column),
            ));
        frame.render_widget(panel, block_area);
    }

    let sort_panel = Paragraph::new(sort_panel_lines(view, ui).join("\n"))
        .block(panel_block("Sort by".to_owned(), ui.focus == Focus::Sort));
    frame.render_widget(sort_panel, columns[3]);
}

fn render_table(frame: &mut ratatui::Frame<'_>, area: Rect, view: &TableView, ui: &UiState) {
    let header = Row::new(Column::ALL.iter().map(|column| {
        let marker = sort_marker(view, *column);
        let label = if marker.is_empty() {
            column.label().to_owned()
        } else {
            format!("{} {marker}", column.label())
        };
        Cell::from(label).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));

    let rows = view.visible_rows().map(|(_, row)| {
        Row::new(
            Column::ALL
                .iter()
                .map(|column| Cell::from(row.display_cell(*column)))
                .collect::<Vec<_>>(),
        )
    });

    let widths = [
        Constraint::Fill(3),
        Constraint::Fill(3),
        Constraint::Length(12),
        Constraint::Fill(2),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .row_highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .block(panel_block(table_title(view), ui.focus == Focus::Table));

    let mut state = TableState::default();
    if ui.focus == Focus::Table && view.visible_count() > 0 {
        state.select(Some(ui.table_row));
    }
    frame.render_stateful_widget(table, area, &mut state);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
