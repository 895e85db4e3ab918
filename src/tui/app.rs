//! Main application logic for the terminal user interface.
//!
//! `App` draws the controller's `ListView` and turns key presses into
//! controller operations. It never touches tasks directly: every change goes
//! through `TaskList`, which persists and re-renders the view, and the next
//! frame simply draws the new view.

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Tabs, Wrap},
    Frame, Terminal,
};
use tracing::warn;

use crate::clock::Clock;
use crate::controller::TaskList;
use crate::due::parse_due_input;
use crate::fields::{Filter, Theme};
use crate::storage::Storage;
use crate::tui::{
    enums::AppState,
    input::InputField,
    task_form::{TaskForm, CATEGORY_FIELD, DUE_FIELD, TEXT_FIELD},
    theme::Palette,
    utils::centered_rect,
};
use crate::view::terminal_safe;

/// Input poll interval.
const TICK: Duration = Duration::from_millis(50);

/// Main application state for the terminal user interface.
pub struct App<'a, S: Storage, C: Clock> {
    list: &'a mut TaskList<S, C>,
    state: AppState,
    table_state: TableState,
    form: TaskForm,
    edit_input: InputField,
    status_message: String,
    theme: Theme,
}

impl<'a, S: Storage, C: Clock> App<'a, S, C> {
    pub fn new(list: &'a mut TaskList<S, C>, theme: Theme) -> Self {
        let form = TaskForm::new(list.categories().to_vec());
        let mut app = App {
            list,
            state: AppState::TaskList,
            table_state: TableState::default(),
            form,
            edit_input: InputField::new(),
            status_message: String::new(),
            theme,
        };
        app.sync_selection(None);
        app
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Id of the highlighted row, if any.
    fn selected_id(&self) -> Option<u64> {
        self.table_state
            .selected()
            .and_then(|idx| self.list.view().rows.get(idx))
            .map(|row| row.id)
    }

    /// Point the table selection at `prefer` if it is visible, else keep the
    /// current index within bounds.
    fn sync_selection(&mut self, prefer: Option<u64>) {
        let rows = &self.list.view().rows;
        if rows.is_empty() {
            self.table_state.select(None);
            return;
        }
        if let Some(idx) = prefer.and_then(|id| rows.iter().position(|r| r.id == id)) {
            self.table_state.select(Some(idx));
            return;
        }
        let idx = self.table_state.selected().unwrap_or(0).min(rows.len() - 1);
        self.table_state.select(Some(idx));
    }

    fn move_selection(&mut self, down: bool) {
        let len = self.list.view().rows.len();
        if len == 0 {
            return;
        }
        let current = self.table_state.selected().unwrap_or(0);
        let next = if down {
            (current + 1).min(len - 1)
        } else {
            current.saturating_sub(1)
        };
        self.table_state.select(Some(next));
    }

    /// Set a status message to display in the status bar.
    fn set_status_message(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }

    /// Clear the current status message.
    fn clear_status_message(&mut self) {
        self.status_message.clear();
    }

    /// Surface a failed operation in the status bar instead of leaving the UI.
    fn report<T>(&mut self, result: anyhow::Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(error = %format!("{err:#}"), "operation failed");
                self.set_status_message(format!("Error: {err:#}"));
                None
            }
        }
    }

    fn set_filter(&mut self, filter: Filter) {
        let selected = self.selected_id();
        self.list.set_filter(filter);
        self.sync_selection(selected);
    }

    /// Apply deletes whose animation has finished.
    pub fn tick(&mut self) {
        if !self.list.has_pending_deletes() {
            return;
        }
        let selected = self.selected_id();
        let result = self.list.run_due();
        if let Some(fired) = self.report(result) {
            if fired > 0 {
                self.sync_selection(selected);
            }
        }
    }

    /// Dispatch a key press to the handler for the current screen.
    ///
    /// Returns true if the application should quit.
    pub fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) -> bool {
        match self.state {
            AppState::TaskList => self.handle_task_list_input(key, modifiers),
            AppState::AddTask => {
                self.handle_form_input(key);
                false
            }
            AppState::EditTask => {
                self.handle_edit_input(key);
                false
            }
            AppState::Help => {
                self.handle_help_input(key);
                false
            }
        }
    }

    /// Handle keyboard input when in the task list view.
    ///
    /// Returns true if the application should quit.
    fn handle_task_list_input(&mut self, key: KeyCode, modifiers: KeyModifiers) -> bool {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return true,
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(true),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(false),
            KeyCode::Char('a') => {
                self.form.reset_after_submit();
                self.state = AppState::AddTask;
            }
            KeyCode::Char('e') | KeyCode::Enter => self.start_edit(),
            KeyCode::Char(' ') | KeyCode::Char('x') => {
                if let Some(id) = self.selected_id() {
                    let result = self.list.toggle(id);
                    self.report(result);
                    self.sync_selection(Some(id));
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(id) = self.selected_id() {
                    self.list.request_delete(id);
                    self.set_status_message("Deleting…");
                }
            }
            KeyCode::Char('1') => self.set_filter(Filter::All),
            KeyCode::Char('2') => self.set_filter(Filter::Pending),
            KeyCode::Char('3') => self.set_filter(Filter::Completed),
            KeyCode::Tab => {
                let next = self.list.filter().next();
                self.set_filter(next);
            }
            KeyCode::Char('t') => self.theme = self.theme.toggle(),
            KeyCode::Char('h') | KeyCode::Char('?') => self.state = AppState::Help,
            _ => {}
        }
        false
    }

    fn start_edit(&mut self) {
        let Some(id) = self.selected_id() else {
            return;
        };
        let result = self.list.begin_edit(id).map(str::to_string);
        if let Some(text) = self.report(result) {
            self.edit_input = InputField::with_value(&text);
            self.edit_input.active = true;
            self.state = AppState::EditTask;
        }
    }

    /// Handle keyboard input in the add-task form.
    fn handle_form_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => self.state = AppState::TaskList,
            KeyCode::Enter => self.submit_form(),
            KeyCode::Tab | KeyCode::Down => self.form.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.form.prev_field(),
            KeyCode::Left if self.form.current_field == CATEGORY_FIELD => self.form.cycle_category(false),
            KeyCode::Right if self.form.current_field == CATEGORY_FIELD => self.form.cycle_category(true),
            KeyCode::Char(' ') if self.form.current_field == CATEGORY_FIELD => self.form.cycle_category(true),
            _ => {
                if let Some(input) = self.form.active_input_mut() {
                    edit_field(input, key);
                }
            }
        }
    }

    /// Create a task from the form. Blank text is ignored and keeps the form open.
    fn submit_form(&mut self) {
        let today = self.list.clock().local_now().date();
        let due = match parse_due_input(&self.form.due.value, today) {
            Ok(due) => due,
            Err(err) => {
                self.set_status_message(err.to_string());
                return;
            }
        };
        let category = self.form.selected_category().to_string();
        let result = self.list.add(&self.form.text.value, due, &category);
        if let Some(Some(id)) = self.report(result) {
            self.form.reset_after_submit();
            self.state = AppState::TaskList;
            self.sync_selection(Some(id));
            self.set_status_message(format!("Added task {id}"));
        }
    }

    /// Handle keyboard input while editing a task's text.
    fn handle_edit_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.list.cancel_edit();
                self.state = AppState::TaskList;
            }
            KeyCode::Enter => {
                let selected = self.selected_id();
                let result = self.list.commit_edit(&self.edit_input.value);
                if let Some(changed) = self.report(result) {
                    if !changed {
                        self.set_status_message("Edit discarded");
                    }
                }
                self.state = AppState::TaskList;
                self.sync_selection(selected);
            }
            _ => edit_field(&mut self.edit_input, key),
        }
    }

    /// Handle keyboard input when viewing the help screen.
    fn handle_help_input(&mut self, key: KeyCode) {
        if matches!(key, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('h') | KeyCode::Char('?')) {
            self.state = AppState::TaskList;
        }
    }

    /// How long to wait for input: one tick, or less when a delete is due sooner.
    fn poll_timeout(&self) -> Duration {
        match self.list.next_deadline() {
            Some(deadline) => deadline.saturating_duration_since(self.list.clock().instant()).min(TICK),
            None => TICK,
        }
    }

    /// Poll for and handle keyboard events.
    ///
    /// Returns true if the application should quit.
    fn handle_input(&mut self) -> anyhow::Result<bool> {
        if event::poll(self.poll_timeout())? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    return Ok(false);
                }
                self.clear_status_message();
                return Ok(self.handle_key(key.code, key.modifiers));
            }
        }
        Ok(false)
    }

    /// Render the title bar with the pending counter and the mode toggle label.
    fn render_header(&self, f: &mut Frame, area: Rect, palette: &Palette) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(22)])
            .split(area);

        let pending = self.list.view().pending_count;
        let title = Paragraph::new(Line::from(vec![
            Span::styled("TASKS", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(
                format!("{pending} pending"),
                Style::default().fg(palette.accent).add_modifier(Modifier::ITALIC),
            ),
        ]))
        .block(Block::default().borders(Borders::ALL));
        f.render_widget(title, chunks[0]);

        let mode = Paragraph::new(format!("[t] {}", self.theme.toggle_label()))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(mode, chunks[1]);
    }

    /// Render the filter controls; exactly one is highlighted.
    fn render_filters(&self, f: &mut Frame, area: Rect, palette: &Palette) {
        let titles: Vec<String> = Filter::ALL
            .iter()
            .enumerate()
            .map(|(i, filter)| format!("[{}] {}", i + 1, filter.label()))
            .collect();
        let selected = Filter::ALL.iter().position(|f| *f == self.list.filter()).unwrap_or(0);
        let tabs = Tabs::new(titles)
            .select(selected)
            .block(Block::default().borders(Borders::ALL).title("Filter"))
            .highlight_style(
                Style::default()
                    .bg(palette.accent)
                    .fg(palette.accent_fg)
                    .add_modifier(Modifier::BOLD),
            );
        f.render_widget(tabs, area);
    }

    /// Render the main task list, or the placeholder when nothing is visible.
    fn render_task_list(&mut self, f: &mut Frame, area: Rect, palette: &Palette) {
        let view = self.list.view();
        let block = Block::default().borders(Borders::ALL).title(format!(
            "Tasks ({}/{}) - Press 'h' for help",
            view.rows.len(),
            self.list.tasks().len()
        ));

        if let Some(placeholder) = view.placeholder {
            let empty = Paragraph::new(placeholder)
                .style(Style::default().fg(palette.muted))
                .alignment(Alignment::Center)
                .block(block);
            f.render_widget(empty, area);
            return;
        }

        let header = Row::new(["", "Task", "Category", "Due"].map(|h| {
            Cell::from(h).style(Style::default().add_modifier(Modifier::BOLD))
        }))
        .style(Style::default().bg(palette.accent).fg(palette.accent_fg))
        .height(1);

        let rows: Vec<Row> = view
            .rows
            .iter()
            .map(|row| {
                let style = if row.removing {
                    Style::default()
                        .fg(palette.removing)
                        .add_modifier(Modifier::CROSSED_OUT | Modifier::DIM)
                } else if row.done {
                    Style::default().fg(palette.muted).add_modifier(Modifier::CROSSED_OUT)
                } else if row.due_soon {
                    Style::default().fg(palette.due_soon).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(palette.fg)
                };
                let due = if row.due_soon {
                    format!("{} !", row.due_label)
                } else {
                    row.due_label.clone()
                };
                Row::new(vec![
                    Cell::from(if row.done { "[x]" } else { "[ ]" }),
                    Cell::from(terminal_safe(&row.text).into_owned()),
                    Cell::from(terminal_safe(&row.category).into_owned()),
                    Cell::from(due),
                ])
                .style(style)
            })
            .collect();

        let widths = [
            Constraint::Length(3),  // Checkbox
            Constraint::Min(20),    // Text
            Constraint::Length(12), // Category
            Constraint::Length(14), // Due
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(block)
            .row_highlight_style(Style::default().bg(palette.highlight_bg).fg(palette.highlight_fg))
            .highlight_symbol(">> ");

        f.render_stateful_widget(table, area, &mut self.table_state);
    }

    /// Render the add-task form as a popup.
    fn render_task_form(&self, f: &mut Frame, area: Rect, palette: &Palette) {
        let area = centered_rect(60, 60, area);
        f.render_widget(Clear, area);
        let outer = Block::default()
            .title("Add Task")
            .borders(Borders::ALL)
            .style(Style::default().bg(palette.bg).fg(palette.fg));
        let inner = outer.inner(area);
        f.render_widget(outer, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(0),
            ])
            .split(inner);

        let field_style = |index: usize| {
            if self.form.current_field == index {
                Style::default().fg(palette.accent).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            }
        };

        let text = Paragraph::new(self.form.text.value.as_str()).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Task")
                .border_style(field_style(TEXT_FIELD)),
        );
        f.render_widget(text, chunks[0]);

        let due = Paragraph::new(self.form.due.value.as_str()).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Due (optional: YYYY-MM-DD, today, in 3d)")
                .border_style(field_style(DUE_FIELD)),
        );
        f.render_widget(due, chunks[1]);

        let category = Paragraph::new(format!("< {} >", self.form.selected_category())).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Category (←/→)")
                .border_style(field_style(CATEGORY_FIELD)),
        );
        f.render_widget(category, chunks[2]);

        let hint = Paragraph::new("Enter: add  Tab: next field  Esc: cancel")
            .style(Style::default().fg(palette.muted))
            .alignment(Alignment::Center);
        f.render_widget(hint, chunks[3]);

        let cursor = match self.form.current_field {
            TEXT_FIELD => Some((chunks[0], &self.form.text)),
            DUE_FIELD => Some((chunks[1], &self.form.due)),
            _ => None,
        };
        if let Some((rect, input)) = cursor {
            f.set_cursor_position((rect.x.saturating_add(1).saturating_add(input.cursor_column()), rect.y + 1));
        }
    }

    /// Render the single-line edit popup.
    fn render_edit(&self, f: &mut Frame, area: Rect, palette: &Palette) {
        let area = centered_rect(60, 20, area);
        f.render_widget(Clear, area);
        let input = Paragraph::new(self.edit_input.value.as_str()).block(
            Block::default()
                .title("Edit Task (Enter: save, Esc: cancel)")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.accent))
                .style(Style::default().bg(palette.bg).fg(palette.fg)),
        );
        f.render_widget(input, area);
        f.set_cursor_position((
            area.x.saturating_add(1).saturating_add(self.edit_input.cursor_column()),
            area.y + 1,
        ));
    }

    /// Render the key reference.
    fn render_help(&self, f: &mut Frame, area: Rect, palette: &Palette) {
        let area = centered_rect(60, 70, area);
        f.render_widget(Clear, area);
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let entries = [
            ("a", "Add a task"),
            ("e / Enter", "Edit the selected task"),
            ("Space / x", "Toggle completed"),
            ("d / Del", "Delete the selected task"),
            ("1 2 3 / Tab", "Filter: all, pending, completed"),
            ("j k / ↑ ↓", "Move selection"),
            ("t", "Switch light/dark mode"),
            ("h / ?", "Toggle this help"),
            ("q / Esc", "Quit"),
        ];
        let mut text = vec![Line::from(Span::styled("Keys", bold)), Line::from("")];
        for (keys, what) in entries {
            text.push(Line::from(vec![Span::styled(format!("{keys:<14}"), bold), Span::raw(what)]));
        }
        let help = Paragraph::new(text)
            .block(
                Block::default()
                    .title("Help")
                    .borders(Borders::ALL)
                    .style(Style::default().bg(palette.bg).fg(palette.fg)),
            )
            .wrap(Wrap { trim: false });
        f.render_widget(help, area);
    }

    /// Render the status bar at the bottom of the screen.
    fn render_status_bar(&self, f: &mut Frame, area: Rect, palette: &Palette) {
        let status_text = if !self.status_message.is_empty() {
            self.status_message.clone()
        } else {
            match self.state {
                AppState::TaskList => format!(
                    "Showing: {} | a add  e edit  space toggle  d delete  h help",
                    self.list.filter().label()
                ),
                AppState::AddTask => "Add New Task".to_string(),
                AppState::EditTask => "Edit Task".to_string(),
                AppState::Help => "Help".to_string(),
            }
        };
        let status = Paragraph::new(status_text)
            .style(Style::default().bg(palette.accent).fg(palette.accent_fg))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    /// Main render function that dispatches to the view renderers.
    pub fn render(&mut self, f: &mut Frame) {
        let palette = Palette::for_theme(self.theme);
        f.render_widget(
            Block::default().style(Style::default().bg(palette.bg).fg(palette.fg)),
            f.area(),
        );

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(f.area());

        self.render_header(f, chunks[0], &palette);
        self.render_filters(f, chunks[1], &palette);
        self.render_task_list(f, chunks[2], &palette);

        match self.state {
            AppState::TaskList => {}
            AppState::AddTask => self.render_task_form(f, chunks[2], &palette),
            AppState::EditTask => self.render_edit(f, chunks[2], &palette),
            AppState::Help => self.render_help(f, chunks[2], &palette),
        }

        self.render_status_bar(f, chunks[3], &palette);
    }

    /// Main event loop for the TUI application.
    ///
    /// Draws, handles one input event, then fires any deletes that are due.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> anyhow::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.handle_input()? {
                break;
            }
            self.tick();
        }
        Ok(())
    }
}

/// Apply a text-editing key to `input`.
fn edit_field(input: &mut InputField, key: KeyCode) {
    match key {
        KeyCode::Char(c) => input.handle_char(c),
        KeyCode::Backspace => input.handle_backspace(),
        KeyCode::Delete => input.handle_delete(),
        KeyCode::Left => input.move_cursor_left(),
        KeyCode::Right => input.move_cursor_right(),
        KeyCode::Home => input.move_cursor_home(),
        KeyCode::End => input.move_cursor_end(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::controller::Settings;
    use crate::storage::MemoryStorage;
    use chrono::NaiveDate;
    use ratatui::backend::TestBackend;
    use std::cell::Cell as StdCell;
    use std::rc::Rc;

    fn list() -> TaskList<MemoryStorage, ManualClock> {
        let now = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(12, 0, 0).unwrap();
        TaskList::load(MemoryStorage::new(), ManualClock::new(now), Settings::default()).unwrap()
    }

    fn press<S: Storage, C: Clock>(app: &mut App<'_, S, C>, key: KeyCode) -> bool {
        app.handle_key(key, KeyModifiers::NONE)
    }

    fn type_text<S: Storage, C: Clock>(app: &mut App<'_, S, C>, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn screen<S: Storage, C: Clock>(app: &mut App<'_, S, C>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn test_add_through_form() {
        let mut list = list();
        let mut app = App::new(&mut list, Theme::Light);

        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.state(), AppState::AddTask);
        type_text(&mut app, "Buy <b>milk</b>");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "tomorrow");
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.state(), AppState::TaskList);
        let task = &app.list.tasks()[0];
        assert_eq!(task.text, "Buy <b>milk</b>");
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2024, 6, 2));
        assert_eq!(task.category, "work");
        assert_eq!(app.selected_id(), Some(task.id));

        let shown = screen(&mut app);
        assert!(shown.contains("Buy <b>milk</b>"));
        assert!(shown.contains("1 pending"));
        assert!(shown.contains("tomorrow !"));
    }

    #[test]
    fn test_blank_submit_keeps_form_open() {
        let mut list = list();
        let mut app = App::new(&mut list, Theme::Light);
        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "   ");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state(), AppState::AddTask);
        assert!(app.list.tasks().is_empty());
        assert!(app.status_message.is_empty());
    }

    #[test]
    fn test_bad_due_date_reports_and_keeps_form() {
        let mut list = list();
        let mut app = App::new(&mut list, Theme::Light);
        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "x");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "soon");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state(), AppState::AddTask);
        assert!(app.status_message.contains("invalid due date"));
        assert!(app.list.tasks().is_empty());
    }

    #[test]
    fn test_toggle_filter_and_placeholder() {
        let mut list = list();
        list.add("only", None, "work").unwrap();
        let mut app = App::new(&mut list, Theme::Light);

        press(&mut app, KeyCode::Char(' '));
        assert!(app.list.tasks()[0].done);

        press(&mut app, KeyCode::Char('2'));
        assert_eq!(app.list.filter(), Filter::Pending);
        assert_eq!(app.selected_id(), None);
        let shown = screen(&mut app);
        assert!(shown.contains("No tasks"));
        assert!(shown.contains("0 pending"));

        press(&mut app, KeyCode::Tab);
        assert_eq!(app.list.filter(), Filter::Completed);
        assert!(app.selected_id().is_some());
    }

    #[test]
    fn test_edit_commit_and_cancel() {
        let mut list = list();
        let id = list.add("draft", None, "work").unwrap().unwrap();
        let mut app = App::new(&mut list, Theme::Light);

        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.state(), AppState::EditTask);
        assert_eq!(app.edit_input.value, "draft");
        for _ in 0..5 {
            press(&mut app, KeyCode::Backspace);
        }
        type_text(&mut app, "final");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.list.get(id).unwrap().text, "final");

        press(&mut app, KeyCode::Char('e'));
        type_text(&mut app, " ignored");
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.state(), AppState::TaskList);
        assert_eq!(app.list.get(id).unwrap().text, "final");
        assert!(app.list.pending_edit().is_none());
    }

    #[test]
    fn test_delete_animates_then_removes() {
        let mut list = list();
        let keep = list.add("keep", None, "work").unwrap().unwrap();
        list.add("drop", None, "work").unwrap();
        let mut app = App::new(&mut list, Theme::Light);

        press(&mut app, KeyCode::Char('d'));
        assert!(app.list.view().rows[0].removing);
        app.tick();
        assert_eq!(app.list.tasks().len(), 2);

        app.list.clock().advance(Duration::from_millis(300));
        app.tick();
        assert_eq!(app.list.tasks().len(), 1);
        assert_eq!(app.selected_id(), Some(keep));
    }

    #[test]
    fn test_poll_timeout_shrinks_before_a_delete() {
        let mut list = list();
        list.add("drop", None, "work").unwrap();
        let mut app = App::new(&mut list, Theme::Light);
        assert_eq!(app.poll_timeout(), TICK);

        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.poll_timeout(), TICK);
        app.list.clock().advance(Duration::from_millis(280));
        assert_eq!(app.poll_timeout(), Duration::from_millis(20));
        app.list.clock().advance(Duration::from_millis(30));
        assert_eq!(app.poll_timeout(), Duration::ZERO);
    }

    struct FlakyStorage {
        inner: MemoryStorage,
        broken: Rc<StdCell<bool>>,
    }

    impl Storage for FlakyStorage {
        fn get_item(&self, key: &str) -> anyhow::Result<Option<String>> {
            self.inner.get_item(key)
        }

        fn set_item(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
            if self.broken.get() {
                anyhow::bail!("disk full");
            }
            self.inner.set_item(key, value)
        }
    }

    #[test]
    fn test_failed_add_can_be_retried_without_duplicates() {
        let broken = Rc::new(StdCell::new(true));
        let storage = FlakyStorage {
            inner: MemoryStorage::new(),
            broken: Rc::clone(&broken),
        };
        let now = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(12, 0, 0).unwrap();
        let mut list = TaskList::load(storage, ManualClock::new(now), Settings::default()).unwrap();
        let mut app = App::new(&mut list, Theme::Light);

        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "once");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state(), AppState::AddTask);
        assert!(app.status_message.contains("disk full"));
        assert!(app.list.tasks().is_empty());

        broken.set(false);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state(), AppState::TaskList);
        assert_eq!(app.list.tasks().len(), 1);
        assert_eq!(app.list.tasks()[0].text, "once");
    }

    #[test]
    fn test_theme_toggle_and_quit() {
        let mut list = list();
        let mut app = App::new(&mut list, Theme::Light);
        assert!(screen(&mut app).contains("Dark mode"));
        press(&mut app, KeyCode::Char('t'));
        assert_eq!(app.theme(), Theme::Dark);
        assert!(screen(&mut app).contains("Light mode"));

        press(&mut app, KeyCode::Char('h'));
        assert_eq!(app.state(), AppState::Help);
        assert!(!press(&mut app, KeyCode::Char('q')));
        assert_eq!(app.state(), AppState::TaskList);
        assert!(press(&mut app, KeyCode::Char('q')));
    }

    #[test]
    fn test_control_sequences_are_not_drawn_raw() {
        let mut list = list();
        list.add("bell\u{7}here", None, "work").unwrap();
        let mut app = App::new(&mut list, Theme::Dark);
        let shown = screen(&mut app);
        assert!(!shown.contains('\u{7}'));
        assert!(shown.contains("bell\\u{7}here"));
    }
}
