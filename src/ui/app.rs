use std::cmp::min;
use std::mem;
use std::path::PathBuf;

use anyhow::{Error, Result};
use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;
use rusqlite::Connection;
use tracing::{debug, error, info};

use crate::config::save_role;
use crate::db::{create_employee, delete_employee, list_employees};
use crate::models::{Employee, Role};
use crate::validation::validate;

use super::forms::{ConfirmEmployeeDelete, EmployeeField, EmployeeForm};
use super::helpers::{
    build_employee_card_lines, card_height, centered_rect, cursor_column, empty_state,
    surface_error,
};
use super::screens::DirectoryScreen;

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
const HEADER_HEIGHT: u16 = 4;
const PAGE: isize = 5;

/// Fine-grained modes layered over the directory list.
enum Mode {
    Normal,
    Searching(SearchState),
    AddingEmployee(EmployeeForm),
    ConfirmDelete(ConfirmEmployeeDelete),
}

/// State for an active inline search.
struct SearchState {
    query: String,
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Rows of the add-employee modal, in display order.
enum FormRow {
    Heading(String),
    Field(&'static str, EmployeeField),
}

/// Central application state shared across the TUI.
pub struct App {
    conn: Connection,
    directory: DirectoryScreen,
    /// Display preference only. Passed explicitly into every draw helper so
    /// rendering never reads it from anywhere else.
    role: Role,
    /// Role switches are written here when set.
    role_file: Option<PathBuf>,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(conn: Connection, employees: Vec<Employee>, role: Role) -> Self {
        Self {
            conn,
            directory: DirectoryScreen::new(employees),
            role,
            role_file: None,
            mode: Mode::Normal,
            status: None,
        }
    }

    /// Load the initial snapshot from the store. A failed read still starts
    /// the UI, with an empty directory and the cause in the footer.
    pub fn open(conn: Connection, role: Role) -> Self {
        match list_employees(&conn) {
            Ok(employees) => {
                info!(count = employees.len(), "directory loaded");
                Self::new(conn, employees, role)
            }
            Err(err) => {
                let err = Error::from(err);
                error!(error = %format!("{err:#}"), "initial load failed");
                let mut app = Self::new(conn, Vec::new(), role);
                app.set_status(
                    format!("Failed to load employees: {}", surface_error(&err)),
                    StatusKind::Error,
                );
                app
            }
        }
    }

    /// Save every role switch to `path` so the next start restores it.
    pub fn with_role_file(mut self, path: PathBuf) -> Self {
        self.role_file = Some(path);
        self
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Employees currently shown, after search and sort.
    pub fn visible_employees(&self) -> &[Employee] {
        &self.directory.visible
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit),
            Mode::Searching(state) => self.handle_search(code, state),
            Mode::AddingEmployee(form) => self.handle_add_employee(code, form),
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm),
        };

        Ok(exit)
    }

    /// Control-key shortcuts. Returns whether the key was consumed.
    pub fn handle_ctrl(&mut self, ch: char) -> Result<bool> {
        if let Mode::AddingEmployee(form) = &mut self.mode {
            match ch {
                'a' => {
                    form.add_qualification();
                    form.error = None;
                }
                'd' => {
                    if !form.remove_qualification() && form.qualifications.len() <= 1 {
                        form.error = Some("At least one qualification is required".to_string());
                    }
                }
                _ => return Ok(false),
            }
            return Ok(true);
        }

        if ch == 'r' && matches!(self.mode, Mode::Normal) {
            self.reload_employees();
            return Ok(true);
        }
        Ok(false)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                *exit = true;
            }
            KeyCode::Up => self.directory.move_selection(-1),
            KeyCode::Down => self.directory.move_selection(1),
            KeyCode::PageUp => self.directory.move_selection(-PAGE),
            KeyCode::PageDown => self.directory.move_selection(PAGE),
            KeyCode::Home => self.directory.select_first(),
            KeyCode::End => self.directory.select_last(),
            KeyCode::Char('f') | KeyCode::Char('/') => {
                let query = self.directory.filter.clone().unwrap_or_default();
                return Mode::Searching(SearchState { query });
            }
            KeyCode::Char('o') | KeyCode::Char('O') => {
                let sort = self.directory.cycle_sort();
                self.set_status(format!("Sorted by {}.", sort.label()), StatusKind::Info);
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.switch_role();
            }
            KeyCode::Char('+') => {
                if self.role.can_add() {
                    self.clear_status();
                    return Mode::AddingEmployee(EmployeeForm::default());
                }
                self.set_status("Your role cannot add employees.", StatusKind::Error);
            }
            KeyCode::Char('-') => {
                if !self.role.can_delete() {
                    self.set_status("Only administrators can delete employees.", StatusKind::Error);
                } else if let Some(employee) = self.directory.current_employee() {
                    let confirm = ConfirmEmployeeDelete::from(employee);
                    self.clear_status();
                    return Mode::ConfirmDelete(confirm);
                } else {
                    self.set_status("No employee selected to delete.", StatusKind::Error);
                }
            }
            _ => {}
        }
        Mode::Normal
    }

    fn switch_role(&mut self) {
        self.role = self.role.next();
        debug!(role = %self.role, "role switched");

        let saved = match &self.role_file {
            Some(path) => save_role(path, self.role),
            None => Ok(()),
        };
        match saved {
            Ok(()) => self.set_status(format!("Viewing as {}.", self.role), StatusKind::Info),
            Err(err) => {
                error!(error = %format!("{err:#}"), "failed to save role");
                self.set_status(
                    format!("Viewing as {} (not saved: {}).", self.role, surface_error(&err)),
                    StatusKind::Error,
                );
            }
        }
    }

    fn handle_search(&mut self, code: KeyCode, mut state: SearchState) -> Mode {
        match code {
            KeyCode::Esc => {
                self.directory.set_filter(None);
                return Mode::Normal;
            }
            KeyCode::Enter => return Mode::Normal,
            KeyCode::Up => {
                self.directory.move_selection(-1);
                return Mode::Searching(state);
            }
            KeyCode::Down => {
                self.directory.move_selection(1);
                return Mode::Searching(state);
            }
            KeyCode::PageUp => {
                self.directory.move_selection(-PAGE);
                return Mode::Searching(state);
            }
            KeyCode::PageDown => {
                self.directory.move_selection(PAGE);
                return Mode::Searching(state);
            }
            KeyCode::Backspace => {
                state.query.pop();
            }
            KeyCode::Char(ch) if !ch.is_control() => state.query.push(ch),
            _ => {}
        }

        if state.query.trim().is_empty() {
            self.directory.set_filter(None);
        } else {
            self.directory.set_filter(Some(state.query.clone()));
        }

        Mode::Searching(state)
    }

    fn handle_add_employee(&mut self, code: KeyCode, mut form: EmployeeForm) -> Mode {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Add employee cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_new_employee(&mut form) {
                Ok(()) => keep_open = false,
                Err(message) => {
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Mode::AddingEmployee(form)
        } else {
            Mode::Normal
        }
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmEmployeeDelete) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.perform_delete(&confirm);
                Mode::Normal
            }
            _ => Mode::ConfirmDelete(confirm),
        }
    }

    /// Validate, persist, and splice the created employee into the snapshot.
    /// The snapshot is only touched once the store has committed.
    fn save_new_employee(&mut self, form: &mut EmployeeForm) -> Result<(), String> {
        let (employee, qualifications) = validate(&form.to_draft()).map_err(|err| {
            form.focus_error(&err);
            err.to_string()
        })?;

        let created = create_employee(&self.conn, &employee, &qualifications)
            .map_err(|err| surface_error(&Error::from(err)))?;
        info!(employee_id = %created.id, "employee added from form");
        self.directory.prepend(created);
        self.directory.select_first();
        self.set_status("Employee added successfully", StatusKind::Info);
        Ok(())
    }

    fn perform_delete(&mut self, confirm: &ConfirmEmployeeDelete) {
        match delete_employee(&self.conn, &confirm.id) {
            Ok(()) => {
                self.directory.remove(&confirm.id);
                self.set_status("Employee deleted successfully", StatusKind::Info);
            }
            Err(err) => {
                let message = format!(
                    "Failed to delete {}: {}",
                    confirm.name,
                    surface_error(&Error::from(err))
                );
                self.set_status(message, StatusKind::Error);
            }
        }
    }

    /// Replace the snapshot with a fresh read. A failed read keeps the old
    /// snapshot on screen.
    fn reload_employees(&mut self) {
        match list_employees(&self.conn) {
            Ok(employees) => {
                let count = employees.len();
                self.directory.set_employees(employees);
                self.set_status(format!("Loaded {count} employees."), StatusKind::Info);
            }
            Err(err) => {
                self.set_status(surface_error(&Error::from(err)), StatusKind::Error);
            }
        }
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let role = self.role;
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(HEADER_HEIGHT.min(area.height)),
                Constraint::Min(0),
                Constraint::Length(footer_height),
            ])
            .split(area);

        self.draw_header(frame, chunks[0], role);
        self.draw_directory(frame, chunks[1], role);
        self.draw_footer(frame, chunks[2], role);

        match &self.mode {
            Mode::Searching(state) => self.draw_search_bar(frame, area, state),
            Mode::AddingEmployee(form) => self.draw_employee_form(frame, area, form),
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::Normal => {}
        }
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect, role: Role) {
        let directory = &self.directory;
        let mut summary = vec![
            Span::raw("Role: "),
            Span::styled(role.label(), Style::default().fg(Color::Yellow)),
            Span::raw("  •  Sort: "),
            Span::styled(directory.sort.label(), Style::default().fg(Color::Yellow)),
            Span::raw(format!("  •  {} employees", directory.employees.len())),
        ];
        if directory.has_search() {
            summary.push(Span::raw(format!(
                "  •  Found {} results",
                directory.visible.len()
            )));
        }

        let header = Paragraph::new(vec![
            Line::from(Span::styled(
                "Employee Directory",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(summary),
        ])
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(header, area);
    }

    fn draw_directory(&self, frame: &mut Frame, area: Rect, role: Role) {
        if area.height == 0 {
            return;
        }

        if self.directory.visible.is_empty() {
            let (title, hint) = empty_state(role, self.directory.has_search());
            let message = Paragraph::new(vec![
                Line::from(Span::styled(
                    title,
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(hint, Style::default().fg(Color::Gray))),
            ])
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
            frame.render_widget(message, area);
            return;
        }

        self.render_employee_cards(frame, area);
    }

    /// Stack as many cards as fit, scrolling so the selected card stays in
    /// view.
    fn render_employee_cards(&self, frame: &mut Frame, area: Rect) {
        let employees = &self.directory.visible;
        let selected = self.directory.selected;

        let mut start = 0;
        loop {
            let used: u16 = employees[start..=selected]
                .iter()
                .map(card_height)
                .fold(0u16, u16::saturating_add);
            if used <= area.height || start == selected {
                break;
            }
            start += 1;
        }

        let mut constraints = Vec::new();
        let mut used = 0u16;
        for employee in &employees[start..] {
            let height = card_height(employee);
            if used.saturating_add(height) > area.height && !constraints.is_empty() {
                break;
            }
            constraints.push(Constraint::Length(height));
            used = used.saturating_add(height);
        }
        let shown = min(constraints.len(), employees.len() - start);
        constraints.push(Constraint::Min(0));

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        for (offset, chunk) in rows.iter().take(shown).enumerate() {
            if chunk.height == 0 {
                continue;
            }
            let index = start + offset;
            let is_selected = index == selected;
            let mut block = Block::default().borders(Borders::ALL);
            if is_selected {
                block = block.style(Style::default().fg(Color::Yellow));
            }

            let card = Paragraph::new(build_employee_card_lines(&employees[index], is_selected))
                .block(block)
                .wrap(Wrap { trim: false })
                .alignment(Alignment::Left);
            frame.render_widget(card, *chunk);
        }
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect, role: Role) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let paragraph = Paragraph::new(vec![status_line, self.footer_instructions(role)])
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self, role: Role) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let key = |label: &'static str, action: &'static str| {
            vec![
                Span::styled(label, key_style),
                Span::raw(format!(" {action}   ")),
            ]
        };

        let spans: Vec<Span<'static>> = match &self.mode {
            Mode::Searching(_) => [
                key("[↑↓]", "Navigate"),
                key("[Enter]", "Keep Filter"),
                key("[Esc]", "Clear"),
            ]
            .concat(),
            Mode::AddingEmployee(_) => [
                key("[Tab]", "Next Field"),
                key("[Ctrl+A]", "Add Qualification"),
                key("[Ctrl+D]", "Remove Qualification"),
                key("[Enter]", "Save"),
                key("[Esc]", "Cancel"),
            ]
            .concat(),
            Mode::ConfirmDelete(_) => [key("[y]", "Delete"), key("[n]", "Keep")].concat(),
            Mode::Normal => {
                let mut spans = [
                    key("[↑↓]", "Select"),
                    key("[f]", "Search"),
                    key("[o]", "Sort"),
                    key("[r]", "Role"),
                ]
                .concat();
                if role.can_add() {
                    spans.extend(key("[+]", "Add"));
                }
                if role.can_delete() {
                    spans.extend(key("[-]", "Delete"));
                }
                spans.extend(key("[Ctrl+R]", "Reload"));
                spans.extend(key("[q]", "Quit"));
                spans
            }
        };

        Line::from(spans)
    }

    fn draw_search_bar(&self, frame: &mut Frame, area: Rect, state: &SearchState) {
        let height = 3u16.min(area.height);
        let popup_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height,
        };
        frame.render_widget(Clear, popup_area);

        let block = Block::default().borders(Borders::ALL).title("Search");
        let paragraph = Paragraph::new(Span::raw(format!("Search: {}", state.query)))
            .block(block.clone())
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);

        let inner = block.inner(popup_area);
        let offset = "Search: ".len() + state.query.chars().count();
        frame.set_cursor_position((cursor_column(inner, offset), inner.y));
    }

    fn draw_employee_form(&self, frame: &mut Frame, area: Rect, form: &EmployeeForm) {
        let popup_area = centered_rect(70, 70, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Add Employee").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);
        if inner.height == 0 {
            return;
        }

        let mut rows = vec![
            FormRow::Field("Name", EmployeeField::Name),
            FormRow::Field("Age", EmployeeField::Age),
            FormRow::Field("Designation", EmployeeField::Designation),
        ];
        for index in 0..form.qualifications.len() {
            rows.push(FormRow::Heading(format!("Qualification {}", index + 1)));
            rows.push(FormRow::Field("  Institution", EmployeeField::Institution(index)));
            rows.push(FormRow::Field("  Year", EmployeeField::Year(index)));
            rows.push(FormRow::Field(
                "  Designation",
                EmployeeField::QualificationDesignation(index),
            ));
        }

        let mut lines = Vec::with_capacity(rows.len() + 2);
        let mut cursor = (0usize, 0u16);
        for row in &rows {
            match row {
                FormRow::Heading(text) => lines.push(Line::from(Span::styled(
                    text.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ))),
                FormRow::Field(label, field) => {
                    if *field == form.active {
                        let column = label.chars().count() + 2 + form.value_len(*field);
                        cursor = (column, lines.len() as u16);
                    }
                    lines.push(form.build_line(label, *field));
                }
            }
        }

        lines.push(Line::from(""));
        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Tab to switch • Ctrl+A add qualification • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let scroll = cursor.1.saturating_sub(inner.height.saturating_sub(3));
        let paragraph = Paragraph::new(lines).scroll((scroll, 0));
        frame.render_widget(paragraph, inner);

        frame.set_cursor_position((cursor_column(inner, cursor.0), inner.y + cursor.1 - scroll));
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmEmployeeDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Are you sure?")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!("Delete {}?", confirm.name)),
            Line::from("This permanently removes the employee and all of their qualifications."),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }
}
