use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::models::{Employee, Role};

/// Build the textual payload for an employee card: avatar initials and name,
/// age and designation, then one line per qualification.
pub(crate) fn build_employee_card_lines(employee: &Employee, selected: bool) -> Vec<Line<'static>> {
    let marker = if selected { "▶ " } else { "" };
    let mut lines = vec![
        Line::from(vec![
            Span::raw(marker),
            Span::styled(
                format!("[{}]", employee.initials()),
                Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::styled(
                employee.name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(Span::styled(
            format!("{} • {} years", employee.designation, employee.age),
            Style::default().fg(Color::Gray),
        )),
    ];

    if employee.qualifications.is_empty() {
        lines.push(Line::from(Span::styled(
            "No qualifications on record",
            Style::default().fg(Color::DarkGray),
        )));
    }
    for qualification in &employee.qualifications {
        lines.push(Line::from(Span::styled(
            format!("  {qualification}"),
            Style::default().fg(Color::Cyan),
        )));
    }

    lines
}

/// Height a card needs: borders, two header lines and the qualification list.
pub(crate) fn card_height(employee: &Employee) -> u16 {
    let body = 2 + employee.qualifications.len().max(1);
    (body + 2).min(u16::MAX as usize) as u16
}

/// Title and hint shown when the list is empty. The hint depends on whether
/// a search is active and on the current role.
pub(crate) fn empty_state(role: Role, searching: bool) -> (&'static str, &'static str) {
    if searching {
        return ("No matching employees found", "Try adjusting your search terms");
    }
    let hint = match role {
        Role::Admin => "Start by adding a new employee.",
        Role::Employee => "Add your record!",
        Role::Visitor => "Check back later for updates.",
    };
    ("No employees found", hint)
}

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Terminal column for a cursor `offset` characters into `inner`, kept on
/// the last cell when the text runs past the right edge.
pub(crate) fn cursor_column(inner: Rect, offset: usize) -> u16 {
    let offset = u16::try_from(offset).unwrap_or(u16::MAX);
    let last = inner.right().saturating_sub(1).max(inner.x);
    inner.x.saturating_add(offset).min(last)
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

#[cfg(test)]
mod tests {
    use anyhow::{anyhow, Context};
    use chrono::{NaiveDate, Utc};

    use super::*;
    use crate::models::Qualification;

    fn employee(qualifications: usize) -> Employee {
        let now = Utc::now();
        Employee {
            id: "id".to_string(),
            name: "Grace Hopper".to_string(),
            age: 85,
            designation: "Rear Admiral".to_string(),
            qualifications: (0..qualifications)
                .map(|i| Qualification {
                    id: format!("q{i}"),
                    institution: "Yale".to_string(),
                    year_of_completion: NaiveDate::from_ymd_opt(1934, 1, 1).unwrap(),
                    designation: "PhD".to_string(),
                })
                .collect(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn card_lists_each_qualification() {
        let lines = build_employee_card_lines(&employee(2), false);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[2].to_string(), "  PhD - Yale (1934)");
        assert_eq!(card_height(&employee(2)), 6);
        assert_eq!(card_height(&employee(0)), 5);
    }

    #[test]
    fn empty_state_depends_on_role_and_search() {
        assert_eq!(empty_state(Role::Admin, false).1, "Start by adding a new employee.");
        assert_eq!(empty_state(Role::Employee, false).1, "Add your record!");
        assert_eq!(empty_state(Role::Visitor, false).1, "Check back later for updates.");
        assert_eq!(empty_state(Role::Visitor, true).0, "No matching employees found");
    }

    #[test]
    fn cursor_column_stays_inside_the_area() {
        let inner = Rect::new(5, 1, 20, 1);
        assert_eq!(cursor_column(inner, 3), 8);
        assert_eq!(cursor_column(inner, 19), 24);
        assert_eq!(cursor_column(inner, 200_000), 24);

        let edge = Rect::new(u16::MAX - 10, 0, 10, 1);
        assert_eq!(cursor_column(edge, usize::MAX), u16::MAX - 1);
    }

    #[test]
    fn surface_error_returns_root_cause() {
        let err = Err::<(), _>(anyhow!("disk full"))
            .context("failed to insert employee")
            .unwrap_err();
        assert_eq!(surface_error(&err), "disk full");
    }
}
