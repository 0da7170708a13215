use chrono::NaiveDate;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::Employee;
use crate::validation::{EmployeeDraft, QualificationDraft, ValidationError};

/// One editable qualification row of the add-employee form.
#[derive(Default, Clone)]
pub(crate) struct QualificationInput {
    pub(crate) institution: String,
    pub(crate) year: String,
    pub(crate) designation: String,
}

/// Internal representation of the add-employee form fields.
#[derive(Clone)]
pub(crate) struct EmployeeForm {
    pub(crate) name: String,
    pub(crate) age: String,
    pub(crate) designation: String,
    pub(crate) qualifications: Vec<QualificationInput>,
    pub(crate) active: EmployeeField,
    pub(crate) error: Option<String>,
}

/// Focusable fields. Qualification fields carry their row index.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum EmployeeField {
    Name,
    Age,
    Designation,
    Institution(usize),
    Year(usize),
    QualificationDesignation(usize),
}

impl Default for EmployeeForm {
    /// The form opens with one empty qualification row, mirroring the rule
    /// that at least one is required.
    fn default() -> Self {
        Self {
            name: String::new(),
            age: String::new(),
            designation: String::new(),
            qualifications: vec![QualificationInput::default()],
            active: EmployeeField::Name,
            error: None,
        }
    }
}

impl EmployeeForm {
    /// Move focus forward through every field, wrapping at the end.
    pub(crate) fn next_field(&mut self) {
        let last = self.qualifications.len().saturating_sub(1);
        self.active = match self.active {
            EmployeeField::Name => EmployeeField::Age,
            EmployeeField::Age => EmployeeField::Designation,
            EmployeeField::Designation => EmployeeField::Institution(0),
            EmployeeField::Institution(i) => EmployeeField::Year(i),
            EmployeeField::Year(i) => EmployeeField::QualificationDesignation(i),
            EmployeeField::QualificationDesignation(i) if i < last => {
                EmployeeField::Institution(i + 1)
            }
            EmployeeField::QualificationDesignation(_) => EmployeeField::Name,
        };
    }

    pub(crate) fn previous_field(&mut self) {
        let last = self.qualifications.len().saturating_sub(1);
        self.active = match self.active {
            EmployeeField::Name => EmployeeField::QualificationDesignation(last),
            EmployeeField::Age => EmployeeField::Name,
            EmployeeField::Designation => EmployeeField::Age,
            EmployeeField::Institution(0) => EmployeeField::Designation,
            EmployeeField::Institution(i) => EmployeeField::QualificationDesignation(i - 1),
            EmployeeField::Year(i) => EmployeeField::Institution(i),
            EmployeeField::QualificationDesignation(i) => EmployeeField::Year(i),
        };
    }

    /// Append a qualification row and focus its first field.
    pub(crate) fn add_qualification(&mut self) {
        self.qualifications.push(QualificationInput::default());
        self.active = EmployeeField::Institution(self.qualifications.len() - 1);
    }

    /// Remove the focused qualification row. The last remaining row stays so
    /// the form always has somewhere to type.
    pub(crate) fn remove_qualification(&mut self) -> bool {
        let Some(index) = self.active_row() else {
            return false;
        };
        if self.qualifications.len() <= 1 {
            return false;
        }
        self.qualifications.remove(index);
        let row = index.min(self.qualifications.len() - 1);
        self.active = EmployeeField::Institution(row);
        true
    }

    fn active_row(&self) -> Option<usize> {
        match self.active {
            EmployeeField::Institution(i)
            | EmployeeField::Year(i)
            | EmployeeField::QualificationDesignation(i) => Some(i),
            _ => None,
        }
    }

    /// Append a character to the active field. Age takes digits only; the
    /// year takes digits and dashes.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            EmployeeField::Age if !ch.is_ascii_digit() => false,
            EmployeeField::Year(_) if !(ch.is_ascii_digit() || ch == '-') => false,
            field => {
                if let Some(value) = self.value_mut(field) {
                    value.push(ch);
                    true
                } else {
                    false
                }
            }
        }
    }

    pub(crate) fn backspace(&mut self) {
        if let Some(value) = self.value_mut(self.active) {
            value.pop();
        }
    }

    fn value(&self, field: EmployeeField) -> Option<&String> {
        match field {
            EmployeeField::Name => Some(&self.name),
            EmployeeField::Age => Some(&self.age),
            EmployeeField::Designation => Some(&self.designation),
            EmployeeField::Institution(i) => self.qualifications.get(i).map(|q| &q.institution),
            EmployeeField::Year(i) => self.qualifications.get(i).map(|q| &q.year),
            EmployeeField::QualificationDesignation(i) => {
                self.qualifications.get(i).map(|q| &q.designation)
            }
        }
    }

    fn value_mut(&mut self, field: EmployeeField) -> Option<&mut String> {
        match field {
            EmployeeField::Name => Some(&mut self.name),
            EmployeeField::Age => Some(&mut self.age),
            EmployeeField::Designation => Some(&mut self.designation),
            EmployeeField::Institution(i) => {
                self.qualifications.get_mut(i).map(|q| &mut q.institution)
            }
            EmployeeField::Year(i) => self.qualifications.get_mut(i).map(|q| &mut q.year),
            EmployeeField::QualificationDesignation(i) => {
                self.qualifications.get_mut(i).map(|q| &mut q.designation)
            }
        }
    }

    /// Collect the inputs into a draft for the validation gate. Text is
    /// trimmed; unparseable numbers and dates become missing values.
    pub(crate) fn to_draft(&self) -> EmployeeDraft {
        EmployeeDraft {
            name: self.name.trim().to_string(),
            age: self.age.trim().parse().ok(),
            designation: self.designation.trim().to_string(),
            qualifications: self
                .qualifications
                .iter()
                .map(|q| QualificationDraft {
                    institution: q.institution.trim().to_string(),
                    year_of_completion: parse_completion_date(&q.year),
                    designation: q.designation.trim().to_string(),
                })
                .collect(),
        }
    }

    /// Move focus to the field a validation error points at.
    pub(crate) fn focus_error(&mut self, err: &ValidationError) {
        self.active = match *err {
            ValidationError::NameTooShort => EmployeeField::Name,
            ValidationError::AgeMissing | ValidationError::TooYoung | ValidationError::InvalidAge => {
                EmployeeField::Age
            }
            ValidationError::DesignationMissing => EmployeeField::Designation,
            ValidationError::NoQualifications => EmployeeField::Institution(0),
            ValidationError::InstitutionMissing { index } => EmployeeField::Institution(index),
            ValidationError::CompletionDateMissing { index } => EmployeeField::Year(index),
            ValidationError::QualificationDesignationMissing { index } => {
                EmployeeField::QualificationDesignation(index)
            }
        };
    }

    /// Render a single line for the form widget.
    pub(crate) fn build_line(&self, field_name: &str, field: EmployeeField) -> Line<'static> {
        let value = self.value(field).cloned().unwrap_or_default();
        let is_active = self.active == field;

        let placeholder = match field {
            EmployeeField::Year(_) => "<YYYY or YYYY-MM-DD>",
            _ => "<required>",
        };
        let display = if value.is_empty() {
            placeholder.to_string()
        } else {
            value.clone()
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::raw(format!("{field_name}: ")),
            Span::styled(display, style),
        ])
    }

    /// Character count of the requested field, used to place the cursor.
    pub(crate) fn value_len(&self, field: EmployeeField) -> usize {
        self.value(field).map(|v| v.chars().count()).unwrap_or(0)
    }
}

/// Accept a bare year (stored as January 1st) or a full ISO date.
pub(crate) fn parse_completion_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.len() == 4 {
        let year: i32 = raw.parse().ok()?;
        return NaiveDate::from_ymd_opt(year, 1, 1);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// State for confirming the deletion of an employee.
#[derive(Clone)]
pub(crate) struct ConfirmEmployeeDelete {
    pub(crate) id: String,
    pub(crate) name: String,
}

impl ConfirmEmployeeDelete {
    pub(crate) fn from(employee: &Employee) -> Self {
        Self {
            id: employee.id.clone(),
            name: employee.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_text(form: &mut EmployeeForm, text: &str) {
        for ch in text.chars() {
            form.push_char(ch);
        }
    }

    #[test]
    fn focus_walks_through_qualification_rows() {
        let mut form = EmployeeForm::default();
        form.add_qualification();
        form.active = EmployeeField::Name;

        let mut visited = Vec::new();
        for _ in 0..9 {
            visited.push(form.active);
            form.next_field();
        }
        assert_eq!(
            visited,
            [
                EmployeeField::Name,
                EmployeeField::Age,
                EmployeeField::Designation,
                EmployeeField::Institution(0),
                EmployeeField::Year(0),
                EmployeeField::QualificationDesignation(0),
                EmployeeField::Institution(1),
                EmployeeField::Year(1),
                EmployeeField::QualificationDesignation(1),
            ]
        );
        assert_eq!(form.active, EmployeeField::Name);

        form.previous_field();
        assert_eq!(form.active, EmployeeField::QualificationDesignation(1));
    }

    #[test]
    fn age_and_year_reject_letters() {
        let mut form = EmployeeForm::default();
        form.active = EmployeeField::Age;
        assert!(!form.push_char('x'));
        type_text(&mut form, "42");
        form.active = EmployeeField::Year(0);
        assert!(!form.push_char('y'));
        type_text(&mut form, "1999-06-30");

        assert_eq!(form.age, "42");
        assert_eq!(form.qualifications[0].year, "1999-06-30");
    }

    #[test]
    fn draft_trims_and_parses() {
        let mut form = EmployeeForm::default();
        type_text(&mut form, "  Ada Lovelace ");
        form.next_field();
        type_text(&mut form, "30");
        form.next_field();
        type_text(&mut form, "Engineer");
        form.next_field();
        type_text(&mut form, "Cambridge");
        form.next_field();
        type_text(&mut form, "1840");
        form.next_field();
        type_text(&mut form, "Mathematics");

        let draft = form.to_draft();
        assert_eq!(draft.name, "Ada Lovelace");
        assert_eq!(draft.age, Some(30));
        assert_eq!(
            draft.qualifications[0].year_of_completion,
            NaiveDate::from_ymd_opt(1840, 1, 1)
        );
    }

    #[test]
    fn completion_date_formats() {
        assert_eq!(parse_completion_date("2001"), NaiveDate::from_ymd_opt(2001, 1, 1));
        assert_eq!(
            parse_completion_date("2001-09-15"),
            NaiveDate::from_ymd_opt(2001, 9, 15)
        );
        assert_eq!(parse_completion_date("2001-13-01"), None);
        assert_eq!(parse_completion_date(""), None);
    }

    #[test]
    fn last_qualification_row_cannot_be_removed() {
        let mut form = EmployeeForm::default();
        form.active = EmployeeField::Institution(0);
        assert!(!form.remove_qualification());

        form.add_qualification();
        assert_eq!(form.active, EmployeeField::Institution(1));
        assert!(form.remove_qualification());
        assert_eq!(form.qualifications.len(), 1);
        assert_eq!(form.active, EmployeeField::Institution(0));
    }

    #[test]
    fn validation_errors_move_focus() {
        let mut form = EmployeeForm::default();
        form.focus_error(&ValidationError::CompletionDateMissing { index: 0 });
        assert_eq!(form.active, EmployeeField::Year(0));
        form.focus_error(&ValidationError::TooYoung);
        assert_eq!(form.active, EmployeeField::Age);
    }
}
