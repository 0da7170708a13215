//! Gate that every add-employee payload passes before it reaches the store.
//! Checks run in field order and stop at the first violation, so the user
//! sees one message at a time.

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{NewEmployee, NewQualification};

pub const MIN_TEXT_LEN: usize = 2;
pub const MIN_AGE: i64 = 18;
pub const MAX_AGE: i64 = 100;

/// Candidate payload as collected from the form. Fields stay loosely typed
/// so that missing values can be reported instead of rejected at parse time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeeDraft {
    pub name: String,
    pub age: Option<i64>,
    pub designation: String,
    pub qualifications: Vec<QualificationDraft>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QualificationDraft {
    pub institution: String,
    pub year_of_completion: Option<NaiveDate>,
    pub designation: String,
}

/// The first rule a draft broke. Qualification variants carry the row index
/// so the form can move focus there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Name must be at least 2 characters")]
    NameTooShort,
    #[error("Age is required")]
    AgeMissing,
    #[error("Employee must be at least 18 years old")]
    TooYoung,
    #[error("Invalid age")]
    InvalidAge,
    #[error("Designation is required")]
    DesignationMissing,
    #[error("At least one qualification is required")]
    NoQualifications,
    #[error("Institution name is required")]
    InstitutionMissing { index: usize },
    #[error("Year of completion is required")]
    CompletionDateMissing { index: usize },
    #[error("Designation is required")]
    QualificationDesignationMissing { index: usize },
}

impl ValidationError {
    /// Index of the qualification row at fault, if any.
    pub fn qualification_index(&self) -> Option<usize> {
        match self {
            ValidationError::InstitutionMissing { index }
            | ValidationError::CompletionDateMissing { index }
            | ValidationError::QualificationDesignationMissing { index } => Some(*index),
            _ => None,
        }
    }
}

/// Validate a draft and split it into the typed inputs `create_employee`
/// expects.
pub fn validate(
    draft: &EmployeeDraft,
) -> Result<(NewEmployee, Vec<NewQualification>), ValidationError> {
    if !long_enough(&draft.name) {
        return Err(ValidationError::NameTooShort);
    }
    let age = draft.age.ok_or(ValidationError::AgeMissing)?;
    if age < MIN_AGE {
        return Err(ValidationError::TooYoung);
    }
    if age > MAX_AGE {
        return Err(ValidationError::InvalidAge);
    }
    if !long_enough(&draft.designation) {
        return Err(ValidationError::DesignationMissing);
    }
    if draft.qualifications.is_empty() {
        return Err(ValidationError::NoQualifications);
    }

    let mut qualifications = Vec::with_capacity(draft.qualifications.len());
    for (index, qualification) in draft.qualifications.iter().enumerate() {
        if !long_enough(&qualification.institution) {
            return Err(ValidationError::InstitutionMissing { index });
        }
        let year_of_completion = qualification
            .year_of_completion
            .ok_or(ValidationError::CompletionDateMissing { index })?;
        if !long_enough(&qualification.designation) {
            return Err(ValidationError::QualificationDesignationMissing { index });
        }
        qualifications.push(NewQualification {
            institution: qualification.institution.clone(),
            year_of_completion,
            designation: qualification.designation.clone(),
        });
    }

    let employee = NewEmployee {
        name: draft.name.clone(),
        age,
        designation: draft.designation.clone(),
    };
    Ok((employee, qualifications))
}

fn long_enough(value: &str) -> bool {
    value.chars().count() >= MIN_TEXT_LEN
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> EmployeeDraft {
        EmployeeDraft {
            name: "Ada Lovelace".to_string(),
            age: Some(30),
            designation: "Engineer".to_string(),
            qualifications: vec![QualificationDraft {
                institution: "Cambridge".to_string(),
                year_of_completion: NaiveDate::from_ymd_opt(1840, 1, 1),
                designation: "Mathematics".to_string(),
            }],
        }
    }

    #[test]
    fn accepts_a_complete_draft() {
        let (employee, qualifications) = validate(&valid()).unwrap();
        assert_eq!(employee.name, "Ada Lovelace");
        assert_eq!(employee.age, 30);
        assert_eq!(qualifications.len(), 1);
        assert_eq!(qualifications[0].institution, "Cambridge");
    }

    #[test]
    fn age_bounds_are_inclusive() {
        let mut draft = valid();
        draft.age = Some(18);
        assert!(validate(&draft).is_ok());
        draft.age = Some(100);
        assert!(validate(&draft).is_ok());
        draft.age = Some(17);
        assert_eq!(validate(&draft).unwrap_err(), ValidationError::TooYoung);
        draft.age = Some(101);
        assert_eq!(validate(&draft).unwrap_err(), ValidationError::InvalidAge);
        draft.age = None;
        assert_eq!(validate(&draft).unwrap_err(), ValidationError::AgeMissing);
    }

    #[test]
    fn reports_only_the_first_violation() {
        let draft = EmployeeDraft {
            name: "A".to_string(),
            age: Some(5),
            designation: String::new(),
            qualifications: Vec::new(),
        };
        let err = validate(&draft).unwrap_err();
        assert_eq!(err, ValidationError::NameTooShort);
        assert_eq!(err.to_string(), "Name must be at least 2 characters");
    }

    #[test]
    fn requires_a_qualification() {
        let mut draft = valid();
        draft.qualifications.clear();
        assert_eq!(
            validate(&draft).unwrap_err().to_string(),
            "At least one qualification is required"
        );
    }

    #[test]
    fn qualification_rows_are_checked_in_order() {
        let mut draft = valid();
        draft.qualifications.push(QualificationDraft {
            institution: "MIT".to_string(),
            year_of_completion: None,
            designation: "X".to_string(),
        });

        let err = validate(&draft).unwrap_err();
        assert_eq!(err, ValidationError::CompletionDateMissing { index: 1 });
        assert_eq!(err.qualification_index(), Some(1));
        assert_eq!(err.to_string(), "Year of completion is required");

        draft.qualifications[1].year_of_completion = NaiveDate::from_ymd_opt(2001, 1, 1);
        assert_eq!(
            validate(&draft).unwrap_err(),
            ValidationError::QualificationDesignationMissing { index: 1 }
        );

        draft.qualifications[0].institution = "C".to_string();
        assert_eq!(
            validate(&draft).unwrap_err(),
            ValidationError::InstitutionMissing { index: 0 }
        );
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let mut draft = valid();
        draft.name = "é".to_string();
        assert_eq!(validate(&draft).unwrap_err(), ValidationError::NameTooShort);
        draft.name = "Ōe".to_string();
        assert!(validate(&draft).is_ok());
    }
}
