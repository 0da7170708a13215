//! Domain models that mirror the SQLite schema and get passed throughout the
//! TUI. These types stay light-weight data holders so other layers can focus
//! on presentation and persistence logic.

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Error};
use chrono::{DateTime, Datelike, NaiveDate, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
/// A directory entry together with every qualification it owns.
pub struct Employee {
    /// Hyphenated UUID generated by the store on insert. Never reassigned.
    pub id: String,
    pub name: String,
    pub age: i64,
    pub designation: String,
    /// Always present; an employee without credentials carries an empty list.
    pub qualifications: Vec<Qualification>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    /// Up to two uppercase initials taken from the first letters of the
    /// name's words. Used as the avatar text on employee cards.
    pub fn initials(&self) -> String {
        self.name
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .flat_map(char::to_uppercase)
            .take(2)
            .collect()
    }

    /// Case-insensitive substring match over the fields the search box
    /// covers. `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.designation.to_lowercase().contains(needle)
            || self.qualifications.iter().any(|q| {
                q.institution.to_lowercase().contains(needle)
                    || q.designation.to_lowercase().contains(needle)
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A degree or certification owned by exactly one employee.
pub struct Qualification {
    pub id: String,
    pub institution: String,
    /// Persisted as a full date even though only the year is displayed.
    pub year_of_completion: NaiveDate,
    /// Degree or certification name.
    pub designation: String,
}

impl fmt::Display for Qualification {
    /// `Designation - Institution (Year)`, the format employee cards use.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} ({})",
            self.designation,
            self.institution,
            self.year_of_completion.year()
        )
    }
}

/// Core employee fields accepted by `create_employee`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmployee {
    pub name: String,
    pub age: i64,
    pub designation: String,
}

/// Qualification fields accepted by `create_employee`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQualification {
    pub institution: String,
    pub year_of_completion: NaiveDate,
    pub designation: String,
}

/// Display preference that toggles which actions the UI offers. This is not
/// a security boundary: the store accepts every call regardless of role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    Admin,
    Employee,
    #[default]
    Visitor,
}

impl Role {
    /// Administrators and employees may add records.
    pub fn can_add(self) -> bool {
        matches!(self, Role::Admin | Role::Employee)
    }

    /// Only administrators see the delete action.
    pub fn can_delete(self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Cycle Administrator → Employee → Visitor → Administrator.
    pub fn next(self) -> Self {
        match self {
            Role::Admin => Role::Employee,
            Role::Employee => Role::Visitor,
            Role::Visitor => Role::Admin,
        }
    }

    /// Lowercase keyword accepted by `FromStr`, used when the role is saved.
    pub fn key(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Employee => "employee",
            Role::Visitor => "visitor",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::Employee => "Employee",
            Role::Visitor => "Visitor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" | "administrator" => Ok(Role::Admin),
            "employee" => Ok(Role::Employee),
            "visitor" => Ok(Role::Visitor),
            other => Err(anyhow!(
                "unknown role '{other}' (expected admin, employee or visitor)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee(name: &str) -> Employee {
        let now = Utc::now();
        Employee {
            id: "e1".to_string(),
            name: name.to_string(),
            age: 30,
            designation: "Engineer".to_string(),
            qualifications: vec![Qualification {
                id: "q1".to_string(),
                institution: "Cambridge".to_string(),
                year_of_completion: NaiveDate::from_ymd_opt(1840, 1, 1).unwrap(),
                designation: "Mathematics".to_string(),
            }],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn initials_take_first_two_words() {
        assert_eq!(employee("ada king lovelace").initials(), "AK");
        assert_eq!(employee("Plato").initials(), "P");
    }

    #[test]
    fn matches_covers_qualification_fields() {
        let ada = employee("Ada Lovelace");
        assert!(ada.matches("lovelace"));
        assert!(ada.matches("engin"));
        assert!(ada.matches("cambridge"));
        assert!(ada.matches("mathem"));
        assert!(!ada.matches("oxford"));
    }

    #[test]
    fn qualification_display_shows_year_only() {
        let ada = employee("Ada Lovelace");
        assert_eq!(
            ada.qualifications[0].to_string(),
            "Mathematics - Cambridge (1840)"
        );
    }

    #[test]
    fn role_parsing_and_permissions() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(" visitor ".parse::<Role>().unwrap(), Role::Visitor);
        assert!("manager".parse::<Role>().is_err());

        assert!(Role::Admin.can_delete());
        assert!(!Role::Employee.can_delete());
        assert!(Role::Employee.can_add());
        assert!(!Role::Visitor.can_add());
        assert_eq!(Role::Visitor.next(), Role::Admin);
    }

    #[test]
    fn role_keys_parse_back() {
        for role in [Role::Admin, Role::Employee, Role::Visitor] {
            assert_eq!(role.key().parse::<Role>().unwrap(), role);
        }
    }
}
