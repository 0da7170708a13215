//! Search and sort over the in-memory snapshot. The store is never asked to
//! filter or order on the UI's behalf.

use std::cmp::Ordering;

use crate::models::Employee;

/// Orderings offered by the sort selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOption {
    NameAsc,
    NameDesc,
    DateAsc,
    #[default]
    DateDesc,
}

impl SortOption {
    pub const ALL: [SortOption; 4] = [
        SortOption::NameAsc,
        SortOption::NameDesc,
        SortOption::DateAsc,
        SortOption::DateDesc,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SortOption::NameAsc => "Name (A-Z)",
            SortOption::NameDesc => "Name (Z-A)",
            SortOption::DateAsc => "Date (Oldest)",
            SortOption::DateDesc => "Date (Newest)",
        }
    }

    /// Advance to the next option, wrapping around.
    pub fn next(self) -> Self {
        let position = Self::ALL
            .iter()
            .position(|option| *option == self)
            .unwrap_or(0);
        Self::ALL[(position + 1) % Self::ALL.len()]
    }

    fn compare(self, a: &Employee, b: &Employee) -> Ordering {
        match self {
            SortOption::NameAsc => compare_names(&a.name, &b.name),
            SortOption::NameDesc => compare_names(&b.name, &a.name),
            SortOption::DateAsc => a.created_at.cmp(&b.created_at),
            SortOption::DateDesc => b.created_at.cmp(&a.created_at),
        }
    }
}

/// Case-insensitive first so "alice" and "Bob" interleave the way a reader
/// expects, then the raw text to keep the order total.
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Return the employees matching `query` (case-insensitive substring over
/// name, designation and qualification fields) in the requested order. A
/// blank query matches everyone. The sort is stable.
pub fn filter_and_sort(employees: &[Employee], query: &str, sort: SortOption) -> Vec<Employee> {
    let needle = query.trim().to_lowercase();
    let mut result: Vec<Employee> = if needle.is_empty() {
        employees.to_vec()
    } else {
        employees
            .iter()
            .filter(|employee| employee.matches(&needle))
            .cloned()
            .collect()
    };

    result.sort_by(|a, b| sort.compare(a, b));
    result
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    use super::*;
    use crate::models::Qualification;

    fn employee(name: &str, designation: &str, minutes: i64, institution: &str) -> Employee {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap() + Duration::minutes(minutes);
        Employee {
            id: format!("id-{name}"),
            name: name.to_string(),
            age: 30,
            designation: designation.to_string(),
            qualifications: vec![Qualification {
                id: format!("q-{name}"),
                institution: institution.to_string(),
                year_of_completion: NaiveDate::from_ymd_opt(2010, 1, 1).unwrap(),
                designation: "BSc".to_string(),
            }],
            created_at: created,
            updated_at: created,
        }
    }

    fn sample() -> Vec<Employee> {
        vec![
            employee("bob", "Designer", 2, "Oxford"),
            employee("Alice", "Engineer", 1, "MIT"),
            employee("Carol", "Manager", 3, "Stanford"),
        ]
    }

    fn names(employees: &[Employee]) -> Vec<&str> {
        employees.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn blank_query_keeps_everyone() {
        let result = filter_and_sort(&sample(), "   ", SortOption::DateDesc);
        assert_eq!(names(&result), ["Carol", "bob", "Alice"]);
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let employees = sample();
        assert_eq!(
            names(&filter_and_sort(&employees, "ENGIN", SortOption::NameAsc)),
            ["Alice"]
        );
        assert_eq!(
            names(&filter_and_sort(&employees, "stan", SortOption::NameAsc)),
            ["Carol"]
        );
        assert_eq!(
            filter_and_sort(&employees, "bsc", SortOption::NameAsc).len(),
            3
        );
        assert!(filter_and_sort(&employees, "nobody", SortOption::NameAsc).is_empty());
    }

    #[test]
    fn name_sorts_ignore_case() {
        let employees = sample();
        assert_eq!(
            names(&filter_and_sort(&employees, "", SortOption::NameAsc)),
            ["Alice", "bob", "Carol"]
        );
        assert_eq!(
            names(&filter_and_sort(&employees, "", SortOption::NameDesc)),
            ["Carol", "bob", "Alice"]
        );
    }

    #[test]
    fn date_sorts_follow_creation_time() {
        let employees = sample();
        assert_eq!(
            names(&filter_and_sort(&employees, "", SortOption::DateAsc)),
            ["Alice", "bob", "Carol"]
        );
    }

    #[test]
    fn sort_option_cycles() {
        assert_eq!(SortOption::default(), SortOption::DateDesc);
        assert_eq!(SortOption::DateDesc.next(), SortOption::NameAsc);
        assert_eq!(SortOption::NameAsc.next(), SortOption::NameDesc);
    }
}
