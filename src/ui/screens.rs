use crate::directory::{filter_and_sort, SortOption};
use crate::models::Employee;

/// In-memory snapshot of the directory plus the derived, filtered and sorted
/// view the list renders. Mutations splice the snapshot and re-derive.
pub(crate) struct DirectoryScreen {
    pub(crate) employees: Vec<Employee>,
    pub(crate) visible: Vec<Employee>,
    pub(crate) filter: Option<String>,
    pub(crate) sort: SortOption,
    pub(crate) selected: usize,
}

impl DirectoryScreen {
    pub(crate) fn new(employees: Vec<Employee>) -> Self {
        let mut screen = Self {
            employees,
            visible: Vec::new(),
            filter: None,
            sort: SortOption::default(),
            selected: 0,
        };
        screen.apply_filter();
        screen
    }

    pub(crate) fn apply_filter(&mut self) {
        let query = self.filter.as_deref().unwrap_or("");
        self.visible = filter_and_sort(&self.employees, query, self.sort);
        self.ensure_in_bounds();
    }

    pub(crate) fn set_filter(&mut self, filter: Option<String>) {
        self.filter = filter;
        self.apply_filter();
    }

    pub(crate) fn has_search(&self) -> bool {
        self.filter
            .as_ref()
            .map(|q| !q.trim().is_empty())
            .unwrap_or(false)
    }

    pub(crate) fn cycle_sort(&mut self) -> SortOption {
        self.sort = self.sort.next();
        self.apply_filter();
        self.sort
    }

    /// Replace the snapshot after a full reload.
    pub(crate) fn set_employees(&mut self, employees: Vec<Employee>) {
        self.employees = employees;
        self.apply_filter();
    }

    /// Splice a freshly created employee into the front of the snapshot.
    pub(crate) fn prepend(&mut self, employee: Employee) {
        self.employees.insert(0, employee);
        self.apply_filter();
    }

    /// Drop an employee by id. Returns whether anything was removed.
    pub(crate) fn remove(&mut self, id: &str) -> bool {
        let before = self.employees.len();
        self.employees.retain(|employee| employee.id != id);
        let removed = self.employees.len() != before;
        if removed {
            self.apply_filter();
        }
        removed
    }

    pub(crate) fn current_employee(&self) -> Option<&Employee> {
        self.visible.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.visible.is_empty() {
            return;
        }
        let len = self.visible.len() as isize;
        let new = (self.selected as isize + offset).clamp(0, len - 1);
        self.selected = new as usize;
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        if !self.visible.is_empty() {
            self.selected = self.visible.len() - 1;
        }
    }

    fn ensure_in_bounds(&mut self) {
        if self.visible.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.visible.len() {
            self.selected = self.visible.len() - 1;
        }
    }
}
