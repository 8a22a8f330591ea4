use std::collections::BTreeSet;

/// Columns chosen for display and export.
///
/// Order is not tracked here; callers list the selection in dataset column
/// order through [`ColumnSelection::ordered`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSelection {
    selected: BTreeSet<String>,
}

impl ColumnSelection {
    /// Selection containing every column (the state of a freshly opened dataset).
    pub fn all<S: AsRef<str>>(columns: &[S]) -> Self {
        Self {
            selected: columns.iter().map(|c| c.as_ref().to_string()).collect(),
        }
    }

    pub fn toggle(&mut self, column: &str) {
        if !self.selected.remove(column) {
            self.selected.insert(column.to_string());
        }
    }

    /// Select every column, or deselect everything when all of `columns` are
    /// already selected.
    pub fn select_all<S: AsRef<str>>(&mut self, columns: &[S]) {
        if self.is_all(columns) {
            self.selected.clear();
        } else {
            *self = Self::all(columns);
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn is_selected(&self, column: &str) -> bool {
        self.selected.contains(column)
    }

    /// Whether the selection is exactly `columns`.
    pub fn is_all<S: AsRef<str>>(&self, columns: &[S]) -> bool {
        self.selected.len() == columns.len()
            && columns.iter().all(|c| self.selected.contains(c.as_ref()))
    }

    /// Selected columns in the order they appear in `columns`.
    pub fn ordered<S: AsRef<str>>(&self, columns: &[S]) -> Vec<String> {
        columns
            .iter()
            .map(AsRef::as_ref)
            .filter(|c| self.selected.contains(*c))
            .map(str::to_string)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: [&str; 3] = ["a", "b", "c"];

    #[test]
    fn select_all_on_full_selection_clears() {
        let mut selection = ColumnSelection::all(&COLUMNS);
        selection.select_all(&COLUMNS);
        assert!(selection.is_empty());
        assert_eq!(selection.ordered(&COLUMNS), Vec::<String>::new());
    }

    #[test]
    fn select_all_on_partial_selection_fills() {
        let mut selection = ColumnSelection::default();
        selection.toggle("b");
        selection.select_all(&COLUMNS);
        assert_eq!(selection.ordered(&COLUMNS), vec!["a", "b", "c"]);
    }

    #[test]
    fn toggle_flips_membership() {
        let mut selection = ColumnSelection::all(&COLUMNS);
        selection.toggle("b");
        assert!(!selection.is_selected("b"));
        assert_eq!(selection.ordered(&COLUMNS), vec!["a", "c"]);
        selection.toggle("b");
        assert!(selection.is_selected("b"));
        assert!(selection.is_all(&COLUMNS));
    }

    #[test]
    fn ordered_follows_column_order() {
        let mut selection = ColumnSelection::default();
        selection.toggle("c");
        selection.toggle("a");
        assert_eq!(selection.ordered(&COLUMNS), vec!["a", "c"]);
        selection.clear();
        assert_eq!(selection.len(), 0);
    }
}
