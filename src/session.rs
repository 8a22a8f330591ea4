use std::collections::BTreeMap;
use std::fmt;

use crate::api::Endpoints;
use crate::data::export::{ExportError, ExportFormat, ExportPlan, build_request};
use crate::data::filter::{FilterDefinition, FilterSet, FilterStore};
use crate::data::model::{ColumnMetadata, DatasetSummary, Row};
use crate::data::predicate::filtered_indices;
use crate::data::selection::ColumnSelection;

// ---------------------------------------------------------------------------
// Session identity
// ---------------------------------------------------------------------------

/// Identifies one dataset opening. Fetch results carry the id they were
/// issued for so stale responses can be dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(u64);

impl SessionId {
    pub fn first() -> Self {
        SessionId(1)
    }

    pub fn next(self) -> Self {
        SessionId(self.0 + 1)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Popover state for a column whose filter is being edited.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterDraft {
    pub definition: FilterDefinition,
    /// Search box of the category value list.
    pub search: String,
}

// ---------------------------------------------------------------------------
// Exploration session
// ---------------------------------------------------------------------------

/// Everything known about the dataset currently being explored.
///
/// Created when a dataset is opened and dropped when another one is opened,
/// so filters, selection and rows can never outlive their dataset.
#[derive(Debug, Clone)]
pub struct ExplorationSession {
    id: SessionId,
    dataset: DatasetSummary,
    columns: Vec<ColumnMetadata>,
    rows: Vec<Row>,
    filters: FilterStore,
    selection: ColumnSelection,
    /// Indices of rows passing the current filters (cached).
    visible: Vec<usize>,
    drafts: BTreeMap<String, FilterDraft>,
    loading: bool,
}

impl ExplorationSession {
    /// A session waiting for its metadata and rows.
    pub fn new(id: SessionId, dataset: DatasetSummary) -> Self {
        Self {
            id,
            dataset,
            columns: Vec::new(),
            rows: Vec::new(),
            filters: FilterStore::new(),
            selection: ColumnSelection::default(),
            visible: Vec::new(),
            drafts: BTreeMap::new(),
            loading: true,
        }
    }

    /// Ingest fetched data; every column starts selected and unfiltered.
    pub fn load(&mut self, columns: Vec<ColumnMetadata>, rows: Vec<Row>) {
        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        self.selection = ColumnSelection::all(&names);
        self.columns = columns;
        self.rows = rows;
        self.filters.clear_all();
        self.drafts.clear();
        self.loading = false;
        self.refilter();
    }

    /// Leave the loading state without data (the fetch failed).
    pub fn fail(&mut self) {
        self.loading = false;
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn dataset(&self) -> &DatasetSummary {
        &self.dataset
    }

    pub fn columns(&self) -> &[ColumnMetadata] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnMetadata> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    // -- filtering --

    pub fn set_filter(&mut self, column: &str, definition: FilterDefinition) {
        log::debug!("Filter on '{column}': {definition}");
        self.filters.set_filter(column, definition);
        self.refilter();
    }

    pub fn clear_filter(&mut self, column: &str) {
        if self.filters.clear_filter(column) {
            log::debug!("Cleared filter on '{column}'");
        }
        self.refilter();
    }

    pub fn clear_all_filters(&mut self) {
        self.filters.clear_all();
        self.drafts.clear();
        self.refilter();
    }

    pub fn filter(&self, column: &str) -> Option<&FilterDefinition> {
        self.filters.get(column)
    }

    pub fn active_filters(&self) -> &FilterSet {
        self.filters.active_filters()
    }

    /// Recompute the visible rows after a filter change.
    pub fn refilter(&mut self) {
        self.visible = filtered_indices(&self.rows, self.filters.active_filters());
    }

    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    /// Rows passing the current filters, in fetch order.
    pub fn visible_rows(&self) -> impl Iterator<Item = &Row> + '_ {
        self.visible.iter().map(|&i| &self.rows[i])
    }

    /// The `n`-th visible row.
    pub fn visible_row(&self, n: usize) -> Option<&Row> {
        self.visible.get(n).and_then(|&i| self.rows.get(i))
    }

    // -- filter drafts --

    /// The draft for `column`, seeded from its applied filter or the default
    /// for its kind.
    pub fn draft_mut(&mut self, column: &str) -> Option<&mut FilterDraft> {
        let kind = self.column(column)?.kind;
        let applied = self.filters.get(column).cloned();
        Some(
            self.drafts
                .entry(column.to_string())
                .or_insert_with(|| FilterDraft {
                    definition: applied.unwrap_or_else(|| FilterDefinition::default_for(kind)),
                    search: String::new(),
                }),
        )
    }

    /// Promote the draft for `column` to an active filter.
    pub fn apply_draft(&mut self, column: &str) {
        if let Some(draft) = self.drafts.remove(column) {
            self.set_filter(column, draft.definition);
        }
    }

    pub fn discard_draft(&mut self, column: &str) {
        self.drafts.remove(column);
    }

    // -- column selection --

    pub fn toggle_column(&mut self, column: &str) {
        self.selection.toggle(column);
    }

    /// Select every column, or none if all are already selected.
    pub fn toggle_all_columns(&mut self) {
        let names: Vec<&str> = self.columns.iter().map(|c| c.name.as_str()).collect();
        self.selection.select_all(&names);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn is_selected(&self, column: &str) -> bool {
        self.selection.is_selected(column)
    }

    pub fn all_selected(&self) -> bool {
        self.selection.is_all(&self.column_names())
    }

    /// Selected columns in dataset order.
    pub fn visible_columns(&self) -> Vec<&ColumnMetadata> {
        self.columns
            .iter()
            .filter(|c| self.selection.is_selected(&c.name))
            .collect()
    }

    // -- export --

    /// Build the download for the selected columns.
    pub fn export_plan(
        &self,
        endpoints: &Endpoints,
        format: ExportFormat,
    ) -> Result<ExportPlan, ExportError> {
        let columns = self.selection.ordered(&self.column_names());
        build_request(
            endpoints,
            self.dataset.id,
            &self.dataset.table_name,
            format,
            columns,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{StringFilter, StringOperator};
    use crate::data::model::{CellValue, ColumnKind};

    fn session() -> ExplorationSession {
        let mut session =
            ExplorationSession::new(SessionId::first(), DatasetSummary::bare(4, "people"));
        session.load(
            vec![
                ColumnMetadata::new("name", ColumnKind::String),
                ColumnMetadata::new("age", ColumnKind::Number),
            ],
            vec![
                Row::from([
                    ("name".to_string(), CellValue::String("Alice".into())),
                    ("age".to_string(), CellValue::Integer(30)),
                ]),
                Row::from([
                    ("name".to_string(), CellValue::String("Bob".into())),
                    ("age".to_string(), CellValue::Integer(25)),
                ]),
            ],
        );
        session
    }

    #[test]
    fn load_selects_everything_and_shows_all_rows() {
        let session = session();
        assert!(!session.is_loading());
        assert!(session.all_selected());
        assert_eq!(session.visible_count(), 2);
    }

    #[test]
    fn drafts_do_not_filter_until_applied() {
        let mut session = session();
        let draft = session.draft_mut("name").unwrap();
        draft.definition = FilterDefinition::String(StringFilter {
            operator: StringOperator::StartsWith,
            value: "b".into(),
        });
        assert_eq!(session.visible_count(), 2);

        session.apply_draft("name");
        assert_eq!(session.visible_count(), 1);
        assert_eq!(
            session.visible_row(0).unwrap()["name"],
            CellValue::String("Bob".into())
        );

        // Reopening the popover starts from the applied filter.
        let reopened = session.draft_mut("name").unwrap();
        assert!(matches!(reopened.definition, FilterDefinition::String(ref f) if f.value == "b"));

        session.clear_filter("name");
        assert_eq!(session.visible_count(), 2);
    }

    #[test]
    fn drafts_need_a_known_column() {
        let mut session = session();
        assert!(session.draft_mut("missing").is_none());
    }

    #[test]
    fn export_uses_dataset_order() {
        let mut session = session();
        let endpoints = Endpoints::new("http://localhost:8000").unwrap();
        session.toggle_column("name");
        session.toggle_column("name");
        let plan = session.export_plan(&endpoints, ExportFormat::Csv).unwrap();
        assert_eq!(plan.request.columns, vec!["name", "age"]);
        assert_eq!(plan.suggested_filename, "people.csv");

        session.toggle_all_columns();
        assert!(matches!(
            session.export_plan(&endpoints, ExportFormat::Csv),
            Err(ExportError::EmptySelection)
        ));
    }

    #[test]
    fn session_ids_increase() {
        let first = SessionId::first();
        assert!(first.next() > first);
        assert_eq!(first.next().to_string(), "#2");
    }
}
