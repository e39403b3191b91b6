use std::sync::Arc;

use crate::chart::{Page, PageContext, PageView, DEFAULT_SCATTER_SELECTION};
use crate::data::filter::{filtered_indices, YearRange};
use crate::data::model::{HousingRecord, HousingTable, Metric};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded table, shared with the load cache.
    pub table: Arc<HousingTable>,

    /// Page selected in the sidebar.
    pub page: Page,

    /// Selected year range (`None` only for an empty table).
    pub year_range: Option<YearRange>,

    /// Indices of rows inside `year_range` (cached).
    pub visible_indices: Vec<usize>,

    /// Variables chosen on the scatter matrix page, in pick order.
    pub scatter_selection: Vec<Metric>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(table: Arc<HousingTable>) -> Self {
        let mut state = Self {
            table: Arc::new(HousingTable::from_records(Vec::new())),
            page: Page::default(),
            year_range: None,
            visible_indices: Vec::new(),
            scatter_selection: DEFAULT_SCATTER_SELECTION.to_vec(),
            status_message: None,
        };
        state.set_table(table);
        state
    }

    /// Ingest a newly loaded table and reset the range to its full span.
    pub fn set_table(&mut self, table: Arc<HousingTable>) {
        self.year_range = YearRange::full(&table);
        self.status_message = table.is_empty().then(|| "The loaded file has no rows.".to_string());
        self.table = table;
        self.refilter();
    }

    pub fn set_page(&mut self, page: Page) {
        if page != self.page {
            log::debug!("Switching page: {} → {}", self.page, page);
            self.page = page;
        }
    }

    /// Distinct years available to the range selector.
    pub fn years(&self) -> &[i32] {
        self.table.years()
    }

    /// Set the range; bounds are reordered if given backwards.
    pub fn set_year_bounds(&mut self, start: i32, end: i32) {
        let range = YearRange::new(start, end);
        if self.year_range != Some(range) {
            self.year_range = Some(range);
            self.refilter();
        }
    }

    /// Recompute `visible_indices` after a range or table change.
    pub fn refilter(&mut self) {
        self.visible_indices = match self.year_range {
            Some(range) => filtered_indices(&self.table, range),
            None => Vec::new(),
        };
    }

    pub fn filtered_records(&self) -> Vec<&HousingRecord> {
        let records = self.table.records();
        self.visible_indices.iter().map(|&i| &records[i]).collect()
    }

    /// Add or remove a scatter matrix variable.
    pub fn toggle_scatter_variable(&mut self, metric: Metric) {
        if let Some(pos) = self.scatter_selection.iter().position(|m| *m == metric) {
            self.scatter_selection.remove(pos);
        } else {
            self.scatter_selection.push(metric);
        }
    }

    /// Build the chart specification for the current page.
    pub fn current_view(&self) -> PageView {
        let rows = self.filtered_records();
        let ctx = PageContext {
            table: &self.table,
            rows: &rows,
            scatter_selection: &self.scatter_selection,
        };
        self.page.build(&ctx)
    }
}
