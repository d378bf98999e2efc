use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};

use anyhow::Result;

use crate::color::Theme;
use crate::data::aggregate::DashboardAggregates;
use crate::data::loader::load_file;
use crate::data::model::{Dataset, Record};
use crate::data::table::{self, SortDirection, SortSpec, TablePage, TableQuery, display_columns, source_columns};
use crate::export::pdf::{self, ReportMeta};
use crate::export::{ExportError, ExportScope, csv};

// ---------------------------------------------------------------------------
// View state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Dashboard,
    DataTable,
}

/// The user's current selection. Transitions consume the value and return
/// the next one; nothing mutates it in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub search: String,
    pub sort: Option<SortSpec>,
    /// 1-based page of the table.
    pub page: usize,
    pub page_size: usize,
    pub tab: Tab,
    pub theme: Theme,
}

impl ViewState {
    pub fn new(page_size: usize, theme: Theme) -> Self {
        ViewState {
            search: String::new(),
            sort: None,
            page: 1,
            page_size: page_size.max(1),
            tab: Tab::default(),
            theme,
        }
    }

    /// The part of the view the table depends on.
    pub fn table_query(&self) -> TableQuery {
        TableQuery {
            search: self.search.clone(),
            sort: self.sort.clone(),
            page: self.page,
            page_size: self.page_size,
        }
    }

    /// New search term; goes back to the first page.
    pub fn with_search(self, search: impl Into<String>) -> Self {
        ViewState {
            search: search.into(),
            page: 1,
            ..self
        }
    }

    /// Clicking a header: a new column sorts ascending, the active column
    /// flips direction. Goes back to the first page.
    pub fn with_sort_toggled(self, column: &str) -> Self {
        let direction = match &self.sort {
            Some(s) if s.column == column => s.direction.toggled(),
            _ => SortDirection::Ascending,
        };
        ViewState {
            sort: Some(SortSpec {
                column: column.to_string(),
                direction,
            }),
            page: 1,
            ..self
        }
    }

    /// Jump to `page`, clamped to `[1, total_pages]`.
    pub fn with_page(self, page: usize, total_pages: usize) -> Self {
        ViewState {
            page: page.clamp(1, total_pages.max(1)),
            ..self
        }
    }

    pub fn next_page(self, total_pages: usize) -> Self {
        let page = self.page.saturating_add(1);
        self.with_page(page, total_pages)
    }

    pub fn prev_page(self, total_pages: usize) -> Self {
        let page = self.page.saturating_sub(1);
        self.with_page(page, total_pages)
    }

    pub fn with_tab(self, tab: Tab) -> Self {
        ViewState { tab, ..self }
    }

    pub fn with_theme_toggled(self) -> Self {
        ViewState {
            theme: self.theme.toggled(),
            ..self
        }
    }
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState::new(table::DEFAULT_PAGE_SIZE, Theme::default())
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Progress of the one dataset load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading(PathBuf),
    Ready,
    Failed(String),
}

/// The full UI state, independent of rendering.
pub struct AppState {
    pub load: LoadState,

    /// Loaded dataset (None until a load succeeds).
    pub dataset: Option<Dataset>,

    /// Dashboard series, derived once per dataset.
    pub aggregates: Option<DashboardAggregates>,

    /// Current table page, derived from the dataset and `view`.
    pub table: TablePage,

    pub view: ViewState,

    /// Ranked charts show this many entries.
    pub top_n: usize,

    pub export_scope: ExportScope,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    pending: Option<Receiver<Result<Dataset>>>,
}

impl AppState {
    pub fn new(view: ViewState, top_n: usize) -> Self {
        AppState {
            load: LoadState::Ready,
            dataset: None,
            aggregates: None,
            table: TablePage::default(),
            view,
            top_n,
            export_scope: ExportScope::default(),
            status_message: None,
            pending: None,
        }
    }

    /// Parse `path` on a worker thread; [`AppState::poll_load`] picks up the
    /// result.
    pub fn start_load(&mut self, path: &Path) {
        let (tx, rx) = mpsc::channel();
        let owned = path.to_path_buf();
        std::thread::spawn(move || {
            // The receiver is gone only if the app has shut down.
            let _ = tx.send(load_file(&owned));
        });
        log::info!("Loading {}", path.display());
        self.load = LoadState::Loading(path.to_path_buf());
        self.pending = Some(rx);
    }

    /// Install the load result once the worker has finished. Returns true
    /// when the state changed.
    pub fn poll_load(&mut self) -> bool {
        let Some(rx) = &self.pending else {
            return false;
        };
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Disconnected) => Err(anyhow::anyhow!("loader thread exited")),
        };
        self.pending = None;
        match result {
            Ok(dataset) => self.set_dataset(dataset),
            Err(e) => self.set_load_error(&e),
        }
        true
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.load, LoadState::Loading(_))
    }

    /// Ingest a newly loaded dataset: derive the aggregates and the first
    /// table page.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        if dataset.is_empty() {
            log::warn!("Dataset has a header but no records");
        }
        self.aggregates = Some(DashboardAggregates::compute(&dataset, self.top_n));
        self.view = ViewState {
            page: 1,
            ..self.view.clone()
        };
        self.table = table::view(&dataset, &self.view.table_query());
        self.dataset = Some(dataset);
        self.load = LoadState::Ready;
        self.status_message = None;
    }

    /// Record a failed load. A dataset that is already shown stays in place.
    pub fn set_load_error(&mut self, err: &anyhow::Error) {
        log::error!("Failed to load dataset: {err:#}");
        if self.dataset.is_some() {
            self.load = LoadState::Ready;
            self.status_message = Some(format!("Error: {err:#}"));
        } else {
            self.load = LoadState::Failed(format!("{err:#}"));
        }
    }

    /// Apply a view transition. The table page is only rebuilt when the
    /// search, sort or page actually changed.
    pub fn update_view(&mut self, transition: impl FnOnce(ViewState) -> ViewState) {
        let next = transition(self.view.clone());
        let rebuild = next.table_query() != self.view.table_query();
        self.view = next;
        if rebuild {
            self.refresh_table();
        }
    }

    fn refresh_table(&mut self) {
        if let Some(ds) = &self.dataset {
            self.table = table::view(ds, &self.view.table_query());
        }
    }

    /// Rows covered by an export, in display order.
    pub fn export_rows(&self, scope: ExportScope) -> Vec<&Record> {
        let Some(ds) = &self.dataset else {
            return Vec::new();
        };
        match scope {
            ExportScope::CurrentPage => table::rows(ds, &self.table.rows),
            ExportScope::AllMatching => table::rows(ds, &self.table.matching),
        }
    }

    /// CSV of the exported rows with every source column.
    pub fn table_csv(&self, scope: ExportScope) -> Result<String, ExportError> {
        let columns = self
            .dataset
            .as_ref()
            .map(source_columns)
            .unwrap_or_else(display_columns);
        csv::to_csv(&self.export_rows(scope), &columns)
    }

    pub fn table_pdf(&self, scope: ExportScope, meta: &ReportMeta) -> Result<Vec<u8>, ExportError> {
        pdf::table_report(&self.export_rows(scope), &display_columns(), meta)
    }

    /// `None` until a dataset is loaded.
    pub fn dashboard_pdf(&self, meta: &ReportMeta) -> Option<Result<Vec<u8>, ExportError>> {
        self.aggregates
            .as_ref()
            .map(|agg| pdf::dashboard_report(agg, meta))
    }
}

impl Default for AppState {
    fn default() -> Self {
        AppState::new(ViewState::default(), crate::data::aggregate::TOP_N)
    }
}
