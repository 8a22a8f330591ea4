use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crate::api::{ApiError, DataDockClient};
use crate::config::Config;
use crate::data::export::ExportFormat;
use crate::data::model::{ColumnMetadata, DatasetSummary, Row, SearchHit};
use crate::session::{ExplorationSession, SessionId};

/// Called by workers after posting a result so the UI wakes up.
pub type Waker = Arc<dyn Fn() + Send + Sync>;

// ---------------------------------------------------------------------------
// Worker results
// ---------------------------------------------------------------------------

/// Result of a background request.
#[derive(Debug)]
pub enum FetchOutcome {
    Datasets(Result<Vec<DatasetSummary>, ApiError>),
    Dataset {
        session: SessionId,
        metadata: Result<Vec<ColumnMetadata>, ApiError>,
        rows: Result<Vec<Row>, ApiError>,
    },
    Search {
        query: String,
        result: Result<Vec<SearchHit>, ApiError>,
    },
    Download {
        session: SessionId,
        filename: String,
        result: Result<Vec<u8>, ApiError>,
    },
}

/// A finished download waiting for the user to pick a destination.
#[derive(Debug, Clone)]
pub struct PendingSave {
    pub filename: String,
    pub bytes: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: u64,
    pub level: NotificationLevel,
    pub message: String,
    created: Instant,
}

/// Dismissible messages that expire after a fixed time.
#[derive(Debug)]
pub struct Notifications {
    items: Vec<Notification>,
    ttl: Duration,
    next_id: u64,
}

impl Notifications {
    pub fn new(ttl: Duration) -> Self {
        Self {
            items: Vec::new(),
            ttl,
            next_id: 0,
        }
    }

    pub fn push(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.next_id += 1;
        self.items.push(Notification {
            id: self.next_id,
            level,
            message: message.into(),
            created: Instant::now(),
        });
    }

    pub fn dismiss(&mut self, id: u64) {
        self.items.retain(|n| n.id != id);
    }

    /// Drop notifications older than the time-to-live.
    pub fn expire(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.items
            .retain(|n| now.saturating_duration_since(n.created) < ttl);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: Config,
    client: DataDockClient,

    /// Public catalogue.
    pub datasets: Vec<DatasetSummary>,
    pub datasets_loading: bool,

    pub search_query: String,
    /// `None` until a search has completed.
    pub search_results: Option<Vec<SearchHit>>,
    pub searching: bool,

    /// The dataset being explored.
    pub session: Option<ExplorationSession>,
    last_session: Option<SessionId>,

    pub export_format: ExportFormat,
    pub downloading: bool,
    pub pending_save: Option<PendingSave>,

    pub notifications: Notifications,

    tx: Sender<FetchOutcome>,
    rx: Receiver<FetchOutcome>,
    waker: Waker,
}

impl AppState {
    pub fn new(config: Config, waker: Waker) -> Result<Self, ApiError> {
        let client = DataDockClient::new(&config)?;
        let (tx, rx) = mpsc::channel();
        Ok(Self {
            notifications: Notifications::new(Duration::from_secs(config.notification_secs)),
            export_format: config.default_export_format,
            config,
            client,
            datasets: Vec::new(),
            datasets_loading: false,
            search_query: String::new(),
            search_results: None,
            searching: false,
            session: None,
            last_session: None,
            downloading: false,
            pending_save: None,
            tx,
            rx,
            waker,
        })
    }

    /// Run `job` on a worker thread and deliver its outcome to [`AppState::poll`].
    fn spawn<F>(&self, job: F)
    where
        F: FnOnce(&DataDockClient) -> FetchOutcome + Send + 'static,
    {
        let client = self.client.clone();
        let tx = self.tx.clone();
        let waker = Arc::clone(&self.waker);
        thread::spawn(move || {
            let outcome = job(&client);
            // The receiver only goes away when the app shuts down.
            if tx.send(outcome).is_ok() {
                waker();
            }
        });
    }

    // -- requests --

    pub fn refresh_datasets(&mut self) {
        self.datasets_loading = true;
        log::info!("Fetching public dataset catalogue");
        self.spawn(|client| FetchOutcome::Datasets(client.list_datasets()));
    }

    /// Replace the current session with a fresh one for `dataset`.
    pub(crate) fn begin_session(&mut self, dataset: DatasetSummary) -> SessionId {
        let id = self.last_session.map_or_else(SessionId::first, SessionId::next);
        self.last_session = Some(id);
        self.downloading = false;
        self.pending_save = None;
        self.session = Some(ExplorationSession::new(id, dataset));
        id
    }

    pub fn open_dataset(&mut self, dataset: DatasetSummary) {
        let dataset_id = dataset.id;
        log::info!("Opening dataset {} ({})", dataset_id, dataset.table_name);
        let session = self.begin_session(dataset);
        self.spawn(move |client| FetchOutcome::Dataset {
            session,
            metadata: client.fetch_metadata(dataset_id),
            rows: client.fetch_rows(dataset_id),
        });
    }

    pub fn close_dataset(&mut self) {
        self.session = None;
        self.downloading = false;
        self.pending_save = None;
    }

    pub fn search(&mut self) {
        let query = self.search_query.trim().to_string();
        if query.is_empty() {
            self.notifications
                .push(NotificationLevel::Warning, "Type a term to search for");
            return;
        }
        self.searching = true;
        log::info!("Searching public datasets for '{query}'");
        self.spawn(move |client| FetchOutcome::Search {
            result: client.search(&query),
            query,
        });
    }

    /// Validate the selection and start downloading the export.
    pub fn start_download(&mut self) {
        let Some(session) = &self.session else {
            return;
        };
        let plan = match session.export_plan(self.client.endpoints(), self.export_format) {
            Ok(plan) => plan,
            Err(e) => {
                log::warn!("Export refused: {e}");
                self.notifications
                    .push(NotificationLevel::Warning, ApiError::from(e).user_message());
                return;
            }
        };

        let session = session.id();
        self.downloading = true;
        self.spawn(move |client| FetchOutcome::Download {
            session,
            filename: plan.suggested_filename.clone(),
            result: client.download(&plan),
        });
    }

    /// Write a finished download to `path`.
    pub fn save_download(&mut self, pending: PendingSave, path: &Path) {
        match std::fs::write(path, &pending.bytes) {
            Ok(()) => {
                log::info!("Saved {} bytes to {}", pending.bytes.len(), path.display());
                self.notifications.push(
                    NotificationLevel::Success,
                    format!("File {} saved", pending.filename),
                );
            }
            Err(e) => {
                log::error!("Failed to save {}: {e}", path.display());
                self.notifications.push(
                    NotificationLevel::Error,
                    format!("Could not save {}: {e}", pending.filename),
                );
            }
        }
    }

    // -- results --

    /// Apply every outcome delivered since the last frame.
    pub fn poll(&mut self) {
        while let Ok(outcome) = self.rx.try_recv() {
            self.handle(outcome);
        }
        self.notifications.expire(Instant::now());
    }

    pub fn handle(&mut self, outcome: FetchOutcome) {
        match outcome {
            FetchOutcome::Datasets(result) => {
                self.datasets_loading = false;
                match result {
                    Ok(datasets) => {
                        log::info!("Loaded {} public datasets", datasets.len());
                        self.datasets = datasets;
                    }
                    Err(e) => self.report("Failed to load datasets", &e),
                }
            }
            FetchOutcome::Dataset {
                session,
                metadata,
                rows,
            } => self.handle_dataset(session, metadata, rows),
            FetchOutcome::Search { query, result } => {
                self.searching = false;
                match result {
                    Ok(hits) => {
                        log::info!("Search '{query}' matched {} datasets", hits.len());
                        if hits.is_empty() {
                            self.notifications
                                .push(NotificationLevel::Info, "No results found");
                        }
                        self.search_results = Some(hits);
                    }
                    Err(e) => {
                        self.search_results = Some(Vec::new());
                        self.report("Search failed", &e);
                    }
                }
            }
            FetchOutcome::Download {
                session,
                filename,
                result,
            } => {
                if !self.is_current(session) {
                    log::debug!("Dropping download {filename} from stale session {session}");
                    return;
                }
                self.downloading = false;
                match result {
                    Ok(bytes) => self.pending_save = Some(PendingSave { filename, bytes }),
                    Err(e) => self.report("Download failed", &e),
                }
            }
        }
    }

    fn handle_dataset(
        &mut self,
        id: SessionId,
        metadata: Result<Vec<ColumnMetadata>, ApiError>,
        rows: Result<Vec<Row>, ApiError>,
    ) {
        if !self.is_current(id) {
            log::debug!("Dropping dataset response for stale session {id}");
            return;
        }

        let (columns, rows) = match (metadata, rows) {
            (Ok(columns), Ok(rows)) if !columns.is_empty() => (Some(columns), Some(rows)),
            (Ok(_), Ok(rows)) => (None, Some(rows)),
            (Err(e), Ok(rows)) => {
                self.report("Column metadata unavailable, inferring types", &e);
                (None, Some(rows))
            }
            (Ok(columns), Err(e)) => {
                self.report("Failed to load dataset rows", &e);
                (Some(columns), None)
            }
            (Err(meta_err), Err(rows_err)) => {
                log::error!("Metadata request failed as well: {meta_err}");
                self.report("Failed to load dataset", &rows_err);
                (None, None)
            }
        };

        let Some(session) = self.session.as_mut() else {
            return;
        };
        match (columns, rows) {
            (Some(columns), rows) => session.load(columns, rows.unwrap_or_default()),
            (None, Some(rows)) => {
                let columns = ColumnMetadata::infer_from_rows(&rows);
                session.load(columns, rows);
            }
            (None, None) => session.fail(),
        }
        log::info!(
            "Session {id}: {} rows, {} columns",
            session.rows().len(),
            session.columns().len()
        );
    }

    fn is_current(&self, id: SessionId) -> bool {
        self.session.as_ref().is_some_and(|s| s.id() == id)
    }

    fn report(&mut self, context: &str, err: &ApiError) {
        log::error!("{context}: {err}");
        self.notifications
            .push(NotificationLevel::Error, format!("{context}: {}", err.user_message()));
    }
}
