use crate::error::LookupError;
use crate::loader::parse_catalog;
use crate::record::{Catalog, SortField, SortSpec};
use crate::view::{LookupView, derive_view};
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// Published spreadsheet feed the catalog is read from
pub const CATALOG_URL: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vSnPrAvOhT7AcVwFJkoiXb-p8DqlfkSoGQXpRHxjs_iB9ooOSZKKd6JvGBSO6nuKSSrkSmTswAtDHsJ/pub?output=csv&gid=0";

/// Where the catalog text comes from
#[derive(Clone, Debug, PartialEq)]
pub enum CatalogSource {
    Remote(String),
    File(PathBuf),
}

impl CatalogSource {
    /// `http://` and `https://` locations are fetched, anything else is a path
    pub fn parse(location: &str) -> Self {
        let lower = location.to_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            CatalogSource::Remote(location.to_string())
        } else {
            CatalogSource::File(PathBuf::from(location))
        }
    }
}

impl Default for CatalogSource {
    fn default() -> Self {
        CatalogSource::Remote(CATALOG_URL.to_string())
    }
}

impl std::fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogSource::Remote(url) => write!(f, "{}", url),
            CatalogSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Outcome of one load attempt, shared by everyone waiting on it
pub type LoadOutcome = Result<Arc<Catalog>, Arc<LookupError>>;

#[derive(Default)]
struct LoadState {
    catalog: Option<Arc<Catalog>>,
    in_flight: Option<watch::Receiver<Option<LoadOutcome>>>,
    error: Option<String>,
}

enum Attempt {
    Loaded(Arc<Catalog>),
    Pending(watch::Receiver<Option<LoadOutcome>>),
}

/// Snapshot of the loader for status displays
#[derive(Serialize, Debug, Clone)]
pub struct CatalogStatus {
    pub loaded: bool,
    pub loading: bool,
    pub error: Option<String>,
    pub records: usize,
    pub loaded_at: Option<DateTime<Utc>>,
}

/// One-shot catalog loader
///
/// At most one fetch is in flight at any time. Every caller that arrives
/// while it runs gets that attempt's outcome, success or failure. Once a
/// catalog is loaded it is kept for the life of the loader; after a failure
/// nothing is retried until the next trigger.
pub struct CatalogLoader {
    source: CatalogSource,
    client: reqwest::Client,
    state: Arc<Mutex<LoadState>>,
}

impl CatalogLoader {
    pub fn new(source: CatalogSource) -> Self {
        CatalogLoader {
            source,
            client: reqwest::Client::new(),
            state: Arc::new(Mutex::new(LoadState::default())),
        }
    }

    pub fn source(&self) -> &CatalogSource {
        &self.source
    }

    /// Start a load in the background unless one is loaded or running
    ///
    /// Must be called from inside a tokio runtime. Returns `true` while a
    /// fetch is in flight after the call.
    pub fn trigger(&self) -> bool {
        matches!(self.attempt(), Attempt::Pending(_))
    }

    /// Load the catalog unless it is already loaded
    ///
    /// Joins the in-flight attempt when there is one.
    ///
    /// # Returns
    /// * `LoadOutcome` - The session catalog, or the reason the attempt failed
    pub async fn load(&self) -> LoadOutcome {
        match self.attempt() {
            Attempt::Loaded(catalog) => Ok(catalog),
            Attempt::Pending(rx) => wait_outcome(rx).await,
        }
    }

    /// Wait for the in-flight attempt, if any, to finish
    pub async fn settled(&self) {
        let pending = self.state().in_flight.clone();
        if let Some(rx) = pending {
            let _ = wait_outcome(rx).await;
        }
    }

    /// The catalog if a load has completed
    pub fn catalog(&self) -> Option<Arc<Catalog>> {
        self.state().catalog.clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.state().catalog.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.state().in_flight.is_some()
    }

    /// User-facing message from the last failed load, if any
    pub fn error(&self) -> Option<String> {
        self.state().error.clone()
    }

    pub fn status(&self) -> CatalogStatus {
        let state = self.state();
        CatalogStatus {
            loaded: state.catalog.is_some(),
            loading: state.in_flight.is_some(),
            error: state.error.clone(),
            records: state.catalog.as_ref().map(|c| c.len()).unwrap_or(0),
            loaded_at: state.catalog.as_ref().map(|c| c.loaded_at),
        }
    }

    fn state(&self) -> MutexGuard<'_, LoadState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn attempt(&self) -> Attempt {
        let mut state = self.state();
        if let Some(catalog) = &state.catalog {
            return Attempt::Loaded(Arc::clone(catalog));
        }
        if let Some(rx) = &state.in_flight {
            return Attempt::Pending(rx.clone());
        }

        let (tx, rx) = watch::channel(None);
        state.in_flight = Some(rx.clone());
        state.error = None;
        drop(state);

        info!("loading catalog from {}", self.source);
        let source = self.source.clone();
        let client = self.client.clone();
        let shared = Arc::clone(&self.state);

        tokio::spawn(async move {
            let outcome = fetch_catalog(&client, &source).await.map(Arc::new).map_err(Arc::new);

            {
                let mut state = shared.lock().unwrap_or_else(PoisonError::into_inner);
                state.in_flight = None;
                match &outcome {
                    Ok(catalog) => {
                        info!("catalog loaded with {} records", catalog.len());
                        state.catalog = Some(Arc::clone(catalog));
                    }
                    Err(e) => {
                        warn!("catalog load from {} failed: {}", source, e);
                        state.error = Some(e.user_message());
                    }
                }
            }

            // waiters may all be gone
            let _ = tx.send(Some(outcome));
        });

        Attempt::Pending(rx)
    }
}

async fn wait_outcome(mut rx: watch::Receiver<Option<LoadOutcome>>) -> LoadOutcome {
    let outcome = rx
        .wait_for(Option::is_some)
        .await
        .ok()
        .and_then(|seen| seen.clone());

    outcome.unwrap_or_else(|| {
        Err(Arc::new(LookupError::Fetch(
            "catalog load was abandoned".to_string(),
        )))
    })
}

async fn fetch_catalog(
    client: &reqwest::Client,
    source: &CatalogSource,
) -> Result<Catalog, LookupError> {
    let text = match source {
        CatalogSource::Remote(url) => fetch_text(client, url).await?,
        CatalogSource::File(path) => tokio::fs::read_to_string(path).await?,
    };

    Ok(Catalog::new(parse_catalog(&text)?))
}

/// GET a document as text, treating any non-2xx status as a failure
pub async fn fetch_text(client: &reqwest::Client, url: &str) -> Result<String, LookupError> {
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        return Err(LookupError::Fetch(format!(
            "HTTP error! status: {}",
            response.status()
        )));
    }

    Ok(response.text().await?)
}

/// Query and sort state for one user of the lookup
#[derive(Debug, Clone, Default)]
pub struct LookupSession {
    query: String,
    sort: SortSpec,
}

impl LookupSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(query: &str, sort: SortSpec) -> Self {
        LookupSession {
            query: query.to_string(),
            sort,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn sort(&self) -> SortSpec {
        self.sort
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
    }

    /// Apply a column header click
    pub fn toggle_sort(&mut self, field: SortField) {
        self.sort = self.sort.toggle(field);
    }

    /// True when the query asks for a catalog that has not been loaded yet
    pub fn needs_load(&self, loader: &CatalogLoader) -> bool {
        !self.query.trim().is_empty() && !loader.is_loaded()
    }

    /// Set the query and start the catalog load on first use
    ///
    /// Never waits for the fetch: while it runs the returned view is
    /// [`LookupView::Loading`]. Load failures show up as the error view.
    pub fn search(&mut self, loader: &CatalogLoader, query: &str) -> LookupView {
        self.set_query(query);
        if self.needs_load(loader) {
            loader.trigger();
        }
        self.view(loader)
    }

    /// Current presentation state
    pub fn view(&self, loader: &CatalogLoader) -> LookupView {
        let catalog = loader.catalog();
        let records = catalog.as_ref().map(|c| c.records.as_slice()).unwrap_or(&[]);
        derive_view(
            loader.is_loading(),
            loader.error().as_deref(),
            &self.query,
            records,
            self.sort,
        )
    }
}
