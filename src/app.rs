use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::config::LookupConfig;
use crate::downloader;
use crate::engine::{CatalogLoader, LookupSession};
use crate::record::{SortField, SortSpec};
use crate::view::{SEARCH_SUGGESTIONS, SEARCH_TIPS};

pub struct AppState {
    loader: Arc<CatalogLoader>,
}

#[derive(Deserialize)]
pub struct LookupQuery {
    q: Option<String>,
    sort: Option<String>,
    asc: Option<bool>,
}

impl LookupQuery {
    fn session(&self) -> Result<LookupSession, String> {
        let field = match self.sort.as_deref() {
            Some(name) => SortField::from_name(name)
                .ok_or_else(|| format!("Unknown sort field: {}", name))?,
            None => SortSpec::default().field,
        };
        let sort = SortSpec::new(field, self.asc.unwrap_or(true));
        Ok(LookupSession::with_state(self.q.as_deref().unwrap_or(""), sort))
    }
}

#[derive(Serialize)]
struct ReloadResponse {
    status: String,
    message: Option<String>,
}

/// Build the API router around a shared loader
pub fn router(loader: Arc<CatalogLoader>) -> Router {
    let app_state = Arc::new(AppState { loader });

    Router::new()
        .route("/api/lookup", get(lookup))
        .route("/api/export", get(export))
        .route("/api/status", get(status))
        .route("/api/reload", post(reload))
        .route("/api/help", get(help))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

pub async fn run(config: LookupConfig) -> Result<(), Box<dyn std::error::Error>> {
    let loader = Arc::new(CatalogLoader::new(config.source.clone()));
    let app = router(loader);

    // Start server
    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!("catalog source: {}", config.source);
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

fn parse_session(params: &LookupQuery) -> Result<LookupSession, (StatusCode, String)> {
    params
        .session()
        .map_err(|message| (StatusCode::BAD_REQUEST, message))
}

// Answers right away; the first real query starts the catalog fetch and
// reports `loading` until it finishes. After a failure the error view is
// served until POST /api/reload.
async fn lookup(
    Query(params): Query<LookupQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let session = match parse_session(&params) {
        Ok(session) => session,
        Err(rejection) => return rejection.into_response(),
    };

    if state.loader.error().is_none() && session.needs_load(&state.loader) {
        state.loader.trigger();
    }
    Json(session.view(&state.loader)).into_response()
}

// A download has nothing useful to return mid-load, so this one waits
async fn export(
    Query(params): Query<LookupQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let session = match parse_session(&params) {
        Ok(session) => session,
        Err(rejection) => return rejection.into_response(),
    };

    if session.needs_load(&state.loader) {
        // failures are kept on the loader and the export comes back empty
        let _ = state.loader.load().await;
    }

    let view = session.view(&state.loader);
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
        downloader::to_csv(view.items()),
    )
        .into_response()
}

async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.loader.status())
}

async fn reload(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.loader.load().await {
        Ok(catalog) => Json(ReloadResponse {
            status: "ok".to_string(),
            message: Some(format!("{} records loaded", catalog.len())),
        }),
        Err(e) => Json(ReloadResponse {
            status: "error".to_string(),
            message: Some(e.user_message()),
        }),
    }
}

async fn help() -> impl IntoResponse {
    Json(serde_json::json!({
        "tips": SEARCH_TIPS,
        "suggestions": SEARCH_SUGGESTIONS,
    }))
}
