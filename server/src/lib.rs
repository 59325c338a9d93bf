use anyhow::Result;
use axum::{extract::State, http::{HeaderMap, HeaderValue, StatusCode}, routing::{get, post}, Json, Router};
use dnf::{Condition, IndexHandle, SearchConfig, SearchError, Searcher};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod corpus;

#[derive(Deserialize)]
pub struct SearchRequest {
    /// Missing is the same as empty and is rejected by validation.
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub documents: Vec<u32>,
    pub total_hits: usize,
    pub generation: u64,
    pub took_s: f64,
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Clone)]
pub struct AppState {
    pub corpus_path: PathBuf,
    pub searcher: Arc<Searcher>,
    pub admin_token: Option<String>,
}

type ApiError = (StatusCode, Json<ErrorBody>);

impl AppState {
    /// Load the corpus and start a searcher over it.
    pub fn load(corpus_path: PathBuf, config: SearchConfig, admin_token: Option<String>) -> Result<Self> {
        let snapshot = corpus::load_snapshot(&corpus_path)?;
        let handle = Arc::new(IndexHandle::new(snapshot));
        let searcher = Arc::new(Searcher::new(handle, config)?);
        Ok(Self { corpus_path, searcher, admin_token })
    }
}

pub fn build_app(corpus_path: PathBuf, config: SearchConfig) -> Result<Router> {
    let state = AppState::load(corpus_path, config, std::env::var("ADMIN_TOKEN").ok())?;
    Ok(router(state))
}

pub fn router(state: AppState) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let origins: Vec<HeaderValue> = std::env::var("CORS_ALLOW_ORIGIN")
        .unwrap_or_default()
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();
    let cors = if origins.is_empty() {
        CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
    } else {
        CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", post(search_handler))
        .route("/index/reload", post(reload_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

pub async fn search_handler(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let searcher = state.searcher.clone();
    // Predicate evaluation blocks on the searcher's own pool.
    let (generation, result) = tokio::task::spawn_blocking(move || {
        let snapshot = searcher.index().snapshot();
        let result = searcher.search_in(&snapshot, &req.conditions, time::OffsetDateTime::now_utc());
        (snapshot.generation, result)
    })
    .await
    .map_err(|e| error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    match result {
        Ok(documents) => Ok(Json(SearchResponse {
            total_hits: documents.len(),
            documents,
            generation,
            took_s: start.elapsed().as_secs_f64(),
        })),
        Err(e) => Err(error(status_for(&e), e.to_string())),
    }
}

async fn reload_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(&state, &headers)?;
    let path = state.corpus_path.clone();
    let snapshot = tokio::task::spawn_blocking(move || corpus::load_snapshot(&path))
        .await
        .map_err(|e| error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(|e| error(StatusCode::UNPROCESSABLE_ENTITY, format!("{e:#}")))?;
    let installed = state.searcher.index().publish(snapshot);
    Ok(Json(serde_json::json!({ "generation": installed.generation })))
}

fn status_for(err: &SearchError) -> StatusCode {
    match err {
        e if e.is_invalid_query() => StatusCode::BAD_REQUEST,
        SearchError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error(status: StatusCode, msg: String) -> ApiError {
    (status, Json(ErrorBody { error: msg }))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(required) = &state.admin_token else {
        return Err(error(StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into()));
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err(error(StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}
