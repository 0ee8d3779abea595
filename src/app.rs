use crate::browse::{BrowseController, BrowseSnapshot, FetchOutcome, FETCH_FAILED_NOTICE};
use crate::config::Config;
use crate::detail::{self, DETAIL_FAILED_NOTICE};
use crate::storage::{FileStorage, Storage};
use crate::tmdb::{self, Category, TmdbApi, TmdbClient, TmdbError};
use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{sync::Arc, time::Duration};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{error, info, warn};

const MAX_BODY_BYTES: usize = 64 * 1024;
const MISSING_KEY_NOTICE: &str = "API key not set";

#[derive(Clone)]
pub struct AppState {
    pub tmdb: Arc<dyn TmdbApi>,
    pub browse: Arc<BrowseController>,
}

impl AppState {
    pub fn new(tmdb: Arc<dyn TmdbApi>, search_debounce: Duration) -> Self {
        let browse = Arc::new(BrowseController::new(tmdb.clone(), search_debounce));
        Self { tmdb, browse }
    }
}

pub async fn run_server(config: Config) -> Result<()> {
    let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(&config.key_file));
    info!("Using key file {}", config.key_file.display());
    let client = TmdbClient::with_base_url(storage, config.tmdb_base_url.as_str())?;
    if let Some(seed) = config.seed_api_key.as_deref() {
        if client.has_api_key() {
            info!("Stored API key takes precedence over TMDB_API_KEY");
        } else {
            client.set_api_key(seed)?;
            info!("Seeded API key from TMDB_API_KEY");
        }
    }
    let tmdb: Arc<dyn TmdbApi> = Arc::new(client);
    let state = AppState::new(tmdb, config.search_debounce);

    let outcome = state.browse.refresh().await;
    info!(?outcome, "Initial browse");

    let app = build_router(state);

    info!("Listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/key", get(key_status).put(set_key).delete(clear_key))
        .route("/api/categories", get(categories))
        .route("/api/movies", get(browse_snapshot))
        .route("/api/movies/more", post(load_more))
        .route("/api/movies/:id", get(movie_detail))
        .route("/api/search", post(search))
        .route("/api/category", post(select_category))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

#[derive(Debug, Serialize)]
struct KeyStatus {
    has_key: bool,
    masked: Option<String>,
}

fn key_status_of(tmdb: &dyn TmdbApi) -> KeyStatus {
    let key = tmdb.api_key();
    KeyStatus {
        has_key: key.is_some(),
        masked: key.as_deref().map(tmdb::mask_key),
    }
}

#[derive(Debug, Deserialize)]
struct KeyInput {
    key: String,
}

#[derive(Debug, Deserialize)]
struct SearchInput {
    query: String,
}

#[derive(Debug, Deserialize)]
struct CategoryInput {
    category: String,
}

#[derive(Debug, Serialize)]
struct BrowseReply {
    outcome: FetchOutcome,
    #[serde(flatten)]
    browse: BrowseSnapshot,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn browse_response(state: &AppState, outcome: FetchOutcome) -> Response {
    match outcome {
        FetchOutcome::Superseded => {
            (StatusCode::ACCEPTED, Json(json!({ "outcome": outcome }))).into_response()
        }
        FetchOutcome::Failed => error_response(StatusCode::BAD_GATEWAY, FETCH_FAILED_NOTICE),
        FetchOutcome::Skipped if !state.tmdb.has_api_key() => {
            error_response(StatusCode::UNAUTHORIZED, MISSING_KEY_NOTICE)
        }
        _ => {
            let reply = BrowseReply {
                outcome,
                browse: state.browse.snapshot(),
            };
            (StatusCode::OK, Json(reply)).into_response()
        }
    }
}

async fn key_status(State(state): State<AppState>) -> Json<KeyStatus> {
    Json(key_status_of(state.tmdb.as_ref()))
}

async fn set_key(State(state): State<AppState>, Json(input): Json<KeyInput>) -> Response {
    if let Err(e) = state.tmdb.set_api_key(&input.key) {
        if matches!(e.downcast_ref::<TmdbError>(), Some(TmdbError::EmptyApiKey)) {
            warn!("Rejected empty API key");
            return error_response(StatusCode::BAD_REQUEST, "API key must not be empty");
        }
        error!("Failed to store API key: {:?}", e);
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to store API key");
    }
    let outcome = state.browse.refresh().await;
    (
        StatusCode::OK,
        Json(json!({
            "key": key_status_of(state.tmdb.as_ref()),
            "outcome": outcome,
        })),
    )
        .into_response()
}

async fn clear_key(State(state): State<AppState>) -> Response {
    match state.tmdb.clear_api_key() {
        Ok(()) => {
            state.browse.reset();
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => {
            error!("Failed to clear API key: {:?}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to clear API key")
        }
    }
}

async fn categories(State(state): State<AppState>) -> Json<serde_json::Value> {
    let active = state.browse.snapshot().category;
    let list: Vec<_> = Category::ALL
        .iter()
        .map(|c| {
            json!({
                "id": c.id(),
                "label": c.label(),
                "active": *c == active,
            })
        })
        .collect();
    Json(json!(list))
}

async fn browse_snapshot(State(state): State<AppState>) -> Json<BrowseSnapshot> {
    Json(state.browse.snapshot())
}

async fn load_more(State(state): State<AppState>) -> Response {
    let outcome = state.browse.load_more().await;
    browse_response(&state, outcome)
}

async fn search(State(state): State<AppState>, Json(input): Json<SearchInput>) -> Response {
    let outcome = state.browse.search(&input.query).await;
    browse_response(&state, outcome)
}

async fn select_category(
    State(state): State<AppState>,
    Json(input): Json<CategoryInput>,
) -> Response {
    let category = match input.category.parse::<Category>() {
        Ok(c) => c,
        Err(e) => {
            warn!("Rejecting category: {}", e);
            return error_response(StatusCode::BAD_REQUEST, &e.to_string());
        }
    };
    let outcome = state.browse.select_category(category).await;
    browse_response(&state, outcome)
}

async fn movie_detail(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match detail::load_movie_detail(state.tmdb.as_ref(), id).await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(e) => match e.downcast_ref::<TmdbError>() {
            Some(TmdbError::MissingApiKey) => {
                error_response(StatusCode::UNAUTHORIZED, MISSING_KEY_NOTICE)
            }
            _ => error_response(StatusCode::BAD_GATEWAY, DETAIL_FAILED_NOTICE),
        },
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        term.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
