use crate::{
    config::AppConfig,
    error::{Result, ServiceError},
    filter::FilterRequest,
    pagination::{paginate, Page, PageParams},
    pipeline::{self, IndicatorResponse},
    state::AppState,
};
use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

pub struct Server {
    config: Arc<AppConfig>,
    state: AppState,
}

impl Server {
    pub fn new(config: AppConfig) -> Self {
        let config = Arc::new(config);
        let state = AppState::new(Arc::clone(&config));
        Self { config, state }
    }

    pub fn router(&self) -> Router {
        router(self.state.clone())
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let addr = self.config.listen_addr;
        let listener = TcpListener::bind(addr).await?;
        info!(%addr, data_dir = %self.config.data_dir.display(), "indicator API listening");
        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/indicators", get(list_indicators))
        .route("/indicators/:id", get(get_indicator))
        .route("/indicators/:id/filter", get(filter_indicator))
        .route("/maps/:name", get(get_map))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Run blocking file work off the async runtime.
async fn blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .context("pipeline task failed")?
}

/// Non-numeric ids cannot have backing files.
fn parse_id(raw: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| ServiceError::NotFound(format!("indicator {} not found", raw)))
}

async fn list_indicators(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<u64>>> {
    let store = state.store.clone();
    let ids = blocking(move || store.list_ids()).await?;
    let page = paginate(&ids, params, state.config.default_limit, state.config.max_limit);
    Ok(Json(page))
}

async fn get_indicator(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<IndicatorResponse>> {
    let id = parse_id(&id)?;
    let store = state.store.clone();
    let response = blocking(move || pipeline::describe(&store, id)).await?;
    Ok(Json(response))
}

async fn filter_indicator(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<IndicatorResponse>> {
    let id = parse_id(&id)?;
    let request = FilterRequest::from_pairs(pairs);
    let store = state.store.clone();
    let output = blocking(move || pipeline::run(&store, id, &request)).await?;
    info!(
        indicator_id = id,
        kind = ?output.kind,
        applied = output.applied.len(),
        recovered = output.diagnostics.entries().len(),
        "indicator filtered"
    );
    Ok(Json(output.response))
}

async fn get_map(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse> {
    let store = state.store.clone();
    let bytes = blocking(move || store.load_map(&name)).await?;
    Ok(([(header::CONTENT_TYPE, "application/json")], bytes))
}
