//! HTTP surface: the dashboard page, a refresh action, and a JSON view.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    response::{Html, Redirect},
    routing::{get, post},
};
use serde_json::{Value, json};
use tracing::info;

use crate::{
    pipeline::{DashboardState, Pipeline},
    present::{PageOptions, render_page},
};

/// Shared application state, passed to all route handlers via `axum::extract::State`.
pub struct AppState {
    pub pipeline: Pipeline,
    pub page: PageOptions,
}

impl AppState {
    pub fn new(pipeline: Pipeline, page: PageOptions) -> Arc<Self> {
        Arc::new(Self { pipeline, page })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/refresh", post(refresh))
        .route("/api/snapshot", get(snapshot))
        .route("/health", get(health))
        .with_state(state)
}

async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    let dashboard = state.pipeline.load().await;
    Html(render_page(&dashboard, &state.page))
}

async fn refresh(State(state): State<Arc<AppState>>) -> Redirect {
    info!("manual refresh requested");
    state.pipeline.force_refresh().await;
    Redirect::to("/")
}

async fn snapshot(State(state): State<Arc<AppState>>) -> Json<DashboardState> {
    Json(state.pipeline.load().await)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
