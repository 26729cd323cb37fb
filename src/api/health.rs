//! GET /health - liveness and storage check

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::time::Instant;

use crate::api::common::data;
use crate::api::middleware::{ApiError, AppState};

pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

static STARTED_AT: Lazy<Instant> = Lazy::new(Instant::now);

/// Start the uptime clock
pub fn mark_started() {
    Lazy::force(&STARTED_AT);
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub storage: String,
    pub version: &'static str,
    pub uptime_seconds: u64,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

async fn health(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    state.storage.ping().await.map_err(ApiError::internal_error)?;

    Ok(data(HealthResponse {
        status: "ok",
        storage: state.storage.driver.to_string(),
        version: APP_VERSION,
        uptime_seconds: STARTED_AT.elapsed().as_secs(),
    }))
}
