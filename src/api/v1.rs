//! Version 1 of the API.
//!
//! Deliberately thin: the ingress core only governs whether a request
//! reaches this router, not what it does. A service-info endpoint and a
//! JSON 404 fallback give the mount point real behavior to forward to.

use axum::extract::State;
use axum::http::Uri;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::AppError;
use crate::state::AppState;

/// Service information returned by `GET /api/v1`.
#[derive(Serialize)]
pub struct ServiceInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub environment: &'static str,
    pub uptime_seconds: u64,
    pub timestamp: DateTime<Utc>,
}

/// Build the v1 router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(service_info))
        .fallback(not_found)
        .with_state(state)
}

/// Service information endpoint.
async fn service_info(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.environment.as_str(),
        uptime_seconds: state.uptime_seconds(),
        timestamp: Utc::now(),
    })
}

/// JSON 404 for unknown v1 paths.
async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("no v1 route for {}", uri.path()))
}
