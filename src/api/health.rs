//! Health check endpoints

use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router, extract::State};
use serde::Serialize;

use super::ApiState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Detailed readiness response
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    pub checks: ReadinessChecks,
}

/// Individual readiness checks
#[derive(Serialize)]
pub struct ReadinessChecks {
    pub transcription: CheckResult,
    pub generation: CheckResult,
}

/// Result of a single readiness check
#[derive(Serialize)]
pub struct CheckResult {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CheckResult {
    const fn ok() -> Self {
        Self {
            status: "ok",
            message: None,
        }
    }

    fn unavailable() -> Self {
        Self {
            status: "unavailable",
            message: Some("not configured".to_string()),
        }
    }
}

/// Liveness probe - is the service running?
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness probe - which vendor proxies can accept traffic?
///
/// An unconfigured vendor is reported but does not degrade readiness; the
/// landing page works without either key.
async fn ready(State(state): State<Arc<ApiState>>) -> Json<ReadinessResponse> {
    let transcription = if state.stt.is_some() {
        CheckResult::ok()
    } else {
        CheckResult::unavailable()
    };
    let generation = if state.generator.is_some() {
        CheckResult::ok()
    } else {
        CheckResult::unavailable()
    };

    Json(ReadinessResponse {
        status: "ok",
        checks: ReadinessChecks {
            transcription,
            generation,
        },
    })
}

/// Build health router (liveness only, no state needed)
pub fn router() -> Router {
    Router::new().route("/health", get(health))
}

/// Build readiness router (needs state for the vendor checks)
pub fn ready_router(state: Arc<ApiState>) -> Router {
    Router::new().route("/ready", get(ready)).with_state(state)
}
