//! Health check endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
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

/// Per-provider readiness checks
#[derive(Serialize)]
pub struct ReadinessChecks {
    pub transcription: CheckResult,
    pub translation: CheckResult,
    pub synthesis: CheckResult,
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

    fn configured(present: bool) -> Self {
        if present {
            Self::ok()
        } else {
            Self::unavailable()
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

/// Readiness probe - which relays are configured?
async fn ready(State(state): State<Arc<ApiState>>) -> Json<ReadinessResponse> {
    Json(ReadinessResponse {
        status: "ok",
        checks: ReadinessChecks {
            transcription: CheckResult::configured(state.transcriber.is_some()),
            translation: CheckResult::configured(state.translator.is_some()),
            synthesis: CheckResult::configured(state.synthesizer.is_some()),
        },
    })
}

/// Build the liveness router
pub fn router() -> Router {
    Router::new().route("/health", get(health))
}

/// Build the readiness router
pub fn ready_router(state: Arc<ApiState>) -> Router {
    Router::new().route("/ready", get(ready)).with_state(state)
}
