//! Health check endpoints
//!
//! - /health - Basic health check
//! - /health/ready - Readiness probe (pings the credential store)
//! - /health/live - Liveness probe

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<HealthChecks>,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub store: CheckStatus,
}

#[derive(Serialize)]
pub struct CheckStatus {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn response(status: &'static str, checks: Option<HealthChecks>) -> HealthResponse {
    HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        checks,
    }
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(response("healthy", None))
}

/// Returns 503 while the credential store is unreachable
pub async fn readiness_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    match state.store().ping().await {
        Ok(()) => Ok(Json(response(
            "ready",
            Some(HealthChecks {
                store: CheckStatus {
                    status: "healthy",
                    message: None,
                },
            }),
        ))),
        Err(e) => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(response(
                "not_ready",
                Some(HealthChecks {
                    store: CheckStatus {
                        status: "unhealthy",
                        message: Some(e.to_string()),
                    },
                }),
            )),
        )),
    }
}

pub async fn liveness_check() -> Json<HealthResponse> {
    Json(response("alive", None))
}
