//! Health check endpoints.
//!
//! Used by load balancers and monitoring systems to verify service health.

use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

/// Readiness response body.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    /// `"ready"` or `"unavailable"`
    pub status: &'static str,
}

/// Simple liveness check.
///
/// Returns 200 OK to indicate the process is running; does NOT check
/// dependencies.
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// Readiness check: pings the database.
///
/// # Status Codes
///
/// - 200 OK: storage is reachable
/// - 503 Service Unavailable: storage ping failed
pub async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let ping = sqlx::query("SELECT 1")
        .execute(state.allocator.store().pool())
        .await;

    match ping {
        Ok(_) => (StatusCode::OK, Json(ReadyResponse { status: "ready" })),
        Err(err) => {
            tracing::error!(error = %err, "Readiness probe failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadyResponse {
                    status: "unavailable",
                }),
            )
        }
    }
}
