//! Router configuration for the ticket service.

use crate::handlers::events;
use crate::handlers::health::{health_check, readiness_check};
use crate::middleware::{correlation_id_layer, require_admin};
use crate::state::AppState;
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};

/// Build the complete Axum router.
///
/// Configures health checks, the admin-gated event-creation endpoint, and
/// the public booking endpoints under `/api`, with correlation-ID tracking
/// on everything.
#[must_use]
pub fn build_router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/initialize", post(events::initialize_event))
        .route_layer(from_fn_with_state(state.clone(), require_admin));

    let public_routes = Router::new()
        .route("/book", post(events::book_ticket))
        .route("/cancel", post(events::cancel_booking))
        .route("/status/:event_id", get(events::get_event_status));

    Router::new()
        // Health checks (no authentication)
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        // API routes under /api prefix
        .nest("/api", admin_routes.merge(public_routes))
        .layer(correlation_id_layer())
        .with_state(state)
}
