//! Error types for HTTP handlers.
//!
//! Bridges the allocator's domain errors onto HTTP responses via Axum's
//! `IntoResponse` trait.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;
use turnstile_core::InventoryError;

/// Application error type for web handlers.
///
/// Wraps domain errors with an HTTP status and a stable machine-readable
/// code, keeping internal details out of client responses.
///
/// # Examples
///
/// ```ignore
/// async fn handler() -> Result<Json<Data>, AppError> {
///     let status = state.allocator.status(event_id).await?;
///     Ok(Json(status))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: String,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: String) -> Self {
        Self {
            status,
            message,
            code,
            source: None,
        }
    }

    /// Attach a source error for logging.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            message.into(),
            "BAD_REQUEST".to_string(),
        )
    }

    /// Create a 401 Unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            message.into(),
            "UNAUTHORIZED".to_string(),
        )
    }

    /// Create a 404 Not Found error.
    #[must_use]
    pub fn not_found(resource: impl fmt::Display, id: impl fmt::Display) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            format!("{resource} with id {id} not found"),
            "NOT_FOUND".to_string(),
        )
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message.into(),
            "INTERNAL_SERVER_ERROR".to_string(),
        )
    }

    /// Create a 503 Service Unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            message.into(),
            "SERVICE_UNAVAILABLE".to_string(),
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Map allocator failures onto HTTP semantics.
///
/// NotFound kinds → 404; exhausted conflict retries → 503 (the request is
/// safe to repeat); invariant violations and storage failures → 500 with
/// the detail kept server-side.
impl From<InventoryError> for AppError {
    fn from(err: InventoryError) -> Self {
        match &err {
            InventoryError::EventNotFound(event) => Self::not_found("Event", event),
            InventoryError::BookingNotFound { event, user } => Self::new(
                StatusCode::NOT_FOUND,
                format!("No booking for user {user} on event {event}"),
                "NOT_FOUND".to_string(),
            ),
            InventoryError::Conflict(_) => {
                Self::unavailable("The event is busy, please retry the request")
                    .with_source(anyhow::Error::new(err))
            }
            InventoryError::InvariantViolation { .. } => {
                Self::internal("Ticket accounting inconsistency detected")
                    .with_source(anyhow::Error::new(err))
            }
            InventoryError::Storage(_) => {
                Self::internal("An internal error occurred").with_source(anyhow::Error::new(err))
            }
        }
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: String,
    /// Human-readable error message.
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log internal errors with their source detail
        if self.status.is_server_error() {
            tracing::error!(
                status = %self.status,
                code = %self.code,
                message = %self.message,
                error = ?self.source,
                "Request failed"
            );
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turnstile_core::{EventId, UserId};

    #[test]
    fn display_includes_code_and_message() {
        let err = AppError::bad_request("Valid event ID is required");
        assert_eq!(err.to_string(), "[BAD_REQUEST] Valid event ID is required");
    }

    #[test]
    fn event_not_found_maps_to_404() {
        let err = AppError::from(InventoryError::EventNotFound(EventId(7)));
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, "NOT_FOUND");
    }

    #[test]
    fn booking_not_found_maps_to_404() {
        let err = AppError::from(InventoryError::BookingNotFound {
            event: EventId(7),
            user: UserId(3),
        });
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "No booking for user 3 on event 7");
    }

    #[test]
    fn conflicts_map_to_503() {
        let err = AppError::from(InventoryError::Conflict("deadlock detected".to_string()));
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn invariant_violations_map_to_500() {
        let err = AppError::from(InventoryError::InvariantViolation {
            event: EventId(1),
            available: -1,
            total: 2,
        });
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
