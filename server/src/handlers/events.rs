//! Event inventory endpoints.
//!
//! - `POST /api/initialize` - Create a new event (admin only)
//! - `POST /api/book` - Book a ticket or join the waiting list
//! - `POST /api/cancel` - Cancel a booking, promoting the waiting-list head
//! - `GET /api/status/:event_id` - Availability snapshot

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use turnstile_core::{BookingOutcome, EventId, EventStatus, TicketEvent, UserId};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to create a new event.
#[derive(Debug, Deserialize)]
pub struct InitializeEventRequest {
    /// Event name
    pub name: String,
    /// Ticket capacity
    pub total_tickets: i32,
}

/// Response after creating an event.
#[derive(Debug, Serialize)]
pub struct InitializeEventResponse {
    /// The created event, including its assigned id
    pub event: TicketEvent,
    /// Success message
    pub message: String,
}

/// Request to book a ticket.
#[derive(Debug, Deserialize)]
pub struct BookTicketRequest {
    /// Target event
    pub event_id: i64,
    /// Booking user
    pub user_id: i64,
}

/// Response after a booking attempt.
#[derive(Debug, Serialize)]
pub struct BookTicketResponse {
    /// `"booked"` or `"waitlisted"`
    pub status: &'static str,
    /// Success message
    pub message: String,
}

/// Request to cancel a booking.
#[derive(Debug, Deserialize)]
pub struct CancelBookingRequest {
    /// Target event
    pub event_id: i64,
    /// User whose booking is released
    pub user_id: i64,
}

/// Response after a cancellation.
#[derive(Debug, Serialize)]
pub struct CancelBookingResponse {
    /// Success message
    pub message: String,
    /// User promoted from the waiting list into the freed seat, if any
    pub promoted_user_id: Option<UserId>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a new event.
///
/// Requires admin Basic authentication (enforced by route middleware).
///
/// # Errors
///
/// - 400 when the name is empty or the capacity is not positive
/// - 500 on storage failure
pub async fn initialize_event(
    State(state): State<AppState>,
    Json(request): Json<InitializeEventRequest>,
) -> Result<(StatusCode, Json<InitializeEventResponse>), AppError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("Event name is required"));
    }
    if request.total_tickets < 1 {
        return Err(AppError::bad_request(
            "Total tickets must be a positive integer",
        ));
    }

    let event = state.allocator.initialize(name, request.total_tickets).await?;
    Ok((
        StatusCode::CREATED,
        Json(InitializeEventResponse {
            event,
            message: "Event created successfully".to_string(),
        }),
    ))
}

/// Book a ticket for a user, or queue the user if the event is sold out.
///
/// # Errors
///
/// - 400 on non-positive identifiers
/// - 404 when the event does not exist
/// - 503 when the event row stays contended past the retry budget
pub async fn book_ticket(
    State(state): State<AppState>,
    Json(request): Json<BookTicketRequest>,
) -> Result<Json<BookTicketResponse>, AppError> {
    let event = EventId(positive_id(request.event_id, "event ID")?);
    let user = UserId(positive_id(request.user_id, "user ID")?);

    let response = match state.allocator.book(event, user).await? {
        BookingOutcome::Booked(_) => BookTicketResponse {
            status: "booked",
            message: "Ticket booked successfully".to_string(),
        },
        BookingOutcome::Waitlisted(_) => BookTicketResponse {
            status: "waitlisted",
            message: "Added to waiting list".to_string(),
        },
    };
    Ok(Json(response))
}

/// Cancel a user's booking; the longest-waiting queued user, if any, takes
/// over the freed seat.
///
/// # Errors
///
/// - 400 on non-positive identifiers
/// - 404 when the event or the booking does not exist
/// - 503 when the event row stays contended past the retry budget
pub async fn cancel_booking(
    State(state): State<AppState>,
    Json(request): Json<CancelBookingRequest>,
) -> Result<Json<CancelBookingResponse>, AppError> {
    let event = EventId(positive_id(request.event_id, "event ID")?);
    let user = UserId(positive_id(request.user_id, "user ID")?);

    let cancellation = state.allocator.cancel(event, user).await?;
    Ok(Json(CancelBookingResponse {
        message: "Booking cancelled successfully".to_string(),
        promoted_user_id: cancellation.promoted.map(|b| b.user_id),
    }))
}

/// Availability snapshot for an event.
///
/// # Errors
///
/// - 400 on a non-positive identifier
/// - 404 when the event does not exist
pub async fn get_event_status(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> Result<Json<EventStatus>, AppError> {
    let event = EventId(positive_id(event_id, "event ID")?);
    let status = state.allocator.status(event).await?;
    Ok(Json(status))
}

fn positive_id(value: i64, field: &str) -> Result<i64, AppError> {
    if value < 1 {
        return Err(AppError::bad_request(format!("Valid {field} is required")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_id_rejects_zero_and_negatives() {
        assert!(positive_id(0, "event ID").is_err());
        assert!(positive_id(-3, "user ID").is_err());
        assert_eq!(positive_id(1, "event ID").ok(), Some(1));
    }
}
