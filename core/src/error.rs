//! Error types for ticket inventory operations.

use crate::types::{EventId, UserId};
use thiserror::Error;

/// Result type alias for inventory operations.
pub type Result<T> = std::result::Result<T, InventoryError>;

/// Error taxonomy for the ticket allocator and its storage gateways.
///
/// Expected failures (`EventNotFound`, `BookingNotFound`) are returned to the
/// caller as typed results and never retried. `Conflict` is transient and
/// retried by the allocator before surfacing. `InvariantViolation` indicates
/// a logic or locking defect and is never recovered.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InventoryError {
    /// No event exists for the given identifier.
    #[error("event {0} not found")]
    EventNotFound(EventId),

    /// No booking exists for the given (event, user) pair.
    #[error("no booking for user {user} on event {event}")]
    BookingNotFound {
        /// Event the cancellation targeted
        event: EventId,
        /// User the cancellation targeted
        user: UserId,
    },

    /// The storage layer reported lock contention, a deadlock abort, or a
    /// serialization failure. The transaction rolled back in full and can
    /// safely be retried.
    #[error("storage conflict: {0}")]
    Conflict(String),

    /// A counter update would leave `available_tickets` outside
    /// `0..=total_tickets`. This must never happen while the locking
    /// protocol is followed; it is surfaced unmodified and aborts the
    /// operation.
    #[error(
        "ticket accounting out of range for event {event}: available {available} of {total}"
    )]
    InvariantViolation {
        /// Event whose counters are inconsistent
        event: EventId,
        /// The availability value that failed validation
        available: i32,
        /// The event's capacity
        total: i32,
    },

    /// Any other storage failure (connection loss, malformed row, ...).
    #[error("storage error: {0}")]
    Storage(String),
}

impl InventoryError {
    /// Whether retrying the whole transaction may succeed.
    ///
    /// Only [`InventoryError::Conflict`] qualifies: the storage layer rolled
    /// back a lock- or serialization-level abort and left no partial state.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_conflicts_are_retryable() {
        assert!(InventoryError::Conflict("lock timeout".to_string()).is_retryable());
        assert!(!InventoryError::EventNotFound(EventId(7)).is_retryable());
        assert!(
            !InventoryError::BookingNotFound {
                event: EventId(7),
                user: UserId(3),
            }
            .is_retryable()
        );
        assert!(
            !InventoryError::InvariantViolation {
                event: EventId(7),
                available: -1,
                total: 5,
            }
            .is_retryable()
        );
        assert!(!InventoryError::Storage("connection reset".to_string()).is_retryable());
    }

    #[test]
    fn display_includes_identifiers() {
        let err = InventoryError::BookingNotFound {
            event: EventId(12),
            user: UserId(34),
        };
        assert_eq!(err.to_string(), "no booking for user 34 on event 12");
    }
}
