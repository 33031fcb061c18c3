//! Domain types for ticket inventory allocation.
//!
//! Value objects and records shared by the allocator, the storage gateways,
//! and the request surface. Identifiers are storage-assigned integers
//! wrapped in newtypes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(pub i64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a user.
///
/// Users are managed outside this system; the allocator only correlates
/// bookings and waiting-list entries to them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a booking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BookingId(pub i64);

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a waiting-list entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WaitlistEntryId(pub i64);

impl fmt::Display for WaitlistEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Records
// ============================================================================

/// A capacity-bounded event being sold as tickets.
///
/// `available_tickets` is owned by the event row and stays within
/// `0..=total_tickets` at every committed state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketEvent {
    /// Storage-assigned identifier
    pub id: EventId,
    /// Human-readable event name
    pub name: String,
    /// Capacity the event was created with
    pub total_tickets: i32,
    /// Tickets still open for immediate booking
    pub available_tickets: i32,
    /// When the event was created
    pub created_at: DateTime<Utc>,
}

impl TicketEvent {
    /// Whether at least one ticket is open for immediate booking.
    #[must_use]
    pub const fn has_capacity(&self) -> bool {
        self.available_tickets > 0
    }
}

/// A confirmed allocation of one ticket unit to a user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Storage-assigned identifier
    pub id: BookingId,
    /// Event the ticket belongs to
    pub event_id: EventId,
    /// User holding the ticket
    pub user_id: UserId,
    /// When the booking was made
    pub created_at: DateTime<Utc>,
}

/// A user queued for a sold-out event.
///
/// Entries are promoted in FIFO order: `created_at` ascending, ties broken
/// by `id` ascending.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitingListEntry {
    /// Storage-assigned identifier
    pub id: WaitlistEntryId,
    /// Event the user is queued for
    pub event_id: EventId,
    /// Queued user
    pub user_id: UserId,
    /// When the user joined the queue
    pub created_at: DateTime<Utc>,
}

/// Point-in-time snapshot of an event's availability.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventStatus {
    /// Event identifier
    pub event_id: EventId,
    /// Event name
    pub name: String,
    /// Tickets open for immediate booking at read time
    pub available_tickets: i32,
    /// Number of queued users at read time
    pub waiting_list_count: i64,
}

// ============================================================================
// Operation results
// ============================================================================

/// Result of a booking attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingOutcome {
    /// A ticket was available and is now held by the user.
    Booked(Booking),
    /// The event is sold out; the user joined the waiting list.
    Waitlisted(WaitingListEntry),
}

impl BookingOutcome {
    /// Whether the outcome consumed a ticket.
    #[must_use]
    pub const fn is_booked(&self) -> bool {
        matches!(self, Self::Booked(_))
    }
}

/// Result of a cancellation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cancellation {
    /// The booking that was released.
    pub cancelled: Booking,
    /// The booking created for the promoted waiting-list head, if anyone
    /// was queued. When set, the freed seat was reassigned inside the same
    /// transaction and availability is unchanged.
    pub promoted: Option<Booking>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn has_capacity_reflects_counter() {
        let mut event = TicketEvent {
            id: EventId(1),
            name: "Concert".to_string(),
            total_tickets: 2,
            available_tickets: 2,
            created_at: Utc::now(),
        };
        assert!(event.has_capacity());

        event.available_tickets = 0;
        assert!(!event.has_capacity());
    }

    #[test]
    fn ids_serialize_as_plain_integers() {
        let json = serde_json::to_string(&EventId(42)).unwrap();
        assert_eq!(json, "42");
    }
}
