//! The ticket allocator: atomic decrement-or-waitlist booking and
//! release-and-promote cancellation.
//!
//! All allocation decisions live here; the storage gateway only moves rows.
//! Each mutating operation is one scoped transaction holding the exclusive
//! lock on the targeted event row, so under arbitrary concurrent callers the
//! number of committed bookings never exceeds capacity and waiting-list
//! promotion follows strict FIFO order.

use crate::error::{InventoryError, Result};
use crate::retry::{RetryPolicy, retry_if};
use crate::store::{InventoryStore, InventoryTx};
use crate::types::{BookingOutcome, Cancellation, EventId, EventStatus, TicketEvent, UserId};

/// Ticket allocator over a storage gateway.
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
///
/// # Example
///
/// ```ignore
/// let allocator = TicketAllocator::new(PostgresInventory::connect(&cfg).await?);
/// let event = allocator.initialize("Concert", 100).await?;
/// let outcome = allocator.book(event.id, UserId(1)).await?;
/// ```
#[derive(Debug, Clone)]
pub struct TicketAllocator<S> {
    store: S,
    retry: RetryPolicy,
}

impl<S: InventoryStore> TicketAllocator<S> {
    /// Create an allocator with the default conflict-retry policy.
    pub fn new(store: S) -> Self {
        Self {
            store,
            retry: RetryPolicy::default(),
        }
    }

    /// Create an allocator with a custom conflict-retry policy.
    pub const fn with_retry(store: S, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    /// Access the underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Create a new event with `total_tickets` open for booking.
    ///
    /// A pure insert; input constraints (non-empty name, positive capacity)
    /// are enforced by the request surface before this call.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the insert fails.
    pub async fn initialize(&self, name: &str, total_tickets: i32) -> Result<TicketEvent> {
        let event = self.store.create_event(name, total_tickets).await?;
        tracing::info!(
            event_id = %event.id,
            name = %event.name,
            total_tickets = event.total_tickets,
            "Event created"
        );
        Ok(event)
    }

    /// Book one ticket for `user`, or queue the user if the event is sold
    /// out.
    ///
    /// Runs as a single transaction under the event row lock. Transient
    /// storage conflicts are retried with backoff before surfacing.
    ///
    /// # Errors
    ///
    /// - `EventNotFound` if the event does not exist
    /// - `Conflict` once the retry budget is exhausted
    /// - `InvariantViolation` if the stored counters are already corrupt
    pub async fn book(&self, event: EventId, user: UserId) -> Result<BookingOutcome> {
        let outcome = retry_if(
            &self.retry,
            || self.try_book(event, user),
            InventoryError::is_retryable,
        )
        .await?;

        match &outcome {
            BookingOutcome::Booked(booking) => {
                tracing::info!(event_id = %event, user_id = %user, booking_id = %booking.id, "Ticket booked");
            }
            BookingOutcome::Waitlisted(entry) => {
                tracing::info!(event_id = %event, user_id = %user, entry_id = %entry.id, "Added to waiting list");
            }
        }
        Ok(outcome)
    }

    /// Cancel `user`'s oldest booking for `event` and promote the head of
    /// the waiting list into the freed seat, if anyone is queued.
    ///
    /// Serializes on the same event row lock as [`TicketAllocator::book`],
    /// so the freed seat is reassigned before any other transaction can
    /// observe it as spare.
    ///
    /// # Errors
    ///
    /// - `EventNotFound` if the event does not exist
    /// - `BookingNotFound` if the user holds no booking for the event
    /// - `Conflict` once the retry budget is exhausted
    /// - `InvariantViolation` if releasing the seat would push the counter
    ///   past capacity
    pub async fn cancel(&self, event: EventId, user: UserId) -> Result<Cancellation> {
        let cancellation = retry_if(
            &self.retry,
            || self.try_cancel(event, user),
            InventoryError::is_retryable,
        )
        .await?;

        tracing::info!(
            event_id = %event,
            user_id = %user,
            booking_id = %cancellation.cancelled.id,
            "Booking cancelled"
        );
        if let Some(promoted) = &cancellation.promoted {
            tracing::info!(
                event_id = %event,
                user_id = %promoted.user_id,
                booking_id = %promoted.id,
                "Ticket reassigned from waiting list"
            );
        }
        Ok(cancellation)
    }

    /// Point-in-time snapshot of an event's availability and queue length.
    ///
    /// Lock-free; may observe a stale but fully committed state.
    ///
    /// # Errors
    ///
    /// Returns `EventNotFound` if the event does not exist, `Storage` if a
    /// read fails.
    pub async fn status(&self, event: EventId) -> Result<EventStatus> {
        let record = self
            .store
            .get_event(event)
            .await?
            .ok_or(InventoryError::EventNotFound(event))?;
        let waiting_list_count = self.store.waiting_count(event).await?;

        Ok(EventStatus {
            event_id: record.id,
            name: record.name,
            available_tickets: record.available_tickets,
            waiting_list_count,
        })
    }

    async fn try_book(&self, event: EventId, user: UserId) -> Result<BookingOutcome> {
        let mut tx = self.store.begin().await?;
        let record = tx
            .lock_event(event)
            .await?
            .ok_or(InventoryError::EventNotFound(event))?;

        let outcome = if record.has_capacity() {
            let remaining = checked_available(&record, record.available_tickets - 1)?;
            tx.set_available(event, remaining).await?;
            BookingOutcome::Booked(tx.insert_booking(event, user).await?)
        } else {
            BookingOutcome::Waitlisted(tx.push_waiting(event, user).await?)
        };

        tx.commit().await?;
        Ok(outcome)
    }

    async fn try_cancel(&self, event: EventId, user: UserId) -> Result<Cancellation> {
        let mut tx = self.store.begin().await?;
        let record = tx
            .lock_event(event)
            .await?
            .ok_or(InventoryError::EventNotFound(event))?;

        let booking = tx
            .find_booking(event, user)
            .await?
            .ok_or(InventoryError::BookingNotFound { event, user })?;
        tx.delete_booking(booking.id).await?;
        let freed = checked_available(&record, record.available_tickets + 1)?;

        // Reassign the freed seat before anyone can observe it as spare.
        let promoted = match tx.pop_waiting(event).await? {
            Some(head) => {
                let promotion = tx.insert_booking(event, head.user_id).await?;
                tx.set_available(event, freed - 1).await?;
                Some(promotion)
            }
            None => {
                tx.set_available(event, freed).await?;
                None
            }
        };

        tx.commit().await?;
        Ok(Cancellation {
            cancelled: booking,
            promoted,
        })
    }
}

/// Validate that a computed availability stays within the event's capacity.
///
/// Failing this check means the stored counters were already inconsistent
/// with the locking protocol; the transaction is dropped (rolled back) by
/// the `?` at the call site.
fn checked_available(event: &TicketEvent, available: i32) -> Result<i32> {
    if available < 0 || available > event.total_tickets {
        return Err(InventoryError::InvariantViolation {
            event: event.id,
            available,
            total: event.total_tickets,
        });
    }
    Ok(available)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn event(available: i32, total: i32) -> TicketEvent {
        TicketEvent {
            id: EventId(1),
            name: "Concert".to_string(),
            total_tickets: total,
            available_tickets: available,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn checked_available_accepts_full_range() {
        let e = event(1, 2);
        assert_eq!(checked_available(&e, 0), Ok(0));
        assert_eq!(checked_available(&e, 2), Ok(2));
    }

    #[test]
    fn checked_available_rejects_negative() {
        let e = event(0, 2);
        assert_eq!(
            checked_available(&e, -1),
            Err(InventoryError::InvariantViolation {
                event: EventId(1),
                available: -1,
                total: 2,
            })
        );
    }

    #[test]
    fn checked_available_rejects_over_capacity() {
        let e = event(2, 2);
        assert_eq!(
            checked_available(&e, 3),
            Err(InventoryError::InvariantViolation {
                event: EventId(1),
                available: 3,
                total: 2,
            })
        );
    }
}
