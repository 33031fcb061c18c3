//! Storage contract between the allocator and its persistence gateway.
//!
//! The allocator never talks to a database directly; it drives these traits.
//! [`InventoryStore`] hands out scoped transactions and serves the lock-free
//! reads, [`InventoryTx`] is one atomic unit of work holding the exclusive
//! lock on a single event row.
//!
//! # Isolation contract
//!
//! - [`InventoryTx::lock_event`] acquires an exclusive lock on the event row
//!   that is held until the transaction commits or is dropped. Transactions
//!   against the same event are totally ordered by lock acquisition;
//!   transactions against different events must not block each other.
//! - Writes become visible to other callers only at [`InventoryTx::commit`].
//! - Dropping an uncommitted transaction discards all of its writes. There
//!   is no explicit rollback call; every early return rolls back.

use crate::error::Result;
use crate::types::{Booking, BookingId, EventId, TicketEvent, UserId, WaitingListEntry};

/// One atomic unit of work against the inventory, scoped to the event row
/// it locked.
///
/// Implementations stage or buffer writes as they like, as long as nothing
/// is observable outside the transaction before [`InventoryTx::commit`]
/// returns `Ok`.
#[allow(async_fn_in_trait)]
pub trait InventoryTx: Send {
    /// Acquire an exclusive lock on the event row and return its current
    /// state, or `None` if the event does not exist.
    ///
    /// Blocks while another transaction holds the same event's lock.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` on lock timeout or deadlock abort, `Storage` on
    /// any other failure.
    async fn lock_event(&mut self, event: EventId) -> Result<Option<TicketEvent>>;

    /// Write a new `available_tickets` value for the locked event row.
    ///
    /// The caller computes the value and has already validated it against
    /// the event's capacity.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the write fails.
    async fn set_available(&mut self, event: EventId, available: i32) -> Result<()>;

    /// Insert a booking for the user and return the stored record.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the insert fails.
    async fn insert_booking(&mut self, event: EventId, user: UserId) -> Result<Booking>;

    /// Find the oldest booking held by `user` for `event`, if any.
    ///
    /// Oldest-first makes cancellation deterministic when a user holds
    /// several bookings for the same event.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the query fails.
    async fn find_booking(&mut self, event: EventId, user: UserId) -> Result<Option<Booking>>;

    /// Delete a booking by id.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the delete fails.
    async fn delete_booking(&mut self, booking: BookingId) -> Result<()>;

    /// Append the user to the event's waiting list and return the stored
    /// entry.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the insert fails.
    async fn push_waiting(&mut self, event: EventId, user: UserId) -> Result<WaitingListEntry>;

    /// Remove and return the head of the event's waiting list: the entry
    /// with the earliest `created_at`, ties broken by lowest id.
    ///
    /// Returns `None` when nobody is queued.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the query or delete fails.
    async fn pop_waiting(&mut self, event: EventId) -> Result<Option<WaitingListEntry>>;

    /// Commit the transaction, publishing all staged writes atomically and
    /// releasing the event row lock.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the storage layer aborts the commit with a
    /// serialization failure, `Storage` otherwise. Either way nothing was
    /// published.
    async fn commit(self) -> Result<()>;
}

/// Transactional access to the event, booking, and waiting-list record sets.
#[allow(async_fn_in_trait)]
pub trait InventoryStore: Send + Sync {
    /// The scoped transaction type handed out by [`InventoryStore::begin`].
    type Tx: InventoryTx;

    /// Start a transaction. No locks are held until the transaction touches
    /// an event row.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if a transaction cannot be opened (for example the
    /// connection pool is exhausted).
    async fn begin(&self) -> Result<Self::Tx>;

    /// Insert a new event with `available_tickets` starting at
    /// `total_tickets` and return the stored record. A pure insert; no lock
    /// is taken.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the insert fails.
    async fn create_event(&self, name: &str, total_tickets: i32) -> Result<TicketEvent>;

    /// Read an event row without locking. May observe a stale but fully
    /// committed state.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the query fails.
    async fn get_event(&self, event: EventId) -> Result<Option<TicketEvent>>;

    /// Count waiting-list entries for an event without locking.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the query fails.
    async fn waiting_count(&self, event: EventId) -> Result<i64>;
}
