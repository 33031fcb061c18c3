//! # Turnstile Core
//!
//! Domain types and the ticket allocation core for Turnstile.
//!
//! This crate defines the allocation algorithm for finite-capacity event
//! ticket inventories under concurrent demand, and the storage contract it
//! runs against.
//!
//! ## Core Concepts
//!
//! - **Event**: a capacity-bounded resource being sold as tickets
//! - **Booking**: a confirmed allocation of one ticket unit to a user
//! - **Waiting list**: an ordered queue of users awaiting a freed ticket for
//!   a sold-out event
//! - **Promotion**: moving the head of the waiting list into a new booking
//!   when a ticket is freed
//!
//! ## Architecture Principles
//!
//! - Correctness comes from the storage layer's per-event row lock, not from
//!   process-local synchronization, so the allocator stays correct across
//!   multiple instances
//! - Every mutation runs inside one scoped transaction: acquire → operate →
//!   commit, with dropped transactions rolling back in full
//! - Transient storage conflicts are retried with bounded exponential
//!   backoff, transparently to the caller
//!
//! ## Example
//!
//! ```ignore
//! use turnstile_core::{TicketAllocator, BookingOutcome};
//!
//! let allocator = TicketAllocator::new(store);
//! let event = allocator.initialize("Concert", 2).await?;
//!
//! match allocator.book(event.id, user_id).await? {
//!     BookingOutcome::Booked(booking) => println!("got seat {}", booking.id),
//!     BookingOutcome::Waitlisted(entry) => println!("queued at {}", entry.created_at),
//! }
//! ```

pub mod allocator;
pub mod error;
pub mod retry;
pub mod store;
pub mod types;

pub use allocator::TicketAllocator;
pub use error::{InventoryError, Result};
pub use retry::RetryPolicy;
pub use store::{InventoryStore, InventoryTx};
pub use types::{
    Booking, BookingId, BookingOutcome, Cancellation, EventId, EventStatus, TicketEvent, UserId,
    WaitingListEntry, WaitlistEntryId,
};
