//! # Turnstile Testing
//!
//! Test doubles for the Turnstile allocation core.
//!
//! This crate provides [`InMemoryInventory`], an in-memory implementation of
//! the `InventoryStore` contract with the same isolation semantics as the
//! `PostgreSQL` gateway: per-event asynchronous row locks, staged writes that
//! only become visible on commit, and id sequences that never reuse values
//! burned by a rolled-back transaction.
//!
//! The allocator behavior, concurrency, and property suites in this crate's
//! `tests/` directory run against it at memory speed.
//!
//! ## Example
//!
//! ```ignore
//! use turnstile_core::{TicketAllocator, UserId};
//! use turnstile_testing::InMemoryInventory;
//!
//! #[tokio::test]
//! async fn books_until_sold_out() {
//!     let allocator = TicketAllocator::new(InMemoryInventory::new());
//!     let event = allocator.initialize("Concert", 1).await.unwrap();
//!
//!     assert!(allocator.book(event.id, UserId(1)).await.unwrap().is_booked());
//!     assert!(!allocator.book(event.id, UserId(2)).await.unwrap().is_booked());
//! }
//! ```

mod inventory;

pub use inventory::InMemoryInventory;
