//! PostgreSQL inventory gateway for Turnstile.
//!
//! This crate implements the `InventoryStore`/`InventoryTx` contract from
//! `turnstile-core` on top of `PostgreSQL`, using sqlx. Concurrency
//! correctness comes from the database's row-level locking: every mutating
//! transaction takes `SELECT ... FOR UPDATE` on the targeted event row, so
//! the design stays correct across multiple service instances sharing one
//! database.
//!
//! # Example
//!
//! ```ignore
//! use turnstile_postgres::PostgresInventory;
//! use turnstile_core::TicketAllocator;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = PostgresInventory::connect("postgres://localhost/turnstile").await?;
//!     store.migrate().await?;
//!     let allocator = TicketAllocator::new(store);
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod store;

pub use store::{PgSettings, PostgresInventory, PostgresInventoryTx};
