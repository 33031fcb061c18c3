//! Application state shared across HTTP handlers.

use crate::config::AdminConfig;
use std::sync::Arc;
use turnstile_core::TicketAllocator;
use turnstile_postgres::PostgresInventory;

/// Application state shared across all HTTP handlers.
///
/// Cloned (cheaply via `Arc`) for each request.
#[derive(Clone)]
pub struct AppState {
    /// The ticket allocator over the `PostgreSQL` gateway
    pub allocator: Arc<TicketAllocator<PostgresInventory>>,
    /// Admin credentials for the event-creation endpoint
    pub admin: Arc<AdminConfig>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(allocator: Arc<TicketAllocator<PostgresInventory>>, admin: AdminConfig) -> Self {
        Self {
            allocator,
            admin: Arc::new(admin),
        }
    }
}
