//! # Turnstile Server
//!
//! HTTP request surface for the Turnstile ticket service.
//!
//! Translates HTTP requests into allocator calls and allocator results into
//! JSON responses. All allocation logic lives in `turnstile-core`; this
//! crate only parses, validates, dispatches, and maps errors onto status
//! codes.
//!
//! # Endpoints
//!
//! - `POST /api/initialize` - create an event (admin Basic auth)
//! - `POST /api/book` - book a ticket or join the waiting list
//! - `POST /api/cancel` - cancel a booking, promoting the waiting-list head
//! - `GET /api/status/:event_id` - availability snapshot
//! - `GET /health`, `GET /ready` - liveness and readiness probes

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::Config;
pub use error::AppError;
pub use routes::build_router;
pub use state::AppState;
