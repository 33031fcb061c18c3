//! sqlx-backed implementation of the inventory storage contract.

use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, Postgres};
use sqlx::Transaction;
use std::time::Duration;
use turnstile_core::error::{InventoryError, Result};
use turnstile_core::store::{InventoryStore, InventoryTx};
use turnstile_core::types::{
    Booking, BookingId, EventId, TicketEvent, UserId, WaitingListEntry, WaitlistEntryId,
};

/// Connection pool settings.
///
/// Field-for-field subset of the service configuration; see
/// `Config::from_env` in the server crate for the environment variables
/// behind them.
#[derive(Debug, Clone)]
pub struct PgSettings {
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of idle connections in the pool
    pub min_connections: u32,
    /// Seconds to wait for a free connection before failing
    pub acquire_timeout: u64,
    /// Seconds a connection may sit idle before being closed
    pub idle_timeout: u64,
}

impl Default for PgSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 2,
            acquire_timeout: 30,
            idle_timeout: 600,
        }
    }
}

/// `PostgreSQL` inventory store.
///
/// Cloning is cheap; the underlying pool is shared.
#[derive(Clone)]
pub struct PostgresInventory {
    pool: PgPool,
}

impl PostgresInventory {
    /// Wrap an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with default pool settings.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the database is unreachable.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with(url, &PgSettings::default()).await
    }

    /// Connect with explicit pool settings.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the database is unreachable.
    pub async fn connect_with(url: &str, settings: &PgSettings) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(Duration::from_secs(settings.acquire_timeout))
            .idle_timeout(Duration::from_secs(settings.idle_timeout))
            .connect(url)
            .await
            .map_err(map_sqlx_err)?;

        Ok(Self { pool })
    }

    /// Run embedded database migrations.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if migrations fail.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| InventoryError::Storage(format!("migration failed: {e}")))?;
        tracing::info!("Database migrations applied");
        Ok(())
    }

    /// Access the underlying pool (used by the readiness probe).
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl InventoryStore for PostgresInventory {
    type Tx = PostgresInventoryTx;

    async fn begin(&self) -> Result<Self::Tx> {
        let tx = self.pool.begin().await.map_err(map_sqlx_err)?;
        Ok(PostgresInventoryTx { tx })
    }

    async fn create_event(&self, name: &str, total_tickets: i32) -> Result<TicketEvent> {
        let row: EventRow = sqlx::query_as(
            "INSERT INTO events (name, total_tickets, available_tickets) \
             VALUES ($1, $2, $2) \
             RETURNING id, name, total_tickets, available_tickets, created_at",
        )
        .bind(name)
        .bind(total_tickets)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(event_from_row(row))
    }

    async fn get_event(&self, event: EventId) -> Result<Option<TicketEvent>> {
        let row: Option<EventRow> = sqlx::query_as(
            "SELECT id, name, total_tickets, available_tickets, created_at \
             FROM events WHERE id = $1",
        )
        .bind(event.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(row.map(event_from_row))
    }

    async fn waiting_count(&self, event: EventId) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM waiting_list WHERE event_id = $1")
            .bind(event.0)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_err)
    }
}

/// One database transaction, holding the `FOR UPDATE` lock on the event row
/// it touched. Dropping it without [`InventoryTx::commit`] rolls back.
pub struct PostgresInventoryTx {
    tx: Transaction<'static, Postgres>,
}

impl InventoryTx for PostgresInventoryTx {
    async fn lock_event(&mut self, event: EventId) -> Result<Option<TicketEvent>> {
        let row: Option<EventRow> = sqlx::query_as(
            "SELECT id, name, total_tickets, available_tickets, created_at \
             FROM events WHERE id = $1 FOR UPDATE",
        )
        .bind(event.0)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx_err)?;

        Ok(row.map(event_from_row))
    }

    async fn set_available(&mut self, event: EventId, available: i32) -> Result<()> {
        sqlx::query("UPDATE events SET available_tickets = $2, updated_at = now() WHERE id = $1")
            .bind(event.0)
            .bind(available)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn insert_booking(&mut self, event: EventId, user: UserId) -> Result<Booking> {
        let row: BookingRow = sqlx::query_as(
            "INSERT INTO bookings (event_id, user_id) VALUES ($1, $2) \
             RETURNING id, event_id, user_id, created_at",
        )
        .bind(event.0)
        .bind(user.0)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_sqlx_err)?;

        Ok(booking_from_row(row))
    }

    async fn find_booking(&mut self, event: EventId, user: UserId) -> Result<Option<Booking>> {
        let row: Option<BookingRow> = sqlx::query_as(
            "SELECT id, event_id, user_id, created_at FROM bookings \
             WHERE event_id = $1 AND user_id = $2 \
             ORDER BY id LIMIT 1",
        )
        .bind(event.0)
        .bind(user.0)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx_err)?;

        Ok(row.map(booking_from_row))
    }

    async fn delete_booking(&mut self, booking: BookingId) -> Result<()> {
        sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(booking.0)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn push_waiting(&mut self, event: EventId, user: UserId) -> Result<WaitingListEntry> {
        let row: WaitingRow = sqlx::query_as(
            "INSERT INTO waiting_list (event_id, user_id) VALUES ($1, $2) \
             RETURNING id, event_id, user_id, created_at",
        )
        .bind(event.0)
        .bind(user.0)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_sqlx_err)?;

        Ok(waiting_from_row(row))
    }

    async fn pop_waiting(&mut self, event: EventId) -> Result<Option<WaitingListEntry>> {
        // Head = earliest created_at, ties broken by lowest id.
        let row: Option<WaitingRow> = sqlx::query_as(
            "DELETE FROM waiting_list WHERE id = ( \
                 SELECT id FROM waiting_list WHERE event_id = $1 \
                 ORDER BY created_at ASC, id ASC LIMIT 1 \
             ) RETURNING id, event_id, user_id, created_at",
        )
        .bind(event.0)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx_err)?;

        Ok(row.map(waiting_from_row))
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await.map_err(map_sqlx_err)
    }
}

type EventRow = (i64, String, i32, i32, DateTime<Utc>);
type BookingRow = (i64, i64, i64, DateTime<Utc>);
type WaitingRow = (i64, i64, i64, DateTime<Utc>);

fn event_from_row((id, name, total_tickets, available_tickets, created_at): EventRow) -> TicketEvent {
    TicketEvent {
        id: EventId(id),
        name,
        total_tickets,
        available_tickets,
        created_at,
    }
}

fn booking_from_row((id, event_id, user_id, created_at): BookingRow) -> Booking {
    Booking {
        id: BookingId(id),
        event_id: EventId(event_id),
        user_id: UserId(user_id),
        created_at,
    }
}

fn waiting_from_row((id, event_id, user_id, created_at): WaitingRow) -> WaitingListEntry {
    WaitingListEntry {
        id: WaitlistEntryId(id),
        event_id: EventId(event_id),
        user_id: UserId(user_id),
        created_at,
    }
}

/// Map sqlx failures onto the domain taxonomy.
///
/// SQLSTATE 40001 (serialization failure), 40P01 (deadlock detected) and
/// 55P03 (lock not available) roll back cleanly and are retryable; anything
/// else is a plain storage error.
fn map_sqlx_err(err: sqlx::Error) -> InventoryError {
    if let sqlx::Error::Database(db) = &err {
        if let Some(code) = db.code() {
            if matches!(code.as_ref(), "40001" | "40P01" | "55P03") {
                return InventoryError::Conflict(db.message().to_string());
            }
        }
    }
    InventoryError::Storage(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_map_to_storage() {
        let err = map_sqlx_err(sqlx::Error::RowNotFound);
        assert!(matches!(err, InventoryError::Storage(_)));
        assert!(!err.is_retryable());
    }
}
