//! In-memory inventory store with real row-lock semantics.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use turnstile_core::error::Result;
use turnstile_core::store::{InventoryStore, InventoryTx};
use turnstile_core::types::{
    Booking, BookingId, EventId, TicketEvent, UserId, WaitingListEntry, WaitlistEntryId,
};

#[derive(Default)]
struct Tables {
    events: BTreeMap<i64, TicketEvent>,
    bookings: BTreeMap<i64, Booking>,
    waiting: BTreeMap<i64, WaitingListEntry>,
}

struct Shared {
    tables: RwLock<Tables>,
    // One async mutex per event row; owned guards make the lock span the
    // whole transaction, exactly like FOR UPDATE.
    row_locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
    next_event_id: AtomicI64,
    next_booking_id: AtomicI64,
    next_waiting_id: AtomicI64,
    fixed_time: Option<DateTime<Utc>>,
}

impl Shared {
    fn now(&self) -> DateTime<Utc> {
        self.fixed_time.unwrap_or_else(Utc::now)
    }
}

/// In-memory `InventoryStore` for tests.
///
/// Transactions on the same event serialize on a per-event async lock;
/// transactions on different events run concurrently. Writes are staged and
/// applied atomically on commit; a dropped transaction discards them.
#[derive(Clone)]
pub struct InMemoryInventory {
    shared: Arc<Shared>,
}

impl Default for InMemoryInventory {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryInventory {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Create an empty store whose records all carry the same `created_at`.
    ///
    /// Collapsing timestamps forces FIFO ordering onto the id tie-break,
    /// which is otherwise unobservable in fast tests.
    #[must_use]
    pub fn with_fixed_time(time: DateTime<Utc>) -> Self {
        Self::build(Some(time))
    }

    fn build(fixed_time: Option<DateTime<Utc>>) -> Self {
        Self {
            shared: Arc::new(Shared {
                tables: RwLock::new(Tables::default()),
                row_locks: Mutex::new(HashMap::new()),
                next_event_id: AtomicI64::new(1),
                next_booking_id: AtomicI64::new(1),
                next_waiting_id: AtomicI64::new(1),
                fixed_time,
            }),
        }
    }

    /// Committed bookings for an event, ordered by id.
    pub async fn bookings(&self, event: EventId) -> Vec<Booking> {
        let tables = self.shared.tables.read().await;
        tables
            .bookings
            .values()
            .filter(|b| b.event_id == event)
            .cloned()
            .collect()
    }

    /// Committed waiting-list entries for an event, in FIFO order.
    pub async fn waiting_list(&self, event: EventId) -> Vec<WaitingListEntry> {
        let tables = self.shared.tables.read().await;
        let mut entries: Vec<WaitingListEntry> = tables
            .waiting
            .values()
            .filter(|w| w.event_id == event)
            .cloned()
            .collect();
        entries.sort_by_key(|w| (w.created_at, w.id));
        entries
    }
}

impl InventoryStore for InMemoryInventory {
    type Tx = InMemoryInventoryTx;

    async fn begin(&self) -> Result<Self::Tx> {
        Ok(InMemoryInventoryTx {
            shared: Arc::clone(&self.shared),
            row_guard: None,
            staged: Vec::new(),
        })
    }

    async fn create_event(&self, name: &str, total_tickets: i32) -> Result<TicketEvent> {
        let event = TicketEvent {
            id: EventId(self.shared.next_event_id.fetch_add(1, Ordering::SeqCst)),
            name: name.to_string(),
            total_tickets,
            available_tickets: total_tickets,
            created_at: self.shared.now(),
        };

        let mut tables = self.shared.tables.write().await;
        tables.events.insert(event.id.0, event.clone());
        Ok(event)
    }

    async fn get_event(&self, event: EventId) -> Result<Option<TicketEvent>> {
        let tables = self.shared.tables.read().await;
        Ok(tables.events.get(&event.0).cloned())
    }

    #[allow(clippy::cast_possible_wrap)]
    async fn waiting_count(&self, event: EventId) -> Result<i64> {
        let tables = self.shared.tables.read().await;
        Ok(tables
            .waiting
            .values()
            .filter(|w| w.event_id == event)
            .count() as i64)
    }
}

enum Staged {
    SetAvailable { event: i64, available: i32 },
    InsertBooking(Booking),
    DeleteBooking(i64),
    InsertWaiting(WaitingListEntry),
    DeleteWaiting(i64),
}

/// One staged transaction over the in-memory tables.
pub struct InMemoryInventoryTx {
    shared: Arc<Shared>,
    /// Held for the transaction's lifetime; dropping it releases the row.
    #[allow(dead_code)]
    row_guard: Option<OwnedMutexGuard<()>>,
    staged: Vec<Staged>,
}

impl InventoryTx for InMemoryInventoryTx {
    async fn lock_event(&mut self, event: EventId) -> Result<Option<TicketEvent>> {
        let cell = {
            let mut locks = self.shared.row_locks.lock().await;
            Arc::clone(
                locks
                    .entry(event.0)
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };
        // Held until this transaction is committed or dropped.
        self.row_guard = Some(cell.lock_owned().await);

        let tables = self.shared.tables.read().await;
        Ok(tables.events.get(&event.0).cloned())
    }

    async fn set_available(&mut self, event: EventId, available: i32) -> Result<()> {
        self.staged.push(Staged::SetAvailable {
            event: event.0,
            available,
        });
        Ok(())
    }

    async fn insert_booking(&mut self, event: EventId, user: UserId) -> Result<Booking> {
        let booking = Booking {
            id: BookingId(self.shared.next_booking_id.fetch_add(1, Ordering::SeqCst)),
            event_id: event,
            user_id: user,
            created_at: self.shared.now(),
        };
        self.staged.push(Staged::InsertBooking(booking.clone()));
        Ok(booking)
    }

    async fn find_booking(&mut self, event: EventId, user: UserId) -> Result<Option<Booking>> {
        let tables = self.shared.tables.read().await;
        Ok(tables
            .bookings
            .values()
            .find(|b| b.event_id == event && b.user_id == user)
            .cloned())
    }

    async fn delete_booking(&mut self, booking: BookingId) -> Result<()> {
        self.staged.push(Staged::DeleteBooking(booking.0));
        Ok(())
    }

    async fn push_waiting(&mut self, event: EventId, user: UserId) -> Result<WaitingListEntry> {
        let entry = WaitingListEntry {
            id: WaitlistEntryId(self.shared.next_waiting_id.fetch_add(1, Ordering::SeqCst)),
            event_id: event,
            user_id: user,
            created_at: self.shared.now(),
        };
        self.staged.push(Staged::InsertWaiting(entry.clone()));
        Ok(entry)
    }

    async fn pop_waiting(&mut self, event: EventId) -> Result<Option<WaitingListEntry>> {
        let popped: Vec<i64> = self
            .staged
            .iter()
            .filter_map(|op| match op {
                Staged::DeleteWaiting(id) => Some(*id),
                _ => None,
            })
            .collect();

        let tables = self.shared.tables.read().await;
        let head = tables
            .waiting
            .values()
            .filter(|w| w.event_id == event && !popped.contains(&w.id.0))
            .min_by_key(|w| (w.created_at, w.id))
            .cloned();
        drop(tables);

        if let Some(entry) = &head {
            self.staged.push(Staged::DeleteWaiting(entry.id.0));
        }
        Ok(head)
    }

    async fn commit(self) -> Result<()> {
        let mut tables = self.shared.tables.write().await;
        for op in self.staged {
            match op {
                Staged::SetAvailable { event, available } => {
                    if let Some(record) = tables.events.get_mut(&event) {
                        record.available_tickets = available;
                    }
                }
                Staged::InsertBooking(booking) => {
                    tables.bookings.insert(booking.id.0, booking);
                }
                Staged::DeleteBooking(id) => {
                    tables.bookings.remove(&id);
                }
                Staged::InsertWaiting(entry) => {
                    tables.waiting.insert(entry.id.0, entry);
                }
                Staged::DeleteWaiting(id) => {
                    tables.waiting.remove(&id);
                }
            }
        }
        // Table lock released here; the row guard drops with `self`.
        Ok(())
    }
}
