//! Allocator behavior tests against the in-memory gateway.
//!
//! Covers the booking/cancellation scenarios, the FIFO promotion law, and
//! the capacity accounting invariants.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]

use chrono::{TimeZone, Utc};
use turnstile_core::{
    BookingOutcome, EventId, InventoryError, InventoryStore, TicketAllocator, UserId,
};
use turnstile_testing::InMemoryInventory;

fn allocator() -> TicketAllocator<InMemoryInventory> {
    TicketAllocator::new(InMemoryInventory::new())
}

/// Check `available + bookings == total` and `0 <= available <= total`.
async fn assert_accounting(allocator: &TicketAllocator<InMemoryInventory>, event: EventId) {
    let record = allocator
        .store()
        .get_event(event)
        .await
        .unwrap()
        .expect("event exists");
    let booked = allocator.store().bookings(event).await.len() as i32;

    assert!(record.available_tickets >= 0);
    assert!(record.available_tickets <= record.total_tickets);
    assert_eq!(record.available_tickets + booked, record.total_tickets);
}

#[tokio::test]
async fn initialize_opens_full_capacity() {
    let allocator = allocator();
    let event = allocator.initialize("Concert", 2).await.unwrap();

    assert_eq!(event.name, "Concert");
    assert_eq!(event.total_tickets, 2);
    assert_eq!(event.available_tickets, 2);

    let status = allocator.status(event.id).await.unwrap();
    assert_eq!(status.available_tickets, 2);
    assert_eq!(status.waiting_list_count, 0);
}

#[tokio::test]
async fn books_until_sold_out_then_waitlists() {
    let allocator = allocator();
    let event = allocator.initialize("Concert", 2).await.unwrap();

    assert!(matches!(
        allocator.book(event.id, UserId(1)).await.unwrap(),
        BookingOutcome::Booked(_)
    ));
    assert!(matches!(
        allocator.book(event.id, UserId(2)).await.unwrap(),
        BookingOutcome::Booked(_)
    ));
    let third = allocator.book(event.id, UserId(3)).await.unwrap();
    match third {
        BookingOutcome::Waitlisted(entry) => assert_eq!(entry.user_id, UserId(3)),
        BookingOutcome::Booked(_) => panic!("third booking must be waitlisted"),
    }

    let status = allocator.status(event.id).await.unwrap();
    assert_eq!(status.available_tickets, 0);
    assert_eq!(status.waiting_list_count, 1);
    assert_accounting(&allocator, event.id).await;
}

#[tokio::test]
async fn cancellation_promotes_longest_waiting_user() {
    let allocator = allocator();
    let event = allocator.initialize("Concert", 2).await.unwrap();
    allocator.book(event.id, UserId(1)).await.unwrap();
    allocator.book(event.id, UserId(2)).await.unwrap();
    allocator.book(event.id, UserId(3)).await.unwrap();

    let cancellation = allocator.cancel(event.id, UserId(1)).await.unwrap();
    assert_eq!(cancellation.cancelled.user_id, UserId(1));
    let promoted = cancellation.promoted.expect("user 3 is promoted");
    assert_eq!(promoted.user_id, UserId(3));

    // The freed seat was reassigned inside the same transaction.
    let status = allocator.status(event.id).await.unwrap();
    assert_eq!(status.available_tickets, 0);
    assert_eq!(status.waiting_list_count, 0);

    let holders: Vec<UserId> = allocator
        .store()
        .bookings(event.id)
        .await
        .into_iter()
        .map(|b| b.user_id)
        .collect();
    assert!(holders.contains(&UserId(2)));
    assert!(holders.contains(&UserId(3)));
    assert!(!holders.contains(&UserId(1)));
    assert_accounting(&allocator, event.id).await;
}

#[tokio::test]
async fn cancellation_without_waitlist_frees_the_seat() {
    let allocator = allocator();
    let event = allocator.initialize("Concert", 3).await.unwrap();
    allocator.book(event.id, UserId(1)).await.unwrap();

    let cancellation = allocator.cancel(event.id, UserId(1)).await.unwrap();
    assert!(cancellation.promoted.is_none());

    let status = allocator.status(event.id).await.unwrap();
    assert_eq!(status.available_tickets, 3);
    assert_eq!(status.waiting_list_count, 0);
    assert_accounting(&allocator, event.id).await;
}

#[tokio::test]
async fn waitlist_promotion_is_fifo() {
    let allocator = allocator();
    let event = allocator.initialize("Club night", 1).await.unwrap();
    allocator.book(event.id, UserId(1)).await.unwrap();
    allocator.book(event.id, UserId(2)).await.unwrap(); // waitlisted first
    allocator.book(event.id, UserId(3)).await.unwrap(); // waitlisted second

    let first = allocator.cancel(event.id, UserId(1)).await.unwrap();
    assert_eq!(first.promoted.expect("promotion").user_id, UserId(2));

    let second = allocator.cancel(event.id, UserId(2)).await.unwrap();
    assert_eq!(second.promoted.expect("promotion").user_id, UserId(3));

    assert_accounting(&allocator, event.id).await;
}

#[tokio::test]
async fn fifo_ties_on_created_at_break_by_id() {
    // Every record carries the same timestamp, so ordering can only come
    // from the id sequence.
    let store = InMemoryInventory::with_fixed_time(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
    let allocator = TicketAllocator::new(store);
    let event = allocator.initialize("Club night", 1).await.unwrap();
    allocator.book(event.id, UserId(1)).await.unwrap();
    allocator.book(event.id, UserId(2)).await.unwrap();
    allocator.book(event.id, UserId(3)).await.unwrap();

    let cancellation = allocator.cancel(event.id, UserId(1)).await.unwrap();
    assert_eq!(cancellation.promoted.expect("promotion").user_id, UserId(2));
}

#[tokio::test]
async fn cancel_removes_the_oldest_of_duplicate_bookings() {
    let allocator = allocator();
    let event = allocator.initialize("Concert", 3).await.unwrap();

    let first = match allocator.book(event.id, UserId(1)).await.unwrap() {
        BookingOutcome::Booked(b) => b,
        BookingOutcome::Waitlisted(_) => panic!("capacity available"),
    };
    allocator.book(event.id, UserId(1)).await.unwrap();

    let cancellation = allocator.cancel(event.id, UserId(1)).await.unwrap();
    assert_eq!(cancellation.cancelled.id, first.id);

    // The newer duplicate still holds its seat.
    let remaining = allocator.store().bookings(event.id).await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].user_id, UserId(1));
}

#[tokio::test]
async fn unknown_event_fails_not_found() {
    let allocator = allocator();
    let missing = EventId(999);

    assert_eq!(
        allocator.book(missing, UserId(1)).await,
        Err(InventoryError::EventNotFound(missing))
    );
    assert_eq!(
        allocator.status(missing).await,
        Err(InventoryError::EventNotFound(missing))
    );
    assert_eq!(
        allocator.cancel(missing, UserId(1)).await,
        Err(InventoryError::EventNotFound(missing))
    );
}

#[tokio::test]
async fn cancel_without_booking_mutates_nothing() {
    let allocator = allocator();
    let event = allocator.initialize("Concert", 2).await.unwrap();
    allocator.book(event.id, UserId(1)).await.unwrap();

    let err = allocator.cancel(event.id, UserId(42)).await;
    assert_eq!(
        err,
        Err(InventoryError::BookingNotFound {
            event: event.id,
            user: UserId(42),
        })
    );

    let status = allocator.status(event.id).await.unwrap();
    assert_eq!(status.available_tickets, 1);
    assert_eq!(status.waiting_list_count, 0);
    assert_eq!(allocator.store().bookings(event.id).await.len(), 1);
}

#[tokio::test]
async fn waitlisted_user_keeps_queue_position_across_other_promotions() {
    let allocator = allocator();
    let event = allocator.initialize("Concert", 1).await.unwrap();
    allocator.book(event.id, UserId(1)).await.unwrap();
    allocator.book(event.id, UserId(2)).await.unwrap();
    allocator.book(event.id, UserId(3)).await.unwrap();
    allocator.book(event.id, UserId(4)).await.unwrap();

    allocator.cancel(event.id, UserId(1)).await.unwrap(); // promotes 2

    let queue: Vec<UserId> = allocator
        .store()
        .waiting_list(event.id)
        .await
        .into_iter()
        .map(|w| w.user_id)
        .collect();
    assert_eq!(queue, vec![UserId(3), UserId(4)]);
}
