//! Order initiation, payment verification and booking queries against the
//! in-memory collaborators.

#![allow(clippy::unwrap_used)]

mod common;

use common::{Fixture, SECRET};
use showtime_core::mocks::sign_payment;
use showtime_core::{
    Actor, BookingError, BookingQuery, CreateOrderRequest, Role, ShowId, UserId,
    VerifyPaymentRequest,
};
use std::sync::Arc;
use std::time::Duration;

fn order_request(show_id: ShowId, seats: &[u32], amount: u64) -> CreateOrderRequest {
    CreateOrderRequest {
        show_id: Some(show_id),
        selected_seats: Some(seats.to_vec()),
        amount: Some(amount),
    }
}

fn verify_request(
    show_id: ShowId,
    seats: &[u32],
    order_id: &str,
    payment_id: &str,
) -> VerifyPaymentRequest {
    VerifyPaymentRequest {
        show_id: Some(show_id),
        selected_seats: Some(seats.to_vec()),
        amount: Some(500),
        order_id: Some(order_id.to_string()),
        payment_id: Some(payment_id.to_string()),
        signature: Some(sign_payment(SECRET, order_id, payment_id)),
    }
}

#[tokio::test]
async fn test_end_to_end_booking() {
    let fx = Fixture::new();
    let show = fx.seed_show(24, 40);

    let order = fx
        .initiator()
        .initiate(&fx.user, order_request(show.id, &[1, 2], 500))
        .await
        .unwrap();
    assert_eq!(order.amount, 50_000);
    assert_eq!(order.currency, "INR");
    assert!(order.receipt.starts_with("receipt_order_"));

    let sent = fx.gateway.orders();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].amount_minor, 50_000);

    let confirmation = fx
        .verifier()
        .verify(&fx.user, verify_request(show.id, &[1, 2], &order.order_id, "pay_1"))
        .await
        .unwrap();

    assert!(confirmation.ticket_sent);
    assert_eq!(confirmation.seats, "B1, B2");
    assert_eq!(confirmation.booking.seats, vec![1, 2]);
    assert_eq!(confirmation.booking.transaction_id, "pay_1");

    let stored = fx.store.show_snapshot(show.id).unwrap();
    assert_eq!(stored.booked_seats, vec![1, 2]);
    assert_eq!(stored.version, 1);
    assert_eq!(fx.store.all_bookings().len(), 1);

    let emails = fx.notifier.sent();
    assert_eq!(emails.len(), 1);
    let email = &emails[0];
    assert_eq!(email.template, "ticket.html");
    assert_eq!(email.subject, "MOVIE BOOKING DETAILS");
    assert_eq!(email.to, "asha@example.com");
    assert_eq!(email.values["name"], "Asha");
    assert_eq!(email.values["title"], "Dune");
    assert_eq!(email.values["showTime"], "2nd Jan 2026");
    assert_eq!(email.values["seats"], "B1, B2");
    let attachment = email.attachment.as_ref().unwrap();
    let ticket = String::from_utf8(attachment.content.clone()).unwrap();
    assert!(ticket.contains("B1, B2"));
    assert!(ticket.contains("pay_1"));
}

#[tokio::test]
async fn test_bad_signature_changes_nothing() {
    let fx = Fixture::new();
    let show = fx.seed_show(24, 40);

    let mut request = verify_request(show.id, &[3], "order_1", "pay_1");
    let mut signature = request.signature.take().unwrap();
    let last = if signature.ends_with('0') { "1" } else { "0" };
    signature.replace_range(63.., last);
    request.signature = Some(signature);

    let err = fx.verifier().verify(&fx.user, request).await.unwrap_err();
    assert_eq!(err, BookingError::VerificationFailed);
    assert!(fx.store.show_snapshot(show.id).unwrap().booked_seats.is_empty());
    assert!(fx.store.all_bookings().is_empty());
    assert!(fx.notifier.sent().is_empty());
}

#[tokio::test]
async fn test_second_verification_of_same_payment_fails() {
    let fx = Fixture::new();
    let show = fx.seed_show(24, 40);
    let verifier = fx.verifier();

    verifier
        .verify(&fx.user, verify_request(show.id, &[5, 6], "order_1", "pay_1"))
        .await
        .unwrap();
    let err = verifier
        .verify(&fx.user, verify_request(show.id, &[5, 6], "order_1", "pay_1"))
        .await
        .unwrap_err();

    assert!(matches!(err, BookingError::DuplicatePayment { .. }));
    assert_eq!(fx.store.all_bookings().len(), 1);
    assert_eq!(fx.store.show_snapshot(show.id).unwrap().booked_seats, vec![5, 6]);
}

#[tokio::test]
async fn test_ticket_failure_keeps_booking() {
    let fx = Fixture::new();
    let show = fx.seed_show(24, 40);
    fx.notifier.set_failing(true);

    let confirmation = fx
        .verifier()
        .verify(&fx.user, verify_request(show.id, &[7], "order_1", "pay_1"))
        .await
        .unwrap();

    assert!(!confirmation.ticket_sent);
    assert_eq!(fx.store.all_bookings().len(), 1);
    assert_eq!(fx.store.show_snapshot(show.id).unwrap().booked_seats, vec![7]);
}

#[tokio::test]
async fn test_slow_ticket_delivery_does_not_hold_the_response() {
    let fx = Fixture::new();
    let show = fx.seed_show(24, 40);
    let delay = common::TICKET_TIMEOUT * 4;
    fx.notifier.set_delay(delay);

    let started = tokio::time::Instant::now();
    let confirmation = fx
        .verifier()
        .verify(&fx.user, verify_request(show.id, &[8], "order_1", "pay_1"))
        .await
        .unwrap();

    assert!(started.elapsed() < delay);
    assert!(!confirmation.ticket_sent);
    assert_eq!(fx.store.all_bookings().len(), 1);
    assert!(fx.notifier.sent().is_empty());

    // Delivery finishes in the background.
    tokio::time::sleep(delay + Duration::from_millis(500)).await;
    assert_eq!(fx.notifier.sent().len(), 1);
}

#[tokio::test]
async fn test_verification_rejects_missing_fields_and_unknown_show() {
    let fx = Fixture::new();
    let verifier = fx.verifier();

    let err = verifier
        .verify(&fx.user, VerifyPaymentRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::InvalidRequest { .. }));

    let err = verifier
        .verify(&fx.user, verify_request(ShowId::new(), &[1], "order_1", "pay_1"))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::NotFound { resource: "Show", .. }));
}

#[tokio::test]
async fn test_verification_rejects_unknown_user() {
    let fx = Fixture::new();
    let show = fx.seed_show(24, 40);
    let stranger = Actor::new(UserId::new(), Role::User);

    let err = fx
        .verifier()
        .verify(&stranger, verify_request(show.id, &[1], "order_1", "pay_1"))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::NotFound { resource: "User", .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_disjoint_seats_both_succeed() {
    let fx = Fixture::new();
    let show_id = fx.seed_show(24, 40).id;
    let verifier = Arc::new(fx.verifier());

    let a = {
        let verifier = Arc::clone(&verifier);
        let actor = fx.user;
        tokio::spawn(async move {
            verifier
                .verify(&actor, verify_request(show_id, &[1, 2], "order_a", "pay_a"))
                .await
        })
    };
    let b = {
        let verifier = Arc::clone(&verifier);
        let actor = fx.user;
        tokio::spawn(async move {
            verifier
                .verify(&actor, verify_request(show_id, &[3, 4], "order_b", "pay_b"))
                .await
        })
    };

    assert!(a.await.unwrap().is_ok());
    assert!(b.await.unwrap().is_ok());

    let mut booked = fx.store.show_snapshot(show_id).unwrap().booked_seats;
    booked.sort_unstable();
    assert_eq!(booked, vec![1, 2, 3, 4]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_overlapping_seats_one_wins() {
    let fx = Fixture::new();
    let show_id = fx.seed_show(24, 40).id;
    let verifier = Arc::new(fx.verifier());

    let handles: Vec<_> = [("order_a", "pay_a", vec![1, 2]), ("order_b", "pay_b", vec![2, 3])]
        .into_iter()
        .map(|(order, payment, seats)| {
            let verifier = Arc::clone(&verifier);
            let actor = fx.user;
            tokio::spawn(async move {
                verifier
                    .verify(&actor, verify_request(show_id, &seats, order, payment))
                    .await
            })
        })
        .collect();

    let mut outcomes = Vec::new();
    for handle in handles {
        outcomes.push(handle.await.unwrap());
    }

    let wins = outcomes.iter().filter(|o| o.is_ok()).count();
    assert_eq!(wins, 1);
    assert!(
        outcomes
            .iter()
            .any(|o| matches!(o, Err(BookingError::SeatConflict { seats }) if seats == &vec![2]))
    );
    assert_eq!(fx.store.all_bookings().len(), 1);
    assert_eq!(fx.store.show_snapshot(show_id).unwrap().booked_seats.len(), 2);
}

#[tokio::test]
async fn test_order_rejections() {
    let fx = Fixture::new();
    let initiator = fx.initiator();
    let upcoming = fx.seed_show(24, 40);
    let started = fx.seed_show(-1, 40);

    let err = initiator
        .initiate(&fx.user, CreateOrderRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::InvalidRequest { .. }));

    let err = initiator
        .initiate(&fx.user, order_request(upcoming.id, &[], 500))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::InvalidRequest { .. }));

    let err = initiator
        .initiate(&fx.user, order_request(ShowId::new(), &[1], 500))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::NotFound { .. }));

    let err = initiator
        .initiate(&fx.user, order_request(started.id, &[1], 500))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Expired { .. }));

    let err = initiator
        .initiate(&fx.user, order_request(upcoming.id, &[1], u64::MAX))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::InvalidRequest { .. }));

    let err = initiator
        .initiate(&fx.user, order_request(upcoming.id, &[40], 500))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::SeatOutOfRange { .. }));

    assert!(fx.gateway.orders().is_empty());
}

#[tokio::test]
async fn test_order_rejects_booked_seats_and_gateway_failures() {
    let fx = Fixture::new();
    let show = fx.seed_show(24, 40);
    fx.verifier()
        .verify(&fx.user, verify_request(show.id, &[10], "order_1", "pay_1"))
        .await
        .unwrap();

    let err = fx
        .initiator()
        .initiate(&fx.user, order_request(show.id, &[9, 10], 500))
        .await
        .unwrap_err();
    assert_eq!(err, BookingError::SeatConflict { seats: vec![10] });

    fx.gateway.fail_with("gateway down");
    let err = fx
        .initiator()
        .initiate(&fx.user, order_request(show.id, &[11], 500))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Gateway(_)));
}

#[tokio::test]
async fn test_orders_do_not_hold_seats() {
    let fx = Fixture::new();
    let show = fx.seed_show(24, 40);
    let initiator = fx.initiator();

    let first = initiator
        .initiate(&fx.user, order_request(show.id, &[1], 250))
        .await
        .unwrap();
    let second = initiator
        .initiate(&fx.user, order_request(show.id, &[1], 250))
        .await
        .unwrap();
    assert_ne!(first.order_id, second.order_id);

    let verifier = fx.verifier();
    verifier
        .verify(&fx.user, verify_request(show.id, &[1], &first.order_id, "pay_1"))
        .await
        .unwrap();
    let err = verifier
        .verify(&fx.user, verify_request(show.id, &[1], &second.order_id, "pay_2"))
        .await
        .unwrap_err();
    assert_eq!(err, BookingError::SeatConflict { seats: vec![1] });
}

#[tokio::test]
async fn test_bookings_split_into_upcoming_and_past() {
    let fx = Fixture::new();
    let later = fx.seed_show(48, 40);
    let sooner = fx.seed_show(24, 40);
    let past_a = fx.seed_show(-48, 40);
    let past_b = fx.seed_show(-24, 40);

    let verifier = fx.verifier();
    for (i, show) in [&later, &sooner, &past_a, &past_b].into_iter().enumerate() {
        verifier
            .verify(
                &fx.user,
                verify_request(show.id, &[1], &format!("order_{i}"), &format!("pay_{i}")),
            )
            .await
            .unwrap();
    }

    let queries = fx.queries();
    let upcoming = queries
        .bookings_for(&fx.user, BookingQuery::default())
        .await
        .unwrap();
    let ids: Vec<_> = upcoming.iter().map(|v| v.show.show.id).collect();
    assert_eq!(ids, vec![sooner.id, later.id]);

    let past = queries
        .bookings_for(
            &fx.user,
            BookingQuery {
                upcoming: false,
                limit: Some(1),
            },
        )
        .await
        .unwrap();
    let ids: Vec<_> = past.iter().map(|v| v.show.show.id).collect();
    assert_eq!(ids, vec![past_b.id]);
    assert_eq!(past[0].show.movie.title, "Dune");

    // Other users see nothing
    let other = queries
        .bookings_for(&fx.partner, BookingQuery::default())
        .await
        .unwrap();
    assert!(other.is_empty());
}
