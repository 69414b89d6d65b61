mod common;

use showseat::bookings::CreateBooking;
use showseat::error::Error;
use showseat::models::SeatStatus;

use common::{event, provision, seat_ids, test_app, user};

#[tokio::test]
async fn provision_round_trip() {
    let app = test_app();
    let layout = ["A1", "A2", "A3", "B1", "B2"];

    let report = app
        .provisioner
        .provision(event("e1", 12.5), &seat_ids(&layout))
        .await
        .unwrap();
    assert_eq!(report.created, layout.len() as u64);
    assert_eq!(report.already_present, 0);

    let entries = app.ledger.list_by_event("e1").await.unwrap();
    assert_eq!(entries.len(), layout.len());
    for entry in &entries {
        assert_eq!(entry.status, SeatStatus::Available);
        assert_eq!(entry.price, 12.5);
    }
    // Ordered by seat id.
    let ids: Vec<&str> = entries.iter().map(|e| e.seat_id.as_str()).collect();
    assert_eq!(ids, vec!["A1", "A2", "A3", "B1", "B2"]);
}

#[tokio::test]
async fn provision_spans_multiple_batches() {
    let app = test_app();
    let layout: Vec<String> = (1..=60).map(|i| format!("S{i:03}")).collect();

    let report = app
        .provisioner
        .provision(event("e1", 5.0), &layout)
        .await
        .unwrap();
    assert_eq!(report.created, 60);
    assert_eq!(app.ledger.list_by_event("e1").await.unwrap().len(), 60);
}

#[tokio::test]
async fn reprovision_is_retry_safe() {
    let app = test_app();
    provision(&app, "e1", &["A1", "A2"], 10.0).await;

    // A1 gets booked between the two provisioning runs.
    app.ledger
        .transition("e1", "A1", SeatStatus::Available, SeatStatus::Booked)
        .await
        .unwrap();

    let report = app
        .provisioner
        .provision(event("e1", 10.0), &seat_ids(&["A1", "A2", "A3"]))
        .await
        .unwrap();
    assert_eq!(report.created, 1);
    assert_eq!(report.already_present, 2);

    // The booked seat was not reset.
    let entry = app.ledger.read("e1", "A1").await.unwrap();
    assert_eq!(entry.status, SeatStatus::Booked);
    assert_eq!(app.ledger.list_by_event("e1").await.unwrap().len(), 3);
}

#[tokio::test]
async fn provision_rejects_empty_layout() {
    let app = test_app();
    let err = app
        .provisioner
        .provision(event("e1", 10.0), &[])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn deprovision_refused_while_live_bookings_exist() {
    let app = test_app();
    provision(&app, "e1", &["A1", "A2"], 10.0).await;

    let b1 = app
        .bookings
        .create(
            "alice",
            CreateBooking {
                event_id: "e1".to_string(),
                seat_ids: seat_ids(&["A1"]),
                total_amount: 10.0,
            },
        )
        .await
        .unwrap();

    let err = app.provisioner.deprovision("e1").await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(app.ledger.list_by_event("e1").await.unwrap().len(), 2);

    // After cancellation the event can be torn down; the tombstoned record
    // no longer blocks it.
    app.bookings.cancel(&b1.booking_id, &user("alice")).await.unwrap();
    let deleted = app.provisioner.deprovision("e1").await.unwrap();
    assert_eq!(deleted, 2);
    assert!(app.ledger.list_by_event("e1").await.unwrap().is_empty());
}

#[tokio::test]
async fn deprovision_unknown_event_is_not_found() {
    let app = test_app();
    let err = app.provisioner.deprovision("missing").await.unwrap_err();
    assert!(matches!(err, Error::NotFound("event")));
}
