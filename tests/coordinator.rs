mod common;

use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use tokio::sync::Barrier;

use showseat::coordinator::{ClaimTarget, CoordinatorError, ReleaseOutcome};
use showseat::models::SeatStatus;

use common::{provision, seat_ids, seat_status, test_app};

#[tokio::test(flavor = "multi_thread")]
async fn disjoint_concurrent_claims_both_succeed() {
    let app = Arc::new(test_app());
    provision(&app, "e1", &["A1", "A2", "A3", "A4"], 10.0).await;

    let barrier = Arc::new(Barrier::new(2));

    let a = {
        let app = app.clone();
        let barrier = barrier.clone();
        tokio::spawn(async move {
            barrier.wait().await;
            app.coordinator
                .claim("e1", &seat_ids(&["A1", "A2"]), ClaimTarget::Book)
                .await
        })
    };
    let b = {
        let app = app.clone();
        let barrier = barrier.clone();
        tokio::spawn(async move {
            barrier.wait().await;
            app.coordinator
                .claim("e1", &seat_ids(&["A3", "A4"]), ClaimTarget::Book)
                .await
        })
    };

    assert!(a.await.unwrap().is_ok());
    assert!(b.await.unwrap().is_ok());

    for seat in ["A1", "A2", "A3", "A4"] {
        assert_eq!(seat_status(&app, "e1", seat).await, SeatStatus::Booked);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn overlapping_concurrent_claims_exactly_one_wins_shared_seat() {
    // Repeat to give the scheduler chances to interleave either way.
    for round in 0..20 {
        let app = Arc::new(test_app());
        let event = format!("e{round}");
        provision(&app, &event, &["A1", "A2", "A3"], 10.0).await;

        let barrier = Arc::new(Barrier::new(2));
        let a = {
            let app = app.clone();
            let event = event.clone();
            let barrier = barrier.clone();
            tokio::spawn(async move {
                barrier.wait().await;
                app.coordinator
                    .claim(&event, &seat_ids(&["A1", "A2"]), ClaimTarget::Book)
                    .await
            })
        };
        let b = {
            let app = app.clone();
            let event = event.clone();
            let barrier = barrier.clone();
            tokio::spawn(async move {
                barrier.wait().await;
                app.coordinator
                    .claim(&event, &seat_ids(&["A2", "A3"]), ClaimTarget::Book)
                    .await
            })
        };

        let ra = a.await.unwrap();
        let rb = b.await.unwrap();

        // First-committer-wins on the shared seat: exactly one claim succeeds.
        assert_ne!(ra.is_ok(), rb.is_ok(), "round {round}: {ra:?} vs {rb:?}");
        let a_won = ra.is_ok();
        let loser = if a_won { rb } else { ra };
        match loser {
            Err(CoordinatorError::SeatsUnavailable { seats }) => {
                assert_eq!(seats, vec!["A2".to_string()]);
            }
            other => panic!("expected SeatsUnavailable for A2, got {other:?}"),
        }

        // The shared seat is BOOKED exactly once, and the loser's other seat
        // was rolled back to AVAILABLE.
        assert_eq!(seat_status(&app, &event, "A2").await, SeatStatus::Booked);
        let (winner_extra, loser_extra) = if a_won { ("A1", "A3") } else { ("A3", "A1") };
        assert_eq!(seat_status(&app, &event, winner_extra).await, SeatStatus::Booked);
        assert_eq!(seat_status(&app, &event, loser_extra).await, SeatStatus::Available);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn many_claimants_for_one_seat_yield_a_single_winner() {
    let app = Arc::new(test_app());
    provision(&app, "e1", &["A1"], 10.0).await;

    let claimants = 8;
    let barrier = Arc::new(Barrier::new(claimants));
    let tasks: Vec<_> = (0..claimants)
        .map(|_| {
            let app = app.clone();
            let barrier = barrier.clone();
            tokio::spawn(async move {
                barrier.wait().await;
                app.coordinator
                    .claim("e1", &seat_ids(&["A1"]), ClaimTarget::Book)
                    .await
            })
        })
        .collect();

    let results = futures::future::join_all(tasks).await;
    let wins = results
        .into_iter()
        .map(|r| r.unwrap())
        .filter(Result::is_ok)
        .count();
    assert_eq!(wins, 1);
    assert_eq!(seat_status(&app, "e1", "A1").await, SeatStatus::Booked);
}

#[tokio::test]
async fn failed_claim_rolls_back_already_taken_seats() {
    let app = test_app();
    provision(&app, "e1", &["B1", "B2", "B3"], 10.0).await;

    // B2 is already taken by someone else.
    app.ledger
        .transition("e1", "B2", SeatStatus::Available, SeatStatus::Booked)
        .await
        .unwrap();

    let err = app
        .coordinator
        .claim("e1", &seat_ids(&["B1", "B2", "B3"]), ClaimTarget::Book)
        .await
        .unwrap_err();
    match err {
        CoordinatorError::SeatsUnavailable { seats } => assert_eq!(seats, vec!["B2".to_string()]),
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(seat_status(&app, "e1", "B1").await, SeatStatus::Available);
    assert_eq!(seat_status(&app, "e1", "B3").await, SeatStatus::Available);
    assert_eq!(seat_status(&app, "e1", "B2").await, SeatStatus::Booked);
}

#[tokio::test]
async fn claim_of_unknown_seat_fails_and_rolls_back() {
    let app = test_app();
    provision(&app, "e1", &["A1"], 10.0).await;

    let err = app
        .coordinator
        .claim("e1", &seat_ids(&["A1", "Z9"]), ClaimTarget::Book)
        .await
        .unwrap_err();
    assert!(matches!(err, CoordinatorError::SeatNotFound { seat_id } if seat_id == "Z9"));
    assert_eq!(seat_status(&app, "e1", "A1").await, SeatStatus::Available);
}

#[tokio::test]
async fn claim_dedups_and_accepts_unsorted_input() {
    let app = test_app();
    provision(&app, "e1", &["A1", "A2"], 10.0).await;

    app.coordinator
        .claim("e1", &seat_ids(&["A2", "A1", "A2"]), ClaimTarget::Book)
        .await
        .unwrap();
    assert_eq!(seat_status(&app, "e1", "A1").await, SeatStatus::Booked);
    assert_eq!(seat_status(&app, "e1", "A2").await, SeatStatus::Booked);
}

#[tokio::test]
async fn release_is_idempotent() {
    let app = test_app();
    provision(&app, "e1", &["A1", "A2"], 10.0).await;
    let seats = seat_ids(&["A1", "A2"]);

    app.coordinator
        .claim("e1", &seats, ClaimTarget::Book)
        .await
        .unwrap();

    let first = app.coordinator.release("e1", &seats).await.unwrap();
    assert_eq!(
        first,
        ReleaseOutcome {
            released: 2,
            already_free: 0
        }
    );

    // The second release is a no-op, not an error.
    let second = app.coordinator.release("e1", &seats).await.unwrap();
    assert_eq!(
        second,
        ReleaseOutcome {
            released: 0,
            already_free: 2
        }
    );
    assert_eq!(seat_status(&app, "e1", "A1").await, SeatStatus::Available);
    assert_eq!(seat_status(&app, "e1", "A2").await, SeatStatus::Available);
}

#[tokio::test]
async fn swap_failure_releases_nothing() {
    let app = test_app();
    provision(&app, "e1", &["A1", "A2", "A3"], 10.0).await;

    app.coordinator
        .claim("e1", &seat_ids(&["A1", "A2"]), ClaimTarget::Book)
        .await
        .unwrap();
    // A3 is taken by someone else, so the swap's claim phase must fail.
    app.ledger
        .transition("e1", "A3", SeatStatus::Available, SeatStatus::Booked)
        .await
        .unwrap();

    let err = app
        .coordinator
        .swap("e1", &seat_ids(&["A1", "A2"]), &seat_ids(&["A3"]))
        .await
        .unwrap_err();
    assert!(matches!(err, CoordinatorError::SeatsUnavailable { .. }));

    // Fail-closed: the original seats were never released.
    assert_eq!(seat_status(&app, "e1", "A1").await, SeatStatus::Booked);
    assert_eq!(seat_status(&app, "e1", "A2").await, SeatStatus::Booked);
}

#[tokio::test]
async fn swap_keeps_overlap_claimed_throughout() {
    let app = test_app();
    provision(&app, "e1", &["A1", "A2", "A3"], 10.0).await;

    app.coordinator
        .claim("e1", &seat_ids(&["A1", "A2"]), ClaimTarget::Book)
        .await
        .unwrap();
    app.coordinator
        .swap("e1", &seat_ids(&["A1", "A2"]), &seat_ids(&["A2", "A3"]))
        .await
        .unwrap();

    assert_eq!(seat_status(&app, "e1", "A1").await, SeatStatus::Available);
    assert_eq!(seat_status(&app, "e1", "A2").await, SeatStatus::Booked);
    assert_eq!(seat_status(&app, "e1", "A3").await, SeatStatus::Booked);

    // The overlap seat was never transitioned: version 2 from the original
    // claim only.
    let entry = app.ledger.read("e1", "A2").await.unwrap();
    assert_eq!(entry.version, 2);
}

#[tokio::test]
async fn hold_then_confirm_books_the_seats() {
    let app = test_app();
    provision(&app, "e1", &["A1", "A2"], 10.0).await;
    let seats = seat_ids(&["A1", "A2"]);
    let until = Utc::now() + ChronoDuration::minutes(5);

    app.coordinator
        .claim("e1", &seats, ClaimTarget::Hold(until))
        .await
        .unwrap();
    for seat in ["A1", "A2"] {
        let entry = app.ledger.read("e1", seat).await.unwrap();
        assert_eq!(entry.status, SeatStatus::Held);
        assert_eq!(entry.held_until, Some(until));
    }

    app.coordinator.confirm("e1", &seats).await.unwrap();
    for seat in ["A1", "A2"] {
        let entry = app.ledger.read("e1", seat).await.unwrap();
        assert_eq!(entry.status, SeatStatus::Booked);
        assert_eq!(entry.held_until, None);
    }
}

#[tokio::test]
async fn confirm_failure_rolls_back_confirmed_seats() {
    let app = test_app();
    provision(&app, "e1", &["A1", "A2"], 10.0).await;
    let seats = seat_ids(&["A1", "A2"]);
    let until = Utc::now() + ChronoDuration::minutes(5);

    app.coordinator
        .claim("e1", &seats, ClaimTarget::Hold(until))
        .await
        .unwrap();
    // A2's hold got reclaimed (as the sweep would after expiry).
    app.ledger
        .transition("e1", "A2", SeatStatus::Held, SeatStatus::Available)
        .await
        .unwrap();

    let err = app.coordinator.confirm("e1", &seats).await.unwrap_err();
    assert!(matches!(err, CoordinatorError::SeatsUnavailable { .. }));

    // A1 had already been confirmed within the call and was rolled back.
    assert_eq!(seat_status(&app, "e1", "A1").await, SeatStatus::Available);
    assert_eq!(seat_status(&app, "e1", "A2").await, SeatStatus::Available);
}
