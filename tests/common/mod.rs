#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use showseat::bookings::BookingService;
use showseat::coordinator::Coordinator;
use showseat::ledger::{RetryPolicy, SeatLedger};
use showseat::middleware::{AuthUser, Role};
use showseat::models::{EventInfo, SeatStatus};
use showseat::provisioner::Provisioner;
use showseat::services::reconcile::ReconcileService;
use showseat::store::MemoryStore;

/// The full service stack wired over the in-memory store backend.
pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub ledger: SeatLedger,
    pub coordinator: Coordinator,
    pub bookings: BookingService,
    pub provisioner: Provisioner,
    pub reconcile: ReconcileService,
}

pub fn test_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let ledger = SeatLedger::new(
        store.clone(),
        RetryPolicy {
            attempts: 2,
            backoff: Duration::from_millis(1),
        },
    );
    let coordinator = Coordinator::new(ledger.clone());
    let bookings = BookingService::new(coordinator.clone(), store.clone(), store.clone());
    let provisioner = Provisioner::new(store.clone(), store.clone(), store.clone());
    let reconcile = ReconcileService::new(ledger.clone(), store.clone(), store.clone());

    TestApp {
        store,
        ledger,
        coordinator,
        bookings,
        provisioner,
        reconcile,
    }
}

pub fn event(event_id: &str, price: f64) -> EventInfo {
    EventInfo {
        event_id: event_id.to_string(),
        movie_title: "Interstellar".to_string(),
        theatre_name: "Galaxy Cinema".to_string(),
        show_date: "2026-09-01".to_string(),
        show_time: "19:30".to_string(),
        price,
        created_at: Utc::now(),
    }
}

pub fn event_at(event_id: &str, movie: &str, theatre: &str, price: f64) -> EventInfo {
    EventInfo {
        event_id: event_id.to_string(),
        movie_title: movie.to_string(),
        theatre_name: theatre.to_string(),
        show_date: "2026-09-01".to_string(),
        show_time: "19:30".to_string(),
        price,
        created_at: Utc::now(),
    }
}

pub fn seat_ids(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

pub fn user(id: &str) -> AuthUser {
    AuthUser {
        user_id: id.to_string(),
        role: Role::User,
    }
}

pub fn admin(id: &str) -> AuthUser {
    AuthUser {
        user_id: id.to_string(),
        role: Role::Admin,
    }
}

pub async fn provision(app: &TestApp, event_id: &str, layout: &[&str], price: f64) {
    app.provisioner
        .provision(event(event_id, price), &seat_ids(layout))
        .await
        .expect("provisioning failed");
}

pub async fn seat_status(app: &TestApp, event_id: &str, seat_id: &str) -> SeatStatus {
    app.ledger
        .read(event_id, seat_id)
        .await
        .expect("seat missing")
        .status
}
