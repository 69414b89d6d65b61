pub mod bookings;
pub mod config;
pub mod controllers;
pub mod coordinator;
pub mod database;
pub mod error;
pub mod ledger;
pub mod middleware;
pub mod models;
pub mod provisioner;
pub mod services;
pub mod store;

use std::sync::Arc;

use bookings::BookingService;
use coordinator::Coordinator;
use ledger::SeatLedger;
use provisioner::Provisioner;
use services::reconcile::ReconcileService;
use store::{BookingStore, EventStore, PgStore, SeatStore};

// Shared state for the whole application.
#[derive(Clone)]
pub struct AppState {
    pub config: config::Config,
    pub db: database::Database,
    pub ledger: SeatLedger,
    pub coordinator: Coordinator,
    pub bookings: BookingService,
    pub provisioner: Provisioner,
    pub reconcile: ReconcileService,
}

impl AppState {
    pub async fn new(config: config::Config) -> anyhow::Result<Arc<Self>> {
        let db = database::Database::new(&config.database.url, config.database.pool_size).await?;
        db.run_migrations().await?;

        let store = Arc::new(PgStore::new(db.pool.clone()));
        let seat_store: Arc<dyn SeatStore> = store.clone();
        let booking_store: Arc<dyn BookingStore> = store.clone();
        let event_store: Arc<dyn EventStore> = store;

        let ledger = SeatLedger::new(seat_store.clone(), config.retry_policy());
        let coordinator = Coordinator::new(ledger.clone());
        let bookings = BookingService::new(
            coordinator.clone(),
            booking_store.clone(),
            event_store.clone(),
        );
        let provisioner = Provisioner::new(seat_store, event_store.clone(), booking_store.clone());
        let reconcile = ReconcileService::new(ledger.clone(), booking_store, event_store);

        Ok(Arc::new(AppState {
            config,
            db,
            ledger,
            coordinator,
            bookings,
            provisioner,
            reconcile,
        }))
    }
}
