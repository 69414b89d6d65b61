//! Event Seat Provisioner: materializes one ledger entry per physical seat
//! when an event is scheduled, and tears them down when the event is deleted.
//!
//! Provisioning is create-if-absent per entry, so re-running it after a
//! partial failure neither duplicates entries nor resets seats that were
//! already sold.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::error::Error;
use crate::models::{EventInfo, SeatEntry};
use crate::store::{BookingStore, EventStore, SeatStore};

/// Bounded batch size per underlying store limits (the original deployment's
/// batch-write cap).
const BATCH_SIZE: usize = 25;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionReport {
    pub created: u64,
    pub already_present: u64,
}

#[derive(Clone)]
pub struct Provisioner {
    seats: Arc<dyn SeatStore>,
    events: Arc<dyn EventStore>,
    bookings: Arc<dyn BookingStore>,
}

impl Provisioner {
    pub fn new(
        seats: Arc<dyn SeatStore>,
        events: Arc<dyn EventStore>,
        bookings: Arc<dyn BookingStore>,
    ) -> Self {
        Provisioner {
            seats,
            events,
            bookings,
        }
    }

    /// Registers the event and creates one AVAILABLE entry per seat in the
    /// layout, in bounded batches. Safe to retry.
    pub async fn provision(
        &self,
        event: EventInfo,
        layout: &[String],
    ) -> Result<ProvisionReport, Error> {
        if layout.is_empty() {
            return Err(Error::Validation("seat layout is required".to_string()));
        }
        if event.price < 0.0 {
            return Err(Error::Validation("price must not be negative".to_string()));
        }

        let mut seat_ids = layout.to_vec();
        seat_ids.sort();
        seat_ids.dedup();

        self.events.put_event(&event).await?;

        let mut created = 0;
        for chunk in seat_ids.chunks(BATCH_SIZE) {
            let entries: Vec<SeatEntry> = chunk
                .iter()
                .map(|seat_id| SeatEntry::available(&event.event_id, seat_id, event.price))
                .collect();
            created += self.seats.create_seats_if_absent(&entries).await?;
        }

        let report = ProvisionReport {
            created,
            already_present: seat_ids.len() as u64 - created,
        };
        info!(
            event_id = %event.event_id,
            created = report.created,
            already_present = report.already_present,
            "event provisioned"
        );
        Ok(report)
    }

    /// Removes every ledger entry for the event. Refused while live bookings
    /// still reference it; cancel those first.
    pub async fn deprovision(&self, event_id: &str) -> Result<u64, Error> {
        let live = self
            .bookings
            .list_bookings_by_event(event_id)
            .await?
            .into_iter()
            .filter(|b| b.is_live())
            .count();
        if live > 0 {
            return Err(Error::Validation(format!(
                "event has {live} live bookings, cancel them before deleting it"
            )));
        }

        let seats = self.seats.list_seats(event_id).await?;
        if seats.is_empty() && self.events.get_event(event_id).await?.is_none() {
            return Err(Error::NotFound("event"));
        }

        let seat_ids: Vec<String> = seats.into_iter().map(|s| s.seat_id).collect();
        for chunk in seat_ids.chunks(BATCH_SIZE) {
            self.seats.delete_seats(event_id, chunk).await?;
        }
        self.events.delete_event(event_id).await?;

        info!(event_id, deleted = seat_ids.len(), "event deprovisioned");
        Ok(seat_ids.len() as u64)
    }
}
