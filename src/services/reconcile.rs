//! Stuck-seat reconciliation.
//!
//! Compensation can fail under infrastructure faults, which can leave a seat
//! BOOKED with no live booking referencing it, and holds can outlive the
//! caller that took them. This sweep is the operational safety net: a
//! read-only scan plus per-seat conditional releases. It is safe to run
//! concurrently with live traffic, so a seat that gets legitimately booked
//! between the scan and the release simply fails its conditional transition
//! and is skipped.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::Error;
use crate::ledger::{LedgerError, SeatLedger};
use crate::models::SeatStatus;
use crate::store::{BookingStore, EventStore};

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub scanned: usize,
    pub stuck_released: usize,
    pub expired_holds_released: usize,
}

#[derive(Clone)]
pub struct ReconcileService {
    ledger: SeatLedger,
    bookings: Arc<dyn BookingStore>,
    events: Arc<dyn EventStore>,
}

impl ReconcileService {
    pub fn new(
        ledger: SeatLedger,
        bookings: Arc<dyn BookingStore>,
        events: Arc<dyn EventStore>,
    ) -> Self {
        ReconcileService {
            ledger,
            bookings,
            events,
        }
    }

    pub async fn sweep_event(&self, event_id: &str) -> Result<SweepReport, Error> {
        let seats = self.ledger.list_by_event(event_id).await?;

        let owned: HashSet<String> = self
            .bookings
            .list_bookings_by_event(event_id)
            .await?
            .into_iter()
            .filter(|b| b.is_live())
            .flat_map(|b| b.seats)
            .collect();

        let now = Utc::now();
        let mut report = SweepReport {
            scanned: seats.len(),
            ..SweepReport::default()
        };

        for seat in seats {
            match seat.status {
                SeatStatus::Booked if !owned.contains(&seat.seat_id) => {
                    if self.release(event_id, &seat.seat_id, SeatStatus::Booked).await {
                        warn!(event_id, seat_id = %seat.seat_id, "released stuck seat");
                        report.stuck_released += 1;
                    }
                }
                SeatStatus::Held if seat.held_until.map_or(true, |t| t <= now) => {
                    if self.release(event_id, &seat.seat_id, SeatStatus::Held).await {
                        report.expired_holds_released += 1;
                    }
                }
                _ => {}
            }
        }

        if report.stuck_released > 0 || report.expired_holds_released > 0 {
            info!(
                event_id,
                stuck = report.stuck_released,
                expired_holds = report.expired_holds_released,
                "reconciliation sweep released seats"
            );
        }
        Ok(report)
    }

    pub async fn sweep_all(&self) -> Result<SweepReport, Error> {
        let mut total = SweepReport::default();
        for event in self.events.list_events().await? {
            let report = self.sweep_event(&event.event_id).await?;
            total.scanned += report.scanned;
            total.stuck_released += report.stuck_released;
            total.expired_holds_released += report.expired_holds_released;
        }
        Ok(total)
    }

    /// One conditional release. Losing the race (someone claimed or released
    /// the seat since the scan) is fine; only the success is counted.
    async fn release(&self, event_id: &str, seat_id: &str, from: SeatStatus) -> bool {
        match self
            .ledger
            .transition(event_id, seat_id, from, SeatStatus::Available)
            .await
        {
            Ok(()) => true,
            Err(LedgerError::Conflict { .. }) | Err(LedgerError::NotFound { .. }) => false,
            Err(LedgerError::Unavailable) => {
                warn!(event_id, seat_id, "sweep release hit store fault, will retry next pass");
                false
            }
        }
    }
}
