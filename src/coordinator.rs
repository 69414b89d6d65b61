//! Reservation Coordinator: multi-seat claim/release as a sequence of
//! per-seat atomic transitions with compensating rollback.
//!
//! There is no multi-record transaction underneath, so all-or-nothing
//! semantics come from the saga shape: forward transitions in a canonical
//! order, and on the first failure a reverse transition for every seat
//! already taken in this call. Rollback failures are logged, never
//! propagated: a rolled-back seat was never exposed in a confirmed booking,
//! and the reconciliation sweep reclaims anything that stays stuck.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{error, warn};

use crate::ledger::{LedgerError, SeatLedger};
use crate::models::SeatStatus;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// At least one requested seat lost the race. Not retried automatically;
    /// the caller resubmits with different seats.
    #[error("seats unavailable: {}", seats.join(", "))]
    SeatsUnavailable { seats: Vec<String> },
    #[error("seat {seat_id} not found")]
    SeatNotFound { seat_id: String },
    /// Infrastructure fault, already past the ledger's retry budget.
    #[error("seat store unavailable")]
    StoreUnavailable,
}

/// What a claim moves seats to.
#[derive(Debug, Clone, Copy)]
pub enum ClaimTarget {
    /// AVAILABLE -> BOOKED directly (the confirmed-booking path).
    Book,
    /// AVAILABLE -> HELD with an expiry, confirmed later via [`Coordinator::confirm`].
    Hold(DateTime<Utc>),
}

impl ClaimTarget {
    fn status(self) -> SeatStatus {
        match self {
            ClaimTarget::Book => SeatStatus::Booked,
            ClaimTarget::Hold(_) => SeatStatus::Held,
        }
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct ReleaseOutcome {
    pub released: usize,
    /// Seats that were already AVAILABLE. Retried cancellations land here.
    pub already_free: usize,
}

#[derive(Clone)]
pub struct Coordinator {
    ledger: SeatLedger,
}

/// Ascending order, duplicates removed. Every multi-seat walk in this module
/// uses this ordering; keep it if a future implementation ever adds real
/// locks, since it is what rules out lock-order inversion between two
/// overlapping claims.
fn canonical(seat_ids: &[String]) -> Vec<String> {
    let mut ids = seat_ids.to_vec();
    ids.sort();
    ids.dedup();
    ids
}

impl Coordinator {
    pub fn new(ledger: SeatLedger) -> Self {
        Coordinator { ledger }
    }

    /// All-or-nothing claim of `seat_ids` for `event_id`. On the first
    /// conflict or missing seat, every seat already taken in this call is
    /// rolled back before the error returns.
    pub async fn claim(
        &self,
        event_id: &str,
        seat_ids: &[String],
        target: ClaimTarget,
    ) -> Result<(), CoordinatorError> {
        let seats = canonical(seat_ids);
        let mut taken: Vec<&str> = Vec::with_capacity(seats.len());

        for seat_id in &seats {
            let result = match target {
                ClaimTarget::Book => {
                    self.ledger
                        .transition(event_id, seat_id, SeatStatus::Available, SeatStatus::Booked)
                        .await
                }
                ClaimTarget::Hold(until) => {
                    self.ledger
                        .hold(event_id, seat_id, SeatStatus::Available, until)
                        .await
                }
            };

            match result {
                Ok(()) => taken.push(seat_id),
                Err(e) => {
                    self.compensate(event_id, target.status(), &taken).await;
                    return Err(claim_failure(seat_id, e));
                }
            }
        }
        Ok(())
    }

    /// HELD -> BOOKED for every seat, all-or-nothing. A seat whose hold
    /// expired and was reclaimed in the meantime fails the whole confirm;
    /// seats already confirmed in this call go back to AVAILABLE.
    pub async fn confirm(
        &self,
        event_id: &str,
        seat_ids: &[String],
    ) -> Result<(), CoordinatorError> {
        let seats = canonical(seat_ids);
        let mut confirmed: Vec<&str> = Vec::with_capacity(seats.len());

        for seat_id in &seats {
            match self
                .ledger
                .transition(event_id, seat_id, SeatStatus::Held, SeatStatus::Booked)
                .await
            {
                Ok(()) => confirmed.push(seat_id),
                Err(e) => {
                    self.compensate(event_id, SeatStatus::Booked, &confirmed).await;
                    return Err(claim_failure(seat_id, e));
                }
            }
        }
        Ok(())
    }

    /// Moves each seat back to AVAILABLE. Idempotent: a seat that is already
    /// AVAILABLE is counted, not failed, so retried cancellations succeed.
    pub async fn release(
        &self,
        event_id: &str,
        seat_ids: &[String],
    ) -> Result<ReleaseOutcome, CoordinatorError> {
        let mut outcome = ReleaseOutcome::default();

        for seat_id in &canonical(seat_ids) {
            match self
                .ledger
                .transition(event_id, seat_id, SeatStatus::Booked, SeatStatus::Available)
                .await
            {
                Ok(()) => outcome.released += 1,
                Err(LedgerError::Conflict {
                    actual: SeatStatus::Available,
                    ..
                }) => outcome.already_free += 1,
                Err(LedgerError::Conflict {
                    actual: SeatStatus::Held,
                    ..
                }) => {
                    // A held seat releases the same way; losing this inner
                    // race means someone else already moved it.
                    match self
                        .ledger
                        .transition(event_id, seat_id, SeatStatus::Held, SeatStatus::Available)
                        .await
                    {
                        Ok(()) => outcome.released += 1,
                        Err(LedgerError::Unavailable) => {
                            return Err(CoordinatorError::StoreUnavailable)
                        }
                        Err(other) => {
                            warn!(event_id, %seat_id, %other, "seat moved during release, skipping");
                            outcome.already_free += 1;
                        }
                    }
                }
                Err(LedgerError::Conflict { actual, .. }) => {
                    warn!(event_id, %seat_id, %actual, "unexpected state during release, skipping");
                    outcome.already_free += 1;
                }
                Err(LedgerError::NotFound { seat_id }) => {
                    return Err(CoordinatorError::SeatNotFound { seat_id })
                }
                Err(LedgerError::Unavailable) => return Err(CoordinatorError::StoreUnavailable),
            }
        }
        Ok(outcome)
    }

    /// Seat handoff for booking modification: claim the new seats first, and
    /// only when every one of them is taken release the old ones. A failed
    /// claim releases nothing and the original booking stays intact.
    pub async fn swap(
        &self,
        event_id: &str,
        old_seat_ids: &[String],
        new_seat_ids: &[String],
    ) -> Result<(), CoordinatorError> {
        let old = canonical(old_seat_ids);
        let new = canonical(new_seat_ids);

        // Overlap stays claimed throughout; it is neither re-claimed nor
        // released, so there is no instant where it belongs to nobody.
        let to_claim: Vec<String> = new.iter().filter(|s| !old.contains(*s)).cloned().collect();
        let to_release: Vec<String> = old.iter().filter(|s| !new.contains(*s)).cloned().collect();

        self.claim(event_id, &to_claim, ClaimTarget::Book).await?;

        if let Err(e) = self.release(event_id, &to_release).await {
            // The new seats are claimed and the booking will reference them;
            // failing now would strand those instead. The old seats are no
            // longer referenced by any record, so the sweep reclaims them.
            error!(event_id, %e, old_seats = ?to_release, "failed to release old seats after swap");
        }
        Ok(())
    }

    /// Reverse transitions for the seats a failed claim already took. Runs to
    /// completion; individual failures are operational alerts, not caller
    /// errors, since the caller already sees the claim as failed.
    async fn compensate(&self, event_id: &str, from: SeatStatus, taken: &[&str]) {
        for seat_id in taken {
            if let Err(e) = self
                .ledger
                .transition(event_id, seat_id, from, SeatStatus::Available)
                .await
            {
                error!(
                    event_id,
                    %seat_id, %e,
                    "compensation failed, seat may be stuck until reconciliation"
                );
            }
        }
    }
}

fn claim_failure(seat_id: &str, e: LedgerError) -> CoordinatorError {
    match e {
        LedgerError::Conflict { .. } => CoordinatorError::SeatsUnavailable {
            seats: vec![seat_id.to_string()],
        },
        LedgerError::NotFound { seat_id } => CoordinatorError::SeatNotFound { seat_id },
        LedgerError::Unavailable => CoordinatorError::StoreUnavailable,
    }
}
