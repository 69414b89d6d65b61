//! Seat Ledger: the authoritative per-(event, seat) state machine.
//!
//! Every mutation of seat availability in the whole service goes through
//! [`SeatLedger::transition`]: an atomic, single-entry check-and-set. There
//! is no event-wide lock; each seat's availability is decided independently,
//! so throughput scales with seat count.
//!
//! Transient store faults are retried here, with bounded exponential backoff,
//! and nowhere else. Conflict and not-found results are never retried: they
//! are answers, not faults.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{error, warn};

use crate::models::{SeatEntry, SeatStatus};
use crate::store::{SeatStore, StoreError, TransitionOutcome};

#[derive(Debug, Error)]
pub enum LedgerError {
    /// The entry's current status did not match the expected `from` status.
    /// First committer won; this caller lost.
    #[error("seat {seat_id} is {actual}, expected {expected}")]
    Conflict {
        seat_id: String,
        expected: SeatStatus,
        actual: SeatStatus,
    },
    /// No ledger entry for this (event, seat) pair. A data error, distinct
    /// from losing a race.
    #[error("seat {seat_id} not found")]
    NotFound { seat_id: String },
    /// Infrastructure fault that survived the retry budget.
    #[error("seat store unavailable")]
    Unavailable,
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            attempts: 3,
            backoff: Duration::from_millis(50),
        }
    }
}

#[derive(Clone)]
pub struct SeatLedger {
    store: Arc<dyn SeatStore>,
    retry: RetryPolicy,
}

impl SeatLedger {
    pub fn new(store: Arc<dyn SeatStore>, retry: RetryPolicy) -> Self {
        SeatLedger { store, retry }
    }

    /// Atomically moves one seat from `from` to `to`. Fails with `Conflict`
    /// if another actor got there first, `NotFound` if the entry is absent.
    pub async fn transition(
        &self,
        event_id: &str,
        seat_id: &str,
        from: SeatStatus,
        to: SeatStatus,
    ) -> Result<(), LedgerError> {
        self.apply(event_id, seat_id, from, to, None).await
    }

    /// AVAILABLE -> HELD with an expiry; the reconciliation sweep reclaims
    /// holds that pass `until` without being confirmed.
    pub async fn hold(
        &self,
        event_id: &str,
        seat_id: &str,
        from: SeatStatus,
        until: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        self.apply(event_id, seat_id, from, SeatStatus::Held, Some(until))
            .await
    }

    async fn apply(
        &self,
        event_id: &str,
        seat_id: &str,
        from: SeatStatus,
        to: SeatStatus,
        held_until: Option<DateTime<Utc>>,
    ) -> Result<(), LedgerError> {
        let outcome = self
            .with_retry("transition", || {
                self.store
                    .update_seat_status(event_id, seat_id, from, to, held_until)
            })
            .await
            .map_err(|e| self.infra(e))?;

        match outcome {
            TransitionOutcome::Applied { .. } => Ok(()),
            TransitionOutcome::Conflict { actual } => Err(LedgerError::Conflict {
                seat_id: seat_id.to_string(),
                expected: from,
                actual,
            }),
            TransitionOutcome::Missing => Err(LedgerError::NotFound {
                seat_id: seat_id.to_string(),
            }),
        }
    }

    pub async fn read(&self, event_id: &str, seat_id: &str) -> Result<SeatEntry, LedgerError> {
        let entry = self
            .with_retry("read", || self.store.get_seat(event_id, seat_id))
            .await
            .map_err(|e| self.infra(e))?;

        entry.ok_or_else(|| LedgerError::NotFound {
            seat_id: seat_id.to_string(),
        })
    }

    /// All entries for an event, ordered by seat id.
    pub async fn list_by_event(&self, event_id: &str) -> Result<Vec<SeatEntry>, LedgerError> {
        self.with_retry("list_by_event", || self.store.list_seats(event_id))
            .await
            .map_err(|e| self.infra(e))
    }

    fn infra(&self, e: StoreError) -> LedgerError {
        match e {
            StoreError::Unavailable(reason) => {
                warn!(%reason, "seat store unavailable after retries");
            }
            StoreError::Corrupt(reason) => {
                error!(%reason, "corrupt seat record");
            }
        }
        LedgerError::Unavailable
    }

    async fn with_retry<T, Fut>(
        &self,
        op: &str,
        mut call: impl FnMut() -> Fut,
    ) -> Result<T, StoreError>
    where
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let mut delay = self.retry.backoff;
        let mut attempt = 1;
        loop {
            match call().await {
                Err(StoreError::Unavailable(reason)) if attempt < self.retry.attempts => {
                    warn!(op, attempt, %reason, "transient store fault, backing off");
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}
