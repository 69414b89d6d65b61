//! Keyed-store abstraction the coordination core runs against.
//!
//! The contract is deliberately narrow: get-by-key, conditional-put,
//! conditional-update on a single record, range-query by event, batch-write.
//! No multi-record transaction is assumed; the backend only has to make the
//! single-entry status transition atomic. Precondition failure is a normal
//! result value (`TransitionOutcome::Conflict`), not an error.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{BookingRecord, BookingStatus, EventInfo, SeatEntry, SeatStatus};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Transient infrastructure fault. Retryable with backoff at the ledger
    /// boundary; surfaces as a server fault once retries are exhausted.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// A persisted record failed to decode. Not retryable.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Result of a conditional status transition on one seat entry.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    /// Precondition held and the entry was updated; `version` is the new
    /// version after the write.
    Applied { version: i64 },
    /// The entry exists but its current status did not match the expected
    /// `from` status. Carries what was actually observed.
    Conflict { actual: SeatStatus },
    /// No entry exists for this (event, seat) pair.
    Missing,
}

/// Per-(event, seat) ledger persistence.
#[async_trait]
pub trait SeatStore: Send + Sync {
    /// Batch create-if-absent. Entries that already exist are left untouched.
    /// Returns how many entries were actually created.
    async fn create_seats_if_absent(&self, entries: &[SeatEntry]) -> Result<u64, StoreError>;

    async fn get_seat(&self, event_id: &str, seat_id: &str)
        -> Result<Option<SeatEntry>, StoreError>;

    /// All entries for an event, ordered by seat id. One pass, safe to
    /// re-issue.
    async fn list_seats(&self, event_id: &str) -> Result<Vec<SeatEntry>, StoreError>;

    /// The atomic check-and-set this whole core is built on: move the entry
    /// from `from` to `to` only if its current status equals `from`.
    /// `held_until` is stored when `to` is HELD and cleared otherwise.
    async fn update_seat_status(
        &self,
        event_id: &str,
        seat_id: &str,
        from: SeatStatus,
        to: SeatStatus,
        held_until: Option<DateTime<Utc>>,
    ) -> Result<TransitionOutcome, StoreError>;

    /// Batch delete, used by deprovisioning.
    async fn delete_seats(&self, event_id: &str, seat_ids: &[String]) -> Result<(), StoreError>;
}

/// Booking record persistence. Single writer per booking_id.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn put_booking(&self, record: &BookingRecord) -> Result<(), StoreError>;

    async fn get_booking(&self, booking_id: &str) -> Result<Option<BookingRecord>, StoreError>;

    /// Bookings for a user, most recent first.
    async fn list_bookings_by_user(&self, user_id: &str)
        -> Result<Vec<BookingRecord>, StoreError>;

    async fn list_bookings_by_event(
        &self,
        event_id: &str,
    ) -> Result<Vec<BookingRecord>, StoreError>;

    /// Bookings across every event playing at one theatre, most recent
    /// first. Matches on the denormalized `theatre_name` field.
    async fn list_bookings_by_theatre(
        &self,
        theatre_name: &str,
    ) -> Result<Vec<BookingRecord>, StoreError>;

    /// Bookings across every event showing one movie, most recent first.
    /// Matches on the denormalized `movie_title` field.
    async fn list_bookings_by_movie(
        &self,
        movie_title: &str,
    ) -> Result<Vec<BookingRecord>, StoreError>;

    /// Returns `false` when no record with this id exists.
    async fn update_booking_seats(
        &self,
        booking_id: &str,
        seats: &[String],
        updated_at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Returns `false` when no record with this id exists.
    async fn set_booking_status(
        &self,
        booking_id: &str,
        status: BookingStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;
}

/// Minimal read model of the external catalog: event metadata registered at
/// provisioning time so booking creation can denormalize it.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Upsert: re-provisioning an existing event refreshes its metadata.
    async fn put_event(&self, event: &EventInfo) -> Result<(), StoreError>;

    async fn get_event(&self, event_id: &str) -> Result<Option<EventInfo>, StoreError>;

    async fn list_events(&self) -> Result<Vec<EventInfo>, StoreError>;

    async fn delete_event(&self, event_id: &str) -> Result<(), StoreError>;
}
