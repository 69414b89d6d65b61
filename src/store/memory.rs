//! In-memory store backend.
//!
//! Single-process, no durability. Backs the test suite and local
//! development. The conditional transition is atomic because every mutation
//! happens under one write lock; the lock is never held across an await.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{BookingRecord, BookingStatus, EventInfo, SeatEntry, SeatStatus};

use super::{BookingStore, EventStore, SeatStore, StoreError, TransitionOutcome};

fn poison_err<T>(_: PoisonError<T>) -> StoreError {
    StoreError::Unavailable("lock poisoned".to_string())
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    seats: RwLock<HashMap<(String, String), SeatEntry>>,
    bookings: RwLock<HashMap<String, BookingRecord>>,
    events: RwLock<HashMap<String, EventInfo>>,
    fail_next_booking_put: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `put_booking` fail with `Unavailable`. Used by tests to
    /// exercise the release-after-persist-failure compensation path.
    pub fn fail_next_booking_put(&self) {
        self.fail_next_booking_put.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl SeatStore for MemoryStore {
    async fn create_seats_if_absent(&self, entries: &[SeatEntry]) -> Result<u64, StoreError> {
        let mut seats = self.seats.write().map_err(poison_err)?;
        let mut created = 0;
        for entry in entries {
            let key = (entry.event_id.clone(), entry.seat_id.clone());
            if !seats.contains_key(&key) {
                seats.insert(key, entry.clone());
                created += 1;
            }
        }
        Ok(created)
    }

    async fn get_seat(
        &self,
        event_id: &str,
        seat_id: &str,
    ) -> Result<Option<SeatEntry>, StoreError> {
        let seats = self.seats.read().map_err(poison_err)?;
        Ok(seats
            .get(&(event_id.to_string(), seat_id.to_string()))
            .cloned())
    }

    async fn list_seats(&self, event_id: &str) -> Result<Vec<SeatEntry>, StoreError> {
        let seats = self.seats.read().map_err(poison_err)?;
        let mut out: Vec<SeatEntry> = seats
            .values()
            .filter(|e| e.event_id == event_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.seat_id.cmp(&b.seat_id));
        Ok(out)
    }

    async fn update_seat_status(
        &self,
        event_id: &str,
        seat_id: &str,
        from: SeatStatus,
        to: SeatStatus,
        held_until: Option<DateTime<Utc>>,
    ) -> Result<TransitionOutcome, StoreError> {
        let mut seats = self.seats.write().map_err(poison_err)?;
        let key = (event_id.to_string(), seat_id.to_string());
        match seats.get_mut(&key) {
            None => Ok(TransitionOutcome::Missing),
            Some(entry) if entry.status != from => Ok(TransitionOutcome::Conflict {
                actual: entry.status,
            }),
            Some(entry) => {
                entry.status = to;
                entry.held_until = held_until;
                entry.version += 1;
                entry.updated_at = Utc::now();
                Ok(TransitionOutcome::Applied {
                    version: entry.version,
                })
            }
        }
    }

    async fn delete_seats(&self, event_id: &str, seat_ids: &[String]) -> Result<(), StoreError> {
        let mut seats = self.seats.write().map_err(poison_err)?;
        for seat_id in seat_ids {
            seats.remove(&(event_id.to_string(), seat_id.clone()));
        }
        Ok(())
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn put_booking(&self, record: &BookingRecord) -> Result<(), StoreError> {
        if self.fail_next_booking_put.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }
        let mut bookings = self.bookings.write().map_err(poison_err)?;
        bookings.insert(record.booking_id.clone(), record.clone());
        Ok(())
    }

    async fn get_booking(&self, booking_id: &str) -> Result<Option<BookingRecord>, StoreError> {
        let bookings = self.bookings.read().map_err(poison_err)?;
        Ok(bookings.get(booking_id).cloned())
    }

    async fn list_bookings_by_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<BookingRecord>, StoreError> {
        let bookings = self.bookings.read().map_err(poison_err)?;
        let mut out: Vec<BookingRecord> = bookings
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn list_bookings_by_event(
        &self,
        event_id: &str,
    ) -> Result<Vec<BookingRecord>, StoreError> {
        let bookings = self.bookings.read().map_err(poison_err)?;
        let mut out: Vec<BookingRecord> = bookings
            .values()
            .filter(|b| b.event_id == event_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn list_bookings_by_theatre(
        &self,
        theatre_name: &str,
    ) -> Result<Vec<BookingRecord>, StoreError> {
        let bookings = self.bookings.read().map_err(poison_err)?;
        let mut out: Vec<BookingRecord> = bookings
            .values()
            .filter(|b| b.theatre_name == theatre_name)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn list_bookings_by_movie(
        &self,
        movie_title: &str,
    ) -> Result<Vec<BookingRecord>, StoreError> {
        let bookings = self.bookings.read().map_err(poison_err)?;
        let mut out: Vec<BookingRecord> = bookings
            .values()
            .filter(|b| b.movie_title == movie_title)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn update_booking_seats(
        &self,
        booking_id: &str,
        seats: &[String],
        updated_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut bookings = self.bookings.write().map_err(poison_err)?;
        match bookings.get_mut(booking_id) {
            Some(record) => {
                record.seats = seats.to_vec();
                record.updated_at = updated_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_booking_status(
        &self,
        booking_id: &str,
        status: BookingStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut bookings = self.bookings.write().map_err(poison_err)?;
        match bookings.get_mut(booking_id) {
            Some(record) => {
                record.status = status;
                record.updated_at = updated_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn put_event(&self, event: &EventInfo) -> Result<(), StoreError> {
        let mut events = self.events.write().map_err(poison_err)?;
        let mut record = event.clone();
        // Upsert refreshes metadata but keeps the original creation time.
        if let Some(existing) = events.get(&event.event_id) {
            record.created_at = existing.created_at;
        }
        events.insert(event.event_id.clone(), record);
        Ok(())
    }

    async fn get_event(&self, event_id: &str) -> Result<Option<EventInfo>, StoreError> {
        let events = self.events.read().map_err(poison_err)?;
        Ok(events.get(event_id).cloned())
    }

    async fn list_events(&self) -> Result<Vec<EventInfo>, StoreError> {
        let events = self.events.read().map_err(poison_err)?;
        let mut out: Vec<EventInfo> = events.values().cloned().collect();
        out.sort_by(|a, b| a.event_id.cmp(&b.event_id));
        Ok(out)
    }

    async fn delete_event(&self, event_id: &str) -> Result<(), StoreError> {
        let mut events = self.events.write().map_err(poison_err)?;
        events.remove(event_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn conditional_transition_is_first_committer_wins() {
        let store = MemoryStore::new();
        store
            .create_seats_if_absent(&[SeatEntry::available("e1", "A1", 10.0)])
            .await
            .unwrap();

        let first = store
            .update_seat_status("e1", "A1", SeatStatus::Available, SeatStatus::Booked, None)
            .await
            .unwrap();
        assert!(matches!(first, TransitionOutcome::Applied { version: 2 }));

        let second = store
            .update_seat_status("e1", "A1", SeatStatus::Available, SeatStatus::Booked, None)
            .await
            .unwrap();
        assert_eq!(
            second,
            TransitionOutcome::Conflict {
                actual: SeatStatus::Booked
            }
        );
    }

    #[tokio::test]
    async fn transition_on_absent_entry_reports_missing() {
        let store = MemoryStore::new();
        let out = store
            .update_seat_status("e1", "Z9", SeatStatus::Available, SeatStatus::Booked, None)
            .await
            .unwrap();
        assert_eq!(out, TransitionOutcome::Missing);
    }

    #[tokio::test]
    async fn create_if_absent_never_overwrites() {
        let store = MemoryStore::new();
        let entry = SeatEntry::available("e1", "A1", 10.0);
        assert_eq!(store.create_seats_if_absent(&[entry.clone()]).await.unwrap(), 1);

        store
            .update_seat_status("e1", "A1", SeatStatus::Available, SeatStatus::Booked, None)
            .await
            .unwrap();

        // Re-running provisioning must not resurrect the seat as AVAILABLE.
        assert_eq!(store.create_seats_if_absent(&[entry]).await.unwrap(), 0);
        let seat = store.get_seat("e1", "A1").await.unwrap().unwrap();
        assert_eq!(seat.status, SeatStatus::Booked);
    }

    fn event(event_id: &str, price: f64) -> EventInfo {
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

    #[tokio::test]
    async fn booking_writes_report_whether_a_record_matched() {
        let store = MemoryStore::new();

        let missed = store
            .set_booking_status("booking_missing", BookingStatus::Cancelled, Utc::now())
            .await
            .unwrap();
        assert!(!missed);
        let missed = store
            .update_booking_seats("booking_missing", &["A1".to_string()], Utc::now())
            .await
            .unwrap();
        assert!(!missed);

        let record = BookingRecord::confirmed("u1", &event("e1", 10.0), vec!["A1".to_string()], 10.0);
        store.put_booking(&record).await.unwrap();

        let hit = store
            .set_booking_status(&record.booking_id, BookingStatus::Cancelled, Utc::now())
            .await
            .unwrap();
        assert!(hit);
    }

    #[tokio::test]
    async fn put_event_refreshes_existing_metadata() {
        let store = MemoryStore::new();
        store.put_event(&event("e1", 10.0)).await.unwrap();
        store.put_event(&event("e1", 12.5)).await.unwrap();

        let stored = store.get_event("e1").await.unwrap().unwrap();
        assert_eq!(stored.price, 12.5);
    }
}
