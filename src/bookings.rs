//! Booking Record Store: the durable record of a confirmed reservation.
//!
//! A record is written only after the coordinator has claimed every seat, and
//! cancellation releases seats *before* tombstoning the record; while any
//! seat is still claimed, the record stays behind as the system of record for
//! which seats belong to it.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{error, info};

use crate::coordinator::{ClaimTarget, Coordinator};
use crate::error::Error;
use crate::middleware::AuthUser;
use crate::models::{BookingRecord, BookingStatus};
use crate::store::{BookingStore, EventStore};

#[derive(Debug)]
pub struct CreateBooking {
    pub event_id: String,
    pub seat_ids: Vec<String>,
    pub total_amount: f64,
}

/// Admin aggregation over an event's confirmed bookings.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub event_id: String,
    pub bookings: usize,
    pub seats_sold: usize,
    pub revenue: f64,
}

#[derive(Clone)]
pub struct BookingService {
    coordinator: Coordinator,
    bookings: Arc<dyn BookingStore>,
    events: Arc<dyn EventStore>,
}

impl BookingService {
    pub fn new(
        coordinator: Coordinator,
        bookings: Arc<dyn BookingStore>,
        events: Arc<dyn EventStore>,
    ) -> Self {
        BookingService {
            coordinator,
            bookings,
            events,
        }
    }

    /// Claims the seats, then persists the record. If persistence fails the
    /// just-claimed seats are released again, so booking creation is
    /// all-or-nothing end to end.
    pub async fn create(&self, user_id: &str, req: CreateBooking) -> Result<BookingRecord, Error> {
        if req.seat_ids.is_empty() {
            return Err(Error::Validation("seats are required".to_string()));
        }
        if req.total_amount <= 0.0 {
            return Err(Error::Validation("totalAmount must be positive".to_string()));
        }

        let event = self
            .events
            .get_event(&req.event_id)
            .await?
            .ok_or(Error::NotFound("event"))?;

        let mut seats = req.seat_ids.clone();
        seats.sort();
        seats.dedup();

        self.coordinator
            .claim(&req.event_id, &seats, ClaimTarget::Book)
            .await?;

        let record = BookingRecord::confirmed(user_id, &event, seats.clone(), req.total_amount);

        if let Err(e) = self.bookings.put_booking(&record).await {
            error!(
                booking_id = %record.booking_id, error = %e,
                "failed to persist booking, releasing claimed seats"
            );
            if let Err(release_err) = self.coordinator.release(&req.event_id, &seats).await {
                error!(
                    event_id = %req.event_id, error = %release_err,
                    "release after failed persist did not complete, reconciliation will recover"
                );
            }
            return Err(Error::StoreUnavailable);
        }

        info!(
            booking_id = %record.booking_id, event_id = %record.event_id,
            seats = record.seats.len(), "booking confirmed"
        );
        Ok(record)
    }

    pub async fn get(&self, booking_id: &str) -> Result<BookingRecord, Error> {
        self.bookings
            .get_booking(booking_id)
            .await?
            .ok_or(Error::NotFound("booking"))
    }

    pub async fn list_by_user(&self, user_id: &str) -> Result<Vec<BookingRecord>, Error> {
        Ok(self.bookings.list_bookings_by_user(user_id).await?)
    }

    pub async fn list_by_event(&self, event_id: &str) -> Result<Vec<BookingRecord>, Error> {
        Ok(self.bookings.list_bookings_by_event(event_id).await?)
    }

    /// All bookings taken at one theatre, across its events.
    pub async fn list_by_theatre(&self, theatre_name: &str) -> Result<Vec<BookingRecord>, Error> {
        Ok(self.bookings.list_bookings_by_theatre(theatre_name).await?)
    }

    /// All bookings for one movie, across theatres and showtimes.
    pub async fn list_by_movie(&self, movie_title: &str) -> Result<Vec<BookingRecord>, Error> {
        Ok(self.bookings.list_bookings_by_movie(movie_title).await?)
    }

    pub async fn summary(&self, event_id: &str) -> Result<EventSummary, Error> {
        let records = self.bookings.list_bookings_by_event(event_id).await?;
        let live: Vec<&BookingRecord> = records.iter().filter(|b| b.is_live()).collect();
        Ok(EventSummary {
            event_id: event_id.to_string(),
            bookings: live.len(),
            seats_sold: live.iter().map(|b| b.seats.len()).sum(),
            revenue: live.iter().map(|b| b.total_amount).sum(),
        })
    }

    /// Swaps the booking onto `new_seats`, then persists the new seat list.
    /// If the swap fails the record is left untouched and the original seats
    /// stay claimed.
    pub async fn update_seats(
        &self,
        booking_id: &str,
        new_seats: Vec<String>,
        user: &AuthUser,
    ) -> Result<BookingRecord, Error> {
        if new_seats.is_empty() {
            return Err(Error::Validation("newSeats array is required".to_string()));
        }

        let mut record = self.get(booking_id).await?;
        authorize(&record, user)?;
        if record.status == BookingStatus::Cancelled {
            return Err(Error::Validation("booking is cancelled".to_string()));
        }

        let mut seats = new_seats;
        seats.sort();
        seats.dedup();

        self.coordinator
            .swap(&record.event_id, &record.seats, &seats)
            .await?;

        let now = Utc::now();
        let matched = self
            .bookings
            .update_booking_seats(booking_id, &seats, now)
            .await?;
        if !matched {
            // The record vanished between the read and the write. The new
            // seats are unreferenced now; the sweep reclaims them.
            error!(booking_id, "booking disappeared during seat update");
            return Err(Error::NotFound("booking"));
        }

        record.seats = seats;
        record.updated_at = now;
        info!(booking_id, "booking seats updated");
        Ok(record)
    }

    /// Releases every seat, confirms the release, then tombstones the record.
    /// A partial release aborts before the record is touched so it keeps
    /// naming the seats that are still claimed; cancelling an already
    /// cancelled booking is a no-op.
    pub async fn cancel(&self, booking_id: &str, user: &AuthUser) -> Result<(), Error> {
        let record = self.get(booking_id).await?;
        authorize(&record, user)?;
        if record.status == BookingStatus::Cancelled {
            return Ok(());
        }

        let outcome = self
            .coordinator
            .release(&record.event_id, &record.seats)
            .await?;

        let matched = self
            .bookings
            .set_booking_status(booking_id, BookingStatus::Cancelled, Utc::now())
            .await?;
        if !matched {
            error!(booking_id, "booking disappeared during cancellation");
            return Err(Error::NotFound("booking"));
        }

        info!(
            booking_id,
            released = outcome.released,
            already_free = outcome.already_free,
            "booking cancelled"
        );
        Ok(())
    }
}

fn authorize(record: &BookingRecord, user: &AuthUser) -> Result<(), Error> {
    if user.is_admin() || record.user_id == user.user_id {
        Ok(())
    } else {
        Err(Error::Unauthorized)
    }
}
