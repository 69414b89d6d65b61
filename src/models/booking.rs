use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::event::EventInfo;

/// Lifecycle of a booking record. Cancellation tombstones the record instead
/// of deleting it, so the booking history survives as a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            "CANCELLED" => Ok(BookingStatus::Cancelled),
            other => Err(format!("unknown booking status: {other}")),
        }
    }
}

/// Confirmed reservation. Written only after the coordinator has moved every
/// requested seat to BOOKED. Event/movie/theatre fields are denormalized at
/// creation time for read efficiency; they are a cache, not a source of truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRecord {
    pub booking_id: String,
    pub user_id: String,
    pub event_id: String,
    /// Seat ids, sorted ascending, never empty.
    pub seats: Vec<String>,
    pub total_amount: f64,
    pub status: BookingStatus,
    pub movie_title: String,
    pub theatre_name: String,
    pub show_date: String,
    pub show_time: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BookingRecord {
    pub fn confirmed(
        user_id: &str,
        event: &EventInfo,
        seats: Vec<String>,
        total_amount: f64,
    ) -> Self {
        let now = Utc::now();
        BookingRecord {
            booking_id: format!("booking_{}", Uuid::new_v4()),
            user_id: user_id.to_string(),
            event_id: event.event_id.clone(),
            seats,
            total_amount,
            status: BookingStatus::Confirmed,
            movie_title: event.movie_title.clone(),
            theatre_name: event.theatre_name.clone(),
            show_date: event.show_date.clone(),
            show_time: event.show_time.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_live(&self) -> bool {
        self.status == BookingStatus::Confirmed
    }
}
