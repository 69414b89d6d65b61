use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Availability state of one (event, seat) ledger entry.
///
/// HELD is a short-lived claim with an expiry; expired holds are reclaimed
/// by the reconciliation sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatStatus {
    Available,
    Held,
    Booked,
}

impl SeatStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeatStatus::Available => "AVAILABLE",
            SeatStatus::Held => "HELD",
            SeatStatus::Booked => "BOOKED",
        }
    }
}

impl fmt::Display for SeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeatStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AVAILABLE" => Ok(SeatStatus::Available),
            "HELD" => Ok(SeatStatus::Held),
            "BOOKED" => Ok(SeatStatus::Booked),
            other => Err(format!("unknown seat status: {other}")),
        }
    }
}

/// One seat ledger entry. Identity is the (event_id, seat_id) pair and is
/// immutable once provisioned; `version` advances on every transition and
/// backs the optimistic-concurrency precondition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatEntry {
    pub event_id: String,
    pub seat_id: String,
    pub status: SeatStatus,
    pub price: f64,
    pub version: i64,
    pub held_until: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl SeatEntry {
    /// Fresh AVAILABLE entry as the provisioner creates it.
    pub fn available(event_id: &str, seat_id: &str, price: f64) -> Self {
        SeatEntry {
            event_id: event_id.to_string(),
            seat_id: seat_id.to_string(),
            status: SeatStatus::Available,
            price,
            version: 1,
            held_until: None,
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        for s in [SeatStatus::Available, SeatStatus::Held, SeatStatus::Booked] {
            assert_eq!(s.as_str().parse::<SeatStatus>().unwrap(), s);
        }
        assert!("FREE".parse::<SeatStatus>().is_err());
    }
}
