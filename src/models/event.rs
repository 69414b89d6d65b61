use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event (showtime) metadata, owned by the external catalog collaborator and
/// read here at provisioning and booking time only. The seat layout itself is
/// not stored on the event; it is materialized into ledger entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInfo {
    pub event_id: String,
    pub movie_title: String,
    pub theatre_name: String,
    pub show_date: String,
    pub show_time: String,
    pub price: f64,
    pub created_at: DateTime<Utc>,
}
