use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use crate::error::Error;
use crate::models::{SeatEntry, SeatStatus};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/events/{event_id}/seats", get(get_event_seats))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SeatResponse {
    seat_id: String,
    status: SeatStatus,
    price: f64,
}

impl From<SeatEntry> for SeatResponse {
    fn from(e: SeatEntry) -> Self {
        SeatResponse {
            seat_id: e.seat_id,
            status: e.status,
            price: e.price,
        }
    }
}

// GET /api/events/{event_id}/seats
async fn get_event_seats(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, Error> {
    let seats = state.ledger.list_by_event(&event_id).await?;
    if seats.is_empty() {
        return Err(Error::NotFound("event"));
    }

    let payload: Vec<SeatResponse> = seats.into_iter().map(SeatResponse::from).collect();
    Ok(Json(json!({
        "success": true,
        "count": payload.len(),
        "seats": payload,
    })))
}
