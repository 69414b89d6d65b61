use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::bookings::CreateBooking;
use crate::error::Error;
use crate::middleware::AuthUser;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", post(create_booking))
        .route("/bookings", get(my_bookings))
        .route("/bookings/{booking_id}", get(get_booking))
        .route("/bookings/{booking_id}", put(update_booking))
        .route("/bookings/{booking_id}", delete(cancel_booking))
}

/* ---------- requests ---------- */

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateBookingRequest {
    event_id: String,
    seats: Vec<String>,
    total_amount: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateBookingRequest {
    new_seats: Vec<String>,
}

/* ---------- handlers ---------- */

// POST /api/bookings
async fn create_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, Error> {
    let booking = state
        .bookings
        .create(
            &user.user_id,
            CreateBooking {
                event_id: req.event_id,
                seat_ids: req.seats,
                total_amount: req.total_amount,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Booking confirmed successfully",
            "booking": booking,
        })),
    ))
}

// GET /api/bookings
async fn my_bookings(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, Error> {
    let bookings = state.bookings.list_by_user(&user.user_id).await?;
    Ok(Json(json!({
        "success": true,
        "count": bookings.len(),
        "bookings": bookings,
    })))
}

// GET /api/bookings/{booking_id}
async fn get_booking(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, Error> {
    let booking = state.bookings.get(&booking_id).await?;
    Ok(Json(json!({ "success": true, "booking": booking })))
}

// PUT /api/bookings/{booking_id}
async fn update_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(booking_id): Path<String>,
    Json(req): Json<UpdateBookingRequest>,
) -> Result<impl IntoResponse, Error> {
    let booking = state
        .bookings
        .update_seats(&booking_id, req.new_seats, &user)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Booking updated successfully",
        "booking": booking,
    })))
}

// DELETE /api/bookings/{booking_id}
async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, Error> {
    state.bookings.cancel(&booking_id, &user).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Booking cancelled",
    })))
}
