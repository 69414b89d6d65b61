use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::error::Error;
use crate::middleware::AuthUser;
use crate::models::EventInfo;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/events", post(provision_event))
        .route("/admin/events/{event_id}", delete(deprovision_event))
        .route("/admin/events/{event_id}/bookings", get(event_bookings))
        .route("/admin/events/{event_id}/summary", get(event_summary))
        .route("/admin/theatres/{theatre_name}/bookings", get(theatre_bookings))
        .route("/admin/movies/{movie_title}/bookings", get(movie_bookings))
        .route("/admin/reconcile", post(reconcile))
}

fn require_admin(user: &AuthUser) -> Result<(), Error> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(Error::Unauthorized)
    }
}

// POST /api/admin/events
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProvisionEventRequest {
    event_id: String,
    movie_title: String,
    theatre_name: String,
    show_date: String,
    show_time: String,
    price: f64,
    seat_layout: Vec<String>,
}

async fn provision_event(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<ProvisionEventRequest>,
) -> Result<impl IntoResponse, Error> {
    require_admin(&user)?;

    if req.event_id.trim().is_empty() {
        return Err(Error::Validation("eventId is required".to_string()));
    }

    let event = EventInfo {
        event_id: req.event_id,
        movie_title: req.movie_title,
        theatre_name: req.theatre_name,
        show_date: req.show_date,
        show_time: req.show_time,
        price: req.price,
        created_at: Utc::now(),
    };
    let report = state.provisioner.provision(event, &req.seat_layout).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Event provisioned, seats generated",
            "report": report,
        })),
    ))
}

// DELETE /api/admin/events/{event_id}
async fn deprovision_event(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, Error> {
    require_admin(&user)?;
    let deleted = state.provisioner.deprovision(&event_id).await?;
    Ok(Json(json!({ "success": true, "seatsDeleted": deleted })))
}

// GET /api/admin/events/{event_id}/bookings
async fn event_bookings(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, Error> {
    require_admin(&user)?;
    let bookings = state.bookings.list_by_event(&event_id).await?;
    Ok(Json(json!({
        "success": true,
        "count": bookings.len(),
        "bookings": bookings,
    })))
}

// GET /api/admin/theatres/{theatre_name}/bookings
async fn theatre_bookings(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(theatre_name): Path<String>,
) -> Result<impl IntoResponse, Error> {
    require_admin(&user)?;
    let bookings = state.bookings.list_by_theatre(&theatre_name).await?;
    Ok(Json(json!({
        "success": true,
        "count": bookings.len(),
        "bookings": bookings,
    })))
}

// GET /api/admin/movies/{movie_title}/bookings
async fn movie_bookings(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(movie_title): Path<String>,
) -> Result<impl IntoResponse, Error> {
    require_admin(&user)?;
    let bookings = state.bookings.list_by_movie(&movie_title).await?;
    Ok(Json(json!({
        "success": true,
        "count": bookings.len(),
        "bookings": bookings,
    })))
}

// GET /api/admin/events/{event_id}/summary
async fn event_summary(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, Error> {
    require_admin(&user)?;
    let summary = state.bookings.summary(&event_id).await?;
    Ok(Json(json!({ "success": true, "summary": summary })))
}

// POST /api/admin/reconcile: on-demand stuck-seat sweep, the same pass the
// background task runs on its interval.
async fn reconcile(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, Error> {
    require_admin(&user)?;
    let report = state.reconcile.sweep_all().await?;
    Ok(Json(json!({ "success": true, "report": report })))
}
