use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::coordinator::CoordinatorError;
use crate::ledger::LedgerError;
use crate::store::StoreError;

/// Service-level error taxonomy. The split that matters to clients is
/// "try different seats" (SeatConflict) versus "try again later"
/// (StoreUnavailable); everything else is ordinary 4xx plumbing.
#[derive(Debug, Error)]
pub enum Error {
    #[error("seats unavailable: {}", seats.join(", "))]
    SeatConflict { seats: Vec<String> },
    #[error("seat {seat_id} not found")]
    SeatNotFound { seat_id: String },
    #[error("{0}")]
    Validation(String),
    #[error("service temporarily unavailable, try again later")]
    StoreUnavailable,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("not allowed")]
    Unauthorized,
}

impl Error {
    fn status(&self) -> StatusCode {
        match self {
            Error::SeatConflict { .. } => StatusCode::CONFLICT,
            Error::SeatNotFound { .. } | Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Error::Unauthorized => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let body = json!({ "success": false, "message": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}

impl From<CoordinatorError> for Error {
    fn from(e: CoordinatorError) -> Self {
        match e {
            CoordinatorError::SeatsUnavailable { seats } => Error::SeatConflict { seats },
            CoordinatorError::SeatNotFound { seat_id } => Error::SeatNotFound { seat_id },
            CoordinatorError::StoreUnavailable => Error::StoreUnavailable,
        }
    }
}

impl From<LedgerError> for Error {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::Conflict { seat_id, .. } => Error::SeatConflict {
                seats: vec![seat_id],
            },
            LedgerError::NotFound { seat_id } => Error::SeatNotFound { seat_id },
            LedgerError::Unavailable => Error::StoreUnavailable,
        }
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        tracing::error!(error = %e, "store error");
        Error::StoreUnavailable
    }
}
