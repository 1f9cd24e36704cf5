//! Error types for the state resource API.
//!
//! [`ApiError`] unifies all failure modes into a single enum that
//! can be converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use caselab_db::DbError;

/// Errors that can occur in the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The caller presented no usable identity.
    #[error("unauthorized")]
    Unauthorized,

    /// The resource does not exist or is not owned by the caller.
    #[error("not found: {0}")]
    NotFound(String),

    /// A UUID could not be parsed from the request path.
    #[error("invalid UUID: {0}")]
    InvalidUuid(String),

    /// The request body was not the expected JSON.
    #[error("invalid body: {message}")]
    InvalidBody {
        /// Status chosen by the JSON extractor (400, 415 or 422).
        status: StatusCode,
        /// What was wrong with the body.
        message: String,
    },

    /// The backing store failed.
    #[error("storage error: {0}")]
    Storage(#[from] DbError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidBody {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, String::from("unauthorized")),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::InvalidUuid(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::InvalidBody { status, message } => (*status, message.clone()),
            Self::Storage(e) => {
                tracing::error!(error = %e, "Storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, String::from("storage unavailable"))
            }
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
