//! Current user resolution.
//!
//! The identity provider gateway in front of this service authenticates
//! the caller and forwards the result in the `x-user-id` and
//! `x-user-email` headers. A missing or malformed id means no user.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use caselab_types::{CurrentUser, USER_EMAIL_HEADER, USER_ID_HEADER, UserId};

use crate::error::ApiError;

/// Resolve the caller from gateway headers.
pub fn current_user(headers: &HeaderMap) -> Option<CurrentUser> {
    let id = headers
        .get(USER_ID_HEADER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<UserId>()
        .ok()?;

    let email = headers
        .get(USER_EMAIL_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned);

    Some(CurrentUser { id, email })
}

/// Extractor that rejects the request with 401 when there is no user.
#[derive(Debug, Clone)]
pub struct Authenticated(pub CurrentUser);

impl<S: Send + Sync> FromRequestParts<S> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_user(&parts.headers)
            .map(Self)
            .ok_or(ApiError::Unauthorized)
    }
}
