//! services/api/src/web/identity.rs
//!
//! Extracts the caller's identity from the `x-user-id` header.
//!
//! The id arrives already verified by the identity provider in front of this
//! service; nothing here authenticates or authorizes.

use axum::extract::FromRequestParts;
use axum::http::{request::Parts, StatusCode};
use uuid::Uuid;

/// The id of the user a request acts for.
#[derive(Debug, Clone, Copy)]
pub struct UserId(pub Uuid);

impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                (
                    StatusCode::BAD_REQUEST,
                    "x-user-id header is required".to_string(),
                )
            })?;

        let user_id = Uuid::parse_str(raw).map_err(|_| {
            (
                StatusCode::BAD_REQUEST,
                "Invalid x-user-id format".to_string(),
            )
        })?;

        Ok(UserId(user_id))
    }
}
