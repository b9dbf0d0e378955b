//! Request extractors.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::error::Error;

/// The calling user's identity, installed by the external auth layer as an
/// `x-user-id` header. Handlers that work anonymously take
/// `Option<Identity>`.
#[derive(Debug, Clone, Copy)]
pub struct Identity(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get("x-user-id")
            .ok_or(Error::Unauthorized)?
            .to_str()
            .map_err(|_| Error::Unauthorized)?;
        let user = raw.parse().map_err(|_| Error::Unauthorized)?;
        Ok(Self(user))
    }
}
