//! Client identity extractors.
//!
//! Each browser gets a random client id stored in its session. The id names
//! the durable store holding that client's cart.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
};
use tower_sessions::Session;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::session_keys;

/// Extractor that returns the client id, assigning a new one if needed.
///
/// Use on handlers that write client state.
///
/// # Example
///
/// ```rust,ignore
/// async fn add(CartClient(client_id): CartClient) -> impl IntoResponse {
///     format!("cart owner {client_id}")
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CartClient(pub Uuid);

impl<S> FromRequestParts<S> for CartClient
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;

        if let Some(client_id) = session.get::<Uuid>(session_keys::CLIENT_ID).await? {
            return Ok(Self(client_id));
        }

        let client_id = Uuid::new_v4();
        session.insert(session_keys::CLIENT_ID, client_id).await?;
        tracing::debug!(%client_id, "assigned new client id");

        Ok(Self(client_id))
    }
}

/// Extractor that returns the client id if one was already assigned.
///
/// Unlike `CartClient`, this never creates a session.
#[derive(Debug, Clone, Copy)]
pub struct OptionalCartClient(pub Option<Uuid>);

impl<S> FromRequestParts<S> for OptionalCartClient
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let client_id = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<Uuid>(session_keys::CLIENT_ID)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(client_id))
    }
}
