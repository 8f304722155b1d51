//! Order route handlers.
//!
//! Orders are only visible to the client that placed them; anyone else gets
//! a 404.

use axum::{
    Json,
    extract::{Path, State},
};
use kiosk_core::{OrderId, OrderStatus};
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::error::Result;
use crate::middleware::OptionalCartClient;
use crate::orders::{Order, OrderError};
use crate::state::AppState;

/// Order display data.
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    /// Whether the client may still cancel the order.
    pub cancellable: bool,
    /// Whether the order has reached a final status.
    pub closed: bool,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        Self {
            cancellable: order.status.is_cancellable(),
            closed: order.status.is_terminal(),
            order,
        }
    }
}

/// Fetch an order owned by `client_id`.
fn owned_order(state: &AppState, client_id: Option<Uuid>, id: OrderId) -> Result<Order> {
    let order = state.orders().get(id)?;
    if Some(order.client_id) == client_id {
        Ok(order)
    } else {
        Err(OrderError::NotFound(id).into())
    }
}

/// Show an order.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    OptionalCartClient(client_id): OptionalCartClient,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderView>> {
    owned_order(&state, client_id, id).map(|order| Json(order.into()))
}

/// Cancel an order that has not shipped yet.
#[instrument(skip(state))]
pub async fn cancel(
    State(state): State<AppState>,
    OptionalCartClient(client_id): OptionalCartClient,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderView>> {
    owned_order(&state, client_id, id)?;
    let order = state.orders().update_status(id, OrderStatus::Cancelled)?;
    Ok(Json(order.into()))
}
