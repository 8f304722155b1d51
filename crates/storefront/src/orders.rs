//! In-memory order service.
//!
//! Receives order requests built from a client's cart, assigns sequential
//! order ids and tracks each order's status.

use std::sync::RwLock;

use chrono::{DateTime, Utc};
use kiosk_core::cart::{OrderLine, OrderRequest};
use kiosk_core::{OrderId, OrderStatus, Price, StatusTransitionError};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised by the order book.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("order {0} not found")]
    NotFound(OrderId),
    #[error(transparent)]
    Transition(#[from] StatusTransitionError),
    #[error("order book unavailable")]
    Unavailable,
}

/// A placed order.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    /// Client identity that placed the order.
    #[serde(skip)]
    pub client_id: Uuid,
    pub lines: Vec<OrderLine>,
    pub total: Price,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct OrderBookInner {
    last_id: i32,
    orders: Vec<Order>,
}

/// Thread-safe store of placed orders.
#[derive(Debug, Default)]
pub struct OrderBook {
    inner: RwLock<OrderBookInner>,
}

impl OrderBook {
    /// Create an empty order book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new pending order for `client_id`.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::Unavailable`] if the book's lock is poisoned.
    pub fn place(&self, client_id: Uuid, request: &OrderRequest) -> Result<Order, OrderError> {
        let mut inner = self.inner.write().map_err(|_| OrderError::Unavailable)?;

        inner.last_id += 1;
        let now = Utc::now();
        let order = Order {
            id: OrderId::new(inner.last_id),
            client_id,
            lines: request.lines.clone(),
            total: request.total,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        inner.orders.push(order.clone());

        tracing::info!(order_id = %order.id, total = %order.total, "order placed");
        Ok(order)
    }

    /// Fetch an order by id.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::NotFound`] for unknown ids.
    pub fn get(&self, id: OrderId) -> Result<Order, OrderError> {
        let inner = self.inner.read().map_err(|_| OrderError::Unavailable)?;
        inner
            .orders
            .iter()
            .find(|order| order.id == id)
            .cloned()
            .ok_or(OrderError::NotFound(id))
    }

    /// Move an order to `next`, enforcing the status state machine.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::NotFound`] for unknown ids and
    /// [`OrderError::Transition`] for illegal transitions.
    pub fn update_status(&self, id: OrderId, next: OrderStatus) -> Result<Order, OrderError> {
        let mut inner = self.inner.write().map_err(|_| OrderError::Unavailable)?;
        let order = inner
            .orders
            .iter_mut()
            .find(|order| order.id == id)
            .ok_or(OrderError::NotFound(id))?;

        order.status = order.status.transition(next)?;
        order.updated_at = Utc::now();

        tracing::info!(order_id = %id, status = %order.status, "order status changed");
        Ok(order.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use kiosk_core::cart::{CartAggregator, MemoryStore};
    use kiosk_core::{CurrencyCode, Product, ProductId};

    use super::*;

    fn request() -> OrderRequest {
        let mut cart = CartAggregator::new(MemoryStore::new());
        let product = Product::new(
            ProductId::new(1),
            "Shirt",
            Price::from_minor(2_000, CurrencyCode::USD),
        );
        cart.add_item(&product, Some("White".into()), Some("M".into()), 2)
            .unwrap();
        OrderRequest::from_items(cart.items()).unwrap().unwrap()
    }

    #[test]
    fn test_place_assigns_sequential_ids() {
        let book = OrderBook::new();
        let client = Uuid::new_v4();

        let first = book.place(client, &request()).unwrap();
        let second = book.place(client, &request()).unwrap();

        assert_eq!(first.id, OrderId::new(1));
        assert_eq!(second.id, OrderId::new(2));
        assert_eq!(first.status, OrderStatus::Pending);
        assert_eq!(first.total.amount_minor(), 4_000);
        assert_eq!(book.get(second.id).unwrap().client_id, client);
    }

    #[test]
    fn test_update_status_enforces_transitions() {
        let book = OrderBook::new();
        let order = book.place(Uuid::new_v4(), &request()).unwrap();

        book.update_status(order.id, OrderStatus::Confirmed).unwrap();
        book.update_status(order.id, OrderStatus::Shipped).unwrap();

        let err = book
            .update_status(order.id, OrderStatus::Cancelled)
            .unwrap_err();
        assert!(matches!(err, OrderError::Transition(_)));
        assert_eq!(book.get(order.id).unwrap().status, OrderStatus::Shipped);
    }

    #[test]
    fn test_unknown_order() {
        let book = OrderBook::new();
        assert!(matches!(
            book.get(OrderId::new(42)),
            Err(OrderError::NotFound(_))
        ));
        assert!(matches!(
            book.update_status(OrderId::new(42), OrderStatus::Confirmed),
            Err(OrderError::NotFound(_))
        ));
    }
}
