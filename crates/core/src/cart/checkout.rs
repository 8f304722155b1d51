//! Turning a cart into an order.
//!
//! Clearing the cart after a successful order is part of the cart's
//! contract: [`CartAggregator::checkout`] hands an [`OrderRequest`] to the
//! order service and empties the cart only when the service accepts it.

use serde::{Deserialize, Serialize};

use super::aggregator::{CART_STORAGE_KEY, CartAggregator, CartError};
use super::item::LineItem;
use super::store::SnapshotStore;
use crate::types::{Price, PriceError, ProductId};

/// One order line derived from a cart line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub name: String,
    pub color: Option<String>,
    pub size: Option<String>,
    pub quantity: u32,
    pub unit_price: Price,
    pub line_total: Price,
}

/// Order creation request built from the cart contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub lines: Vec<OrderLine>,
    pub total: Price,
}

impl OrderRequest {
    /// Build a request from line items, preserving their order.
    ///
    /// Returns `Ok(None)` for an empty slice.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError`] if a line total or the order total overflows.
    pub fn from_items(items: &[LineItem]) -> Result<Option<Self>, PriceError> {
        let Some(first) = items.first() else {
            return Ok(None);
        };

        let mut total = Price::zero(first.unit_price.currency());
        let mut lines = Vec::with_capacity(items.len());

        for item in items {
            let line_total = item.line_total()?;
            total = total.checked_add(line_total)?;
            lines.push(OrderLine {
                product_id: item.product_id,
                name: item.name.clone(),
                color: item.selected_color.clone(),
                size: item.selected_size.clone(),
                quantity: item.quantity(),
                unit_price: item.unit_price,
                line_total,
            });
        }

        Ok(Some(Self { lines, total }))
    }

    /// Total number of units ordered.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }
}

/// Errors raised by [`CartAggregator::checkout`].
///
/// `T` is the order service's result and `E` its error.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError<T, E> {
    /// There is nothing to order.
    #[error("cart is empty")]
    EmptyCart,
    /// The order total could not be computed.
    #[error("could not price order: {0}")]
    Pricing(#[from] PriceError),
    /// The order service refused the order. The cart is unchanged.
    #[error("order rejected: {0}")]
    Rejected(E),
    /// The order was accepted but the stored cart could not be emptied.
    ///
    /// `placed` is the order service's result. The in-memory cart is already
    /// empty; a later `flush` completes the clear.
    #[error("order placed but cart was not cleared: {source}")]
    NotCleared {
        placed: T,
        #[source]
        source: CartError,
    },
}

impl<S: SnapshotStore> CartAggregator<S> {
    /// Submit the cart to an order service and clear it on success.
    ///
    /// `submit` receives the order request and returns the service's result.
    ///
    /// # Errors
    ///
    /// See [`CheckoutError`]. Only a successful `submit` clears the cart. If
    /// the empty snapshot cannot be written, the stored snapshot is removed
    /// instead so a reload cannot resubmit the same lines.
    pub fn checkout<T, E, F>(&mut self, submit: F) -> Result<T, CheckoutError<T, E>>
    where
        F: FnOnce(&OrderRequest) -> Result<T, E>,
    {
        let request = OrderRequest::from_items(self.items())?.ok_or(CheckoutError::EmptyCart)?;

        let placed = submit(&request).map_err(CheckoutError::Rejected)?;
        tracing::info!(
            lines = request.lines.len(),
            total = %request.total,
            "order submitted from cart"
        );

        if let Err(err) = self.clear_cart() {
            tracing::warn!(error = %err, "could not write empty cart, removing snapshot");
            if let Err(source) = self.store().remove(CART_STORAGE_KEY) {
                return Err(CheckoutError::NotCleared {
                    placed,
                    source: source.into(),
                });
            }
        }
        Ok(placed)
    }
}
