//! Cart route handlers.
//!
//! Each request loads the client's cart from its durable store on the
//! blocking thread pool, applies one operation and lets the cart rewrite
//! its snapshot. Two concurrent requests from the same client are not
//! coordinated; the later write wins.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use kiosk_core::cart::{CartAggregator, CheckoutError, ItemKey, LineItem, normalize_selection};
use kiosk_core::{CartError, CurrencyCode, Price, PriceError, ProductId};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::{CartClient, OptionalCartClient};
use crate::routes::orders::OrderView;
use crate::state::AppState;
use crate::storage::FileStore;

/// Cart line display data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemView {
    pub key: ItemKey,
    pub name: String,
    pub image: Option<String>,
    pub quantity: u32,
    pub unit_price: Price,
    pub line_total: Price,
    pub price: String,
    pub line_price: String,
}

/// Cart display data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: u64,
    pub subtotal: Price,
    pub subtotal_display: String,
}

impl CartView {
    /// Create an empty cart.
    #[must_use]
    pub fn empty(currency: CurrencyCode) -> Self {
        let subtotal = Price::zero(currency);
        Self {
            items: Vec::new(),
            item_count: 0,
            subtotal,
            subtotal_display: subtotal.display(),
        }
    }

    /// Build the view of a cart.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError`] if a line total or the subtotal overflows.
    pub fn from_cart<S>(cart: &CartAggregator<S>) -> std::result::Result<Self, PriceError>
    where
        S: kiosk_core::SnapshotStore,
    {
        let items = cart
            .items()
            .iter()
            .map(CartItemView::try_from)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let subtotal = cart.total_price()?;

        Ok(Self {
            items,
            item_count: cart.total_items(),
            subtotal,
            subtotal_display: subtotal.display(),
        })
    }
}

impl TryFrom<&LineItem> for CartItemView {
    type Error = PriceError;

    fn try_from(item: &LineItem) -> std::result::Result<Self, Self::Error> {
        let line_total = item.line_total()?;
        Ok(Self {
            key: item.key(),
            name: item.name.clone(),
            image: item.image.clone(),
            quantity: item.quantity(),
            unit_price: item.unit_price,
            line_total,
            price: item.unit_price.display(),
            line_price: line_total.display(),
        })
    }
}

/// Cart count badge data.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CartCountView {
    pub count: u64,
}

/// Add to cart request body.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    pub color: Option<String>,
    pub size: Option<String>,
    pub quantity: Option<u32>,
}

/// Update cart request body.
#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    pub key: ItemKey,
    pub quantity: i64,
}

/// Remove from cart request body.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartRequest {
    pub key: ItemKey,
}

// =============================================================================
// Cart Helpers
// =============================================================================

/// Load a client's cart, starting over if its snapshot is unreadable.
fn load_cart(store: FileStore, currency: CurrencyCode) -> Result<CartAggregator<FileStore>> {
    match CartAggregator::load(store.clone()) {
        Ok(cart) => Ok(cart.with_currency(currency)),
        Err(CartError::Snapshot(reason)) => {
            tracing::warn!(%reason, dir = ?store.dir(), "discarding unreadable cart snapshot");
            Ok(CartAggregator::new(store).with_currency(currency))
        }
        Err(e) => Err(e.into()),
    }
}

/// Run `op` against the client's cart on the blocking thread pool.
async fn with_cart<T, F>(state: &AppState, client_id: Uuid, op: F) -> Result<T>
where
    F: FnOnce(&mut CartAggregator<FileStore>) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let store = state.cart_store(client_id);
    let currency = state.currency();

    tokio::task::spawn_blocking(move || {
        let mut cart = load_cart(store, currency)?;
        op(&mut cart)
    })
    .await
    .map_err(|e| AppError::Internal(format!("cart task failed: {e}")))?
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the cart.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    OptionalCartClient(client_id): OptionalCartClient,
) -> Result<Json<CartView>> {
    let Some(client_id) = client_id else {
        return Ok(Json(CartView::empty(state.currency())));
    };

    let view = with_cart(&state, client_id, |cart| Ok(CartView::from_cart(cart)?)).await?;
    Ok(Json(view))
}

/// Add an item to the cart.
///
/// The product must exist in the catalog and the selected color and size
/// must be among the options the product declares.
#[instrument(skip(state))]
pub async fn add(
    State(state): State<AppState>,
    CartClient(client_id): CartClient,
    Json(form): Json<AddToCartRequest>,
) -> Result<Json<CartView>> {
    let product = state
        .catalog()
        .get(form.product_id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("product {}", form.product_id)))?;

    let color = normalize_selection(form.color);
    let size = normalize_selection(form.size);

    if let Some(color) = color.as_deref().filter(|c| !product.offers_color(c)) {
        return Err(AppError::BadRequest(format!(
            "color '{color}' is not available for {}",
            product.name
        )));
    }
    if let Some(size) = size.as_deref().filter(|s| !product.offers_size(s)) {
        return Err(AppError::BadRequest(format!(
            "size '{size}' is not available for {}",
            product.name
        )));
    }

    let quantity = form.quantity.unwrap_or(1);
    let view = with_cart(&state, client_id, move |cart| {
        cart.add_item(&product, color, size, quantity)?;
        Ok(CartView::from_cart(cart)?)
    })
    .await?;

    Ok(Json(view))
}

/// Update a cart line's quantity. Zero or less removes the line.
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    CartClient(client_id): CartClient,
    Json(form): Json<UpdateCartRequest>,
) -> Result<Json<CartView>> {
    let view = with_cart(&state, client_id, move |cart| {
        cart.update_quantity(&form.key, form.quantity)?;
        Ok(CartView::from_cart(cart)?)
    })
    .await?;

    Ok(Json(view))
}

/// Remove a cart line. Unknown keys leave the cart unchanged.
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    CartClient(client_id): CartClient,
    Json(form): Json<RemoveFromCartRequest>,
) -> Result<Json<CartView>> {
    let view = with_cart(&state, client_id, move |cart| {
        cart.remove_item(&form.key)?;
        Ok(CartView::from_cart(cart)?)
    })
    .await?;

    Ok(Json(view))
}

/// Empty the cart.
#[instrument(skip(state))]
pub async fn clear(
    State(state): State<AppState>,
    CartClient(client_id): CartClient,
) -> Result<Json<CartView>> {
    let view = with_cart(&state, client_id, |cart| {
        cart.clear_cart()?;
        Ok(CartView::from_cart(cart)?)
    })
    .await?;

    Ok(Json(view))
}

/// Get the cart count badge.
#[instrument(skip(state))]
pub async fn count(
    State(state): State<AppState>,
    OptionalCartClient(client_id): OptionalCartClient,
) -> Result<Json<CartCountView>> {
    let count = match client_id {
        Some(client_id) => with_cart(&state, client_id, |cart| Ok(cart.total_items())).await?,
        None => 0,
    };

    Ok(Json(CartCountView { count }))
}

/// Place an order for the cart contents and clear the cart.
#[instrument(skip(state))]
pub async fn checkout(
    State(state): State<AppState>,
    CartClient(client_id): CartClient,
) -> Result<impl IntoResponse> {
    let orders_state = state.clone();
    let order = with_cart(&state, client_id, move |cart| {
        match cart.checkout(|request| orders_state.orders().place(client_id, request)) {
            Ok(order) => Ok(order),
            Err(CheckoutError::NotCleared { placed, source }) => {
                tracing::error!(
                    order_id = %placed.id,
                    error = %source,
                    "order placed but cart could not be cleared"
                );
                Ok(placed)
            }
            Err(CheckoutError::EmptyCart) => Err(AppError::BadRequest("cart is empty".to_string())),
            Err(CheckoutError::Pricing(e)) => Err(e.into()),
            Err(CheckoutError::Rejected(e)) => Err(e.into()),
        }
    })
    .await?;

    let order_id = order.id.to_string();
    add_breadcrumb("checkout", "Order placed", Some(&[("order_id", order_id.as_str())]));

    Ok((StatusCode::CREATED, Json(OrderView::from(order))))
}
