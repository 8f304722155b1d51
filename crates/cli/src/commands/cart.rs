//! Cart commands.
//!
//! Operate on the same per-client file storage the storefront uses, so a
//! cart edited here is what the client sees on their next request.

use std::path::Path;

use kiosk_core::cart::{CartAggregator, CheckoutError, ItemKey, normalize_selection};
use kiosk_core::{CurrencyCode, ProductId};
use kiosk_storefront::catalog::Catalog;
use kiosk_storefront::routes::cart::CartView;
use kiosk_storefront::storage::FileStore;
use uuid::Uuid;

use super::CliError;

/// A product and variant selection given on the command line.
#[derive(Debug, Clone)]
pub struct Selection {
    pub product_id: ProductId,
    pub color: Option<String>,
    pub size: Option<String>,
}

impl Selection {
    /// Trim the color and size the way [`ItemKey`] does.
    fn normalized(self) -> Self {
        Self {
            color: normalize_selection(self.color),
            size: normalize_selection(self.size),
            ..self
        }
    }

    fn key(self) -> ItemKey {
        ItemKey::new(self.product_id, self.color, self.size)
    }
}

/// Everything a cart command needs: the client's store and the catalog.
pub struct CartContext {
    store: FileStore,
    catalog: Catalog,
    currency: CurrencyCode,
}

impl CartContext {
    /// Open the cart store for `client` under `data_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Catalog`] if the catalog cannot be loaded.
    pub fn open(
        data_dir: &Path,
        client: Uuid,
        catalog_path: &Path,
        currency: CurrencyCode,
    ) -> Result<Self, CliError> {
        Ok(Self::new(
            FileStore::for_client(data_dir, client),
            Catalog::load(catalog_path, currency)?,
            currency,
        ))
    }

    /// Build a context from parts.
    #[must_use]
    pub const fn new(store: FileStore, catalog: Catalog, currency: CurrencyCode) -> Self {
        Self {
            store,
            catalog,
            currency,
        }
    }

    fn cart(&self) -> Result<CartAggregator<FileStore>, CliError> {
        Ok(CartAggregator::load(self.store.clone())?.with_currency(self.currency))
    }
}

fn render(cart: &CartAggregator<FileStore>) -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(&CartView::from_cart(cart)?)?)
}

/// Add units of a catalog product.
///
/// # Errors
///
/// Returns [`CliError::UnknownProduct`] or [`CliError::InvalidSelection`] if
/// the selection does not match the catalog, otherwise any cart error.
pub fn add(ctx: &CartContext, selection: Selection, quantity: u32) -> Result<String, CliError> {
    let selection = selection.normalized();
    let product = ctx
        .catalog
        .get(selection.product_id)
        .ok_or(CliError::UnknownProduct(selection.product_id))?;

    if let Some(color) = selection.color.as_deref().filter(|c| !product.offers_color(c)) {
        return Err(CliError::InvalidSelection(format!(
            "color '{color}' is not available for {}",
            product.name
        )));
    }
    if let Some(size) = selection.size.as_deref().filter(|s| !product.offers_size(s)) {
        return Err(CliError::InvalidSelection(format!(
            "size '{size}' is not available for {}",
            product.name
        )));
    }

    let mut cart = ctx.cart()?;
    let key = cart.add_item(product, selection.color, selection.size, quantity)?;
    tracing::info!(%key, quantity, "Added to cart");
    render(&cart)
}

/// Set a line's quantity.
///
/// # Errors
///
/// Returns any cart error.
pub fn update(ctx: &CartContext, selection: Selection, quantity: i64) -> Result<String, CliError> {
    let mut cart = ctx.cart()?;
    let key = selection.key();
    cart.update_quantity(&key, quantity)?;
    tracing::info!(%key, quantity, "Updated cart");
    render(&cart)
}

/// Remove a line.
///
/// # Errors
///
/// Returns any cart error.
pub fn remove(ctx: &CartContext, selection: Selection) -> Result<String, CliError> {
    let mut cart = ctx.cart()?;
    let key = selection.key();
    if !cart.remove_item(&key)? {
        tracing::warn!(%key, "No matching line in cart");
    }
    render(&cart)
}

/// Remove every line.
///
/// # Errors
///
/// Returns any cart error.
pub fn clear(ctx: &CartContext) -> Result<String, CliError> {
    let mut cart = ctx.cart()?;
    cart.clear_cart()?;
    render(&cart)
}

/// Render the cart.
///
/// # Errors
///
/// Returns [`CliError::Cart`] if the snapshot cannot be read.
pub fn show(ctx: &CartContext) -> Result<String, CliError> {
    render(&ctx.cart()?)
}

/// Render the order for the cart and clear it.
///
/// # Errors
///
/// Returns [`CliError::Checkout`] if the cart is empty or cannot be cleared.
pub fn checkout(ctx: &CartContext) -> Result<String, CliError> {
    let mut cart = ctx.cart()?;
    match cart.checkout(serde_json::to_string_pretty) {
        Ok(order) => {
            tracing::info!("Cart checked out and cleared");
            Ok(order)
        }
        Err(CheckoutError::NotCleared { placed, source }) => {
            tracing::error!(error = %source, "Order rendered but cart could not be cleared");
            Ok(placed)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::Value;
    use tempfile::TempDir;

    use super::*;

    fn context() -> (TempDir, CartContext) {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::from_json(
            r#"[{"id": 1, "name": "Shirt", "price": "₹1,200", "colors": ["White"], "sizes": ["M"]}]"#,
            CurrencyCode::INR,
        )
        .unwrap();
        let store = FileStore::for_client(dir.path(), Uuid::new_v4());
        (dir, CartContext::new(store, catalog, CurrencyCode::INR))
    }

    fn shirt() -> Selection {
        Selection {
            product_id: ProductId::new(1),
            color: Some("White".into()),
            size: Some("M".into()),
        }
    }

    #[test]
    fn test_add_persists_between_commands() {
        let (_dir, ctx) = context();

        add(&ctx, shirt(), 1).unwrap();
        let output = add(&ctx, shirt(), 2).unwrap();

        let view: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(view["items"][0]["quantity"], 3);
        assert_eq!(view["subtotal_display"], "₹3,600.00");

        let shown: Value = serde_json::from_str(&show(&ctx).unwrap()).unwrap();
        assert_eq!(shown["item_count"], 3);
    }

    #[test]
    fn test_add_validates_selection() {
        let (_dir, ctx) = context();

        let mut unknown = shirt();
        unknown.product_id = ProductId::new(9);
        assert!(matches!(
            add(&ctx, unknown, 1),
            Err(CliError::UnknownProduct(_))
        ));

        let mut red = shirt();
        red.color = Some("Red".into());
        assert!(matches!(
            add(&ctx, red, 1),
            Err(CliError::InvalidSelection(_))
        ));
    }

    #[test]
    fn test_padded_selection_matches_storefront_key() {
        let (_dir, ctx) = context();
        add(&ctx, shirt(), 1).unwrap();

        let padded = Selection {
            product_id: ProductId::new(1),
            color: Some(" White ".into()),
            size: Some("M ".into()),
        };
        let view: Value = serde_json::from_str(&add(&ctx, padded.clone(), 1).unwrap()).unwrap();
        assert_eq!(view["items"].as_array().unwrap().len(), 1);
        assert_eq!(view["items"][0]["quantity"], 2);

        let view: Value = serde_json::from_str(&remove(&ctx, padded).unwrap()).unwrap();
        assert_eq!(view["item_count"], 0);

        let blank = Selection {
            product_id: ProductId::new(1),
            color: Some(String::new()),
            size: None,
        };
        let view: Value = serde_json::from_str(&add(&ctx, blank, 1).unwrap()).unwrap();
        assert_eq!(view["items"][0]["key"]["color"], Value::Null);
    }

    #[test]
    fn test_update_to_zero_removes() {
        let (_dir, ctx) = context();
        add(&ctx, shirt(), 2).unwrap();

        let view: Value = serde_json::from_str(&update(&ctx, shirt(), 0).unwrap()).unwrap();
        assert_eq!(view["item_count"], 0);
    }

    #[test]
    fn test_checkout_clears_cart() {
        let (_dir, ctx) = context();
        add(&ctx, shirt(), 2).unwrap();

        let order: Value = serde_json::from_str(&checkout(&ctx).unwrap()).unwrap();
        assert_eq!(order["total"]["amount_minor"], 240_000);

        assert!(matches!(
            checkout(&ctx),
            Err(CliError::Checkout(CheckoutError::EmptyCart))
        ));
    }
}
