//! The cart aggregation model.
//!
//! [`CartAggregator`] owns an ordered list of [`LineItem`]s keyed by
//! [`ItemKey`] and rewrites the full snapshot in its [`SnapshotStore`] after
//! every mutation. All operations are synchronous and run to completion on
//! the calling thread.
//!
//! # Lifecycle
//!
//! - [`CartAggregator::new`] starts empty without touching the store.
//! - [`CartAggregator::load`] restores the snapshot saved under
//!   [`CART_STORAGE_KEY`].
//! - [`CartAggregator::flush`] rewrites the snapshot; mutations call it.
//! - [`CartAggregator::reload`] re-reads the snapshot. Several instances on
//!   the same store are not coordinated: the last write wins.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::item::{ItemKey, LineItem};
use super::store::{SnapshotStore, StoreError};
use crate::types::{CurrencyCode, Price, PriceError, Product};

/// Namespace key the cart snapshot is stored under.
pub const CART_STORAGE_KEY: &str = "cart-storage";

/// Current snapshot layout version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Errors raised by cart operations.
#[derive(Debug, thiserror::Error)]
pub enum CartError {
    /// A quantity outside `1..=u32::MAX` was supplied where one is required.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(i64),
    /// The product is priced in a different currency than the cart.
    #[error("currency mismatch: cart holds {cart}, product is priced in {product}")]
    CurrencyMismatch {
        cart: CurrencyCode,
        product: CurrencyCode,
    },
    /// The snapshot could not be written or read.
    #[error("failed to persist cart: {0}")]
    Persistence(#[from] StoreError),
    /// The stored snapshot is unreadable.
    #[error("invalid cart snapshot: {0}")]
    Snapshot(String),
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    items: &'a [LineItem],
}

#[derive(Deserialize)]
struct Snapshot {
    version: u32,
    items: Vec<LineItem>,
}

/// Ordered, persisted shopping cart.
#[derive(Debug)]
pub struct CartAggregator<S> {
    store: S,
    items: Vec<LineItem>,
    currency: CurrencyCode,
}

impl<S: SnapshotStore> CartAggregator<S> {
    /// Create an empty cart backed by `store`. Nothing is read or written.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store,
            items: Vec::new(),
            currency: CurrencyCode::default(),
        }
    }

    /// Restore the cart saved in `store`, or start empty if none was saved.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Persistence`] if the store cannot be read and
    /// [`CartError::Snapshot`] if the saved snapshot is corrupt or has an
    /// unsupported version.
    pub fn load(store: S) -> Result<Self, CartError> {
        let items = read_snapshot(&store)?;
        debug!(items = items.len(), "cart loaded");
        Ok(Self {
            store,
            items,
            currency: CurrencyCode::default(),
        })
    }

    /// Currency reported for an empty cart's total.
    #[must_use]
    pub const fn with_currency(mut self, currency: CurrencyCode) -> Self {
        self.currency = currency;
        self
    }

    /// Replace the in-memory cart with the saved snapshot.
    ///
    /// # Errors
    ///
    /// Same as [`CartAggregator::load`]. The cart is unchanged on error.
    pub fn reload(&mut self) -> Result<(), CartError> {
        self.items = read_snapshot(&self.store)?;
        Ok(())
    }

    /// Rewrite the full snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Persistence`] if the store rejects the write.
    pub fn flush(&self) -> Result<(), CartError> {
        let snapshot = SnapshotRef {
            version: SNAPSHOT_VERSION,
            items: &self.items,
        };
        let json =
            serde_json::to_string(&snapshot).map_err(|e| CartError::Snapshot(e.to_string()))?;
        self.store.write(CART_STORAGE_KEY, &json)?;
        Ok(())
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Look up a line item by key.
    #[must_use]
    pub fn get(&self, key: &ItemKey) -> Option<&LineItem> {
        self.items.iter().find(|item| item.has_key(key))
    }

    /// Number of distinct line items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no line items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Currency of the cart: that of its items, or the configured default.
    #[must_use]
    pub fn currency(&self) -> CurrencyCode {
        self.items
            .first()
            .map_or(self.currency, |item| item.unit_price.currency())
    }

    /// The backing store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Consume the cart and return its store.
    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }

    /// Add `quantity` units of `product` with the given variant selection.
    ///
    /// If a line item with the same key exists only its quantity grows; the
    /// name and price captured by the first addition are kept. Otherwise a
    /// new line item is appended. Returns the line item's key.
    ///
    /// # Errors
    ///
    /// - [`CartError::InvalidQuantity`] for a zero quantity or a merged
    ///   quantity beyond `u32::MAX`; the cart is untouched.
    /// - [`CartError::CurrencyMismatch`] if a new line item's price is in a
    ///   different currency than the items already in the cart.
    /// - [`CartError::Persistence`] if the snapshot write fails. The
    ///   in-memory change is kept so the caller can retry with `flush`.
    pub fn add_item(
        &mut self,
        product: &Product,
        color: Option<String>,
        size: Option<String>,
        quantity: u32,
    ) -> Result<ItemKey, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity(0));
        }

        let key = ItemKey::new(product.id, color, size);

        if let Some(item) = self.items.iter_mut().find(|item| item.has_key(&key)) {
            let merged = item
                .quantity()
                .checked_add(quantity)
                .ok_or_else(|| {
                    CartError::InvalidQuantity(i64::from(item.quantity()) + i64::from(quantity))
                })?;
            item.set_quantity(merged);
            debug!(key = %key, quantity = merged, "cart line merged");
        } else {
            let product_currency = product.price.currency();
            if !self.items.is_empty() && product_currency != self.currency() {
                return Err(CartError::CurrencyMismatch {
                    cart: self.currency(),
                    product: product_currency,
                });
            }

            self.items.push(LineItem::from_product(
                product,
                key.color.clone(),
                key.size.clone(),
                quantity,
            ));
            debug!(key = %key, quantity, "cart line added");
        }

        self.flush()?;
        Ok(key)
    }

    /// Remove the line item with `key`. Missing keys are a no-op.
    ///
    /// Returns whether a line item was removed.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Persistence`] if the snapshot write fails.
    pub fn remove_item(&mut self, key: &ItemKey) -> Result<bool, CartError> {
        let removed = match self.items.iter().position(|item| item.has_key(key)) {
            Some(index) => {
                self.items.remove(index);
                debug!(key = %key, "cart line removed");
                true
            }
            None => false,
        };

        self.flush()?;
        Ok(removed)
    }

    /// Set the quantity of the line item with `key`.
    ///
    /// A quantity of zero or less removes the line item. Missing keys are a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] for a quantity above
    /// `u32::MAX` and [`CartError::Persistence`] if the snapshot write fails.
    pub fn update_quantity(&mut self, key: &ItemKey, quantity: i64) -> Result<(), CartError> {
        if quantity <= 0 {
            self.remove_item(key)?;
            return Ok(());
        }

        let quantity = u32::try_from(quantity).map_err(|_| CartError::InvalidQuantity(quantity))?;
        if let Some(item) = self.items.iter_mut().find(|item| item.has_key(key)) {
            item.set_quantity(quantity);
            debug!(key = %key, quantity, "cart line quantity set");
        }

        self.flush()
    }

    /// Remove every line item.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Persistence`] if the snapshot write fails.
    pub fn clear_cart(&mut self) -> Result<(), CartError> {
        self.items.clear();
        debug!("cart cleared");
        self.flush()
    }

    /// Total number of units across all line items.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity())).sum()
    }

    /// Sum of unit price times quantity across all line items.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Overflow`] if the total does not fit.
    pub fn total_price(&self) -> Result<Price, PriceError> {
        self.items
            .iter()
            .try_fold(Price::zero(self.currency()), |total, item| {
                total.checked_add(item.line_total()?)
            })
    }
}

fn read_snapshot<S: SnapshotStore>(store: &S) -> Result<Vec<LineItem>, CartError> {
    let Some(raw) = store.read(CART_STORAGE_KEY)? else {
        return Ok(Vec::new());
    };

    let snapshot: Snapshot =
        serde_json::from_str(&raw).map_err(|e| CartError::Snapshot(e.to_string()))?;

    if snapshot.version != SNAPSHOT_VERSION {
        return Err(CartError::Snapshot(format!(
            "unsupported version {}",
            snapshot.version
        )));
    }

    let currency = snapshot.items.first().map(|item| item.unit_price.currency());
    let mut seen = HashSet::with_capacity(snapshot.items.len());
    for item in &snapshot.items {
        if Some(item.unit_price.currency()) != currency {
            return Err(CartError::Snapshot(format!(
                "line {} is priced in {}, expected {}",
                item.key(),
                item.unit_price.currency(),
                currency.unwrap_or_default()
            )));
        }
        if item.quantity() == 0 {
            return Err(CartError::Snapshot(format!(
                "line {} has zero quantity",
                item.key()
            )));
        }
        if !seen.insert(item.key()) {
            return Err(CartError::Snapshot(format!(
                "duplicate line {}",
                item.key()
            )));
        }
    }

    Ok(snapshot.items)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::Ordering;

    use rust_decimal::Decimal;

    use super::*;
    use crate::cart::MemoryStore;
    use crate::cart::store::FlakyStore;
    use crate::types::ProductId;

    fn product(id: i32, price: &str) -> Product {
        Product::new(
            ProductId::new(id),
            format!("Product {id}"),
            Price::parse_display(price, CurrencyCode::INR).unwrap(),
        )
    }

    fn variant(color: &str, size: &str) -> (Option<String>, Option<String>) {
        (Some(color.to_string()), Some(size.to_string()))
    }

    fn cart() -> CartAggregator<MemoryStore> {
        CartAggregator::new(MemoryStore::new()).with_currency(CurrencyCode::INR)
    }

    #[test]
    fn test_same_key_merges() {
        let mut cart = cart();
        let p = product(1, "500");
        let (color, size) = variant("Red", "M");

        cart.add_item(&p, color.clone(), size.clone(), 1).unwrap();
        let key = cart.add_item(&p, color, size, 1).unwrap();

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get(&key).unwrap().quantity(), 2);
    }

    #[test]
    fn test_padded_selection_merges() {
        let mut cart = cart();
        let p = product(1, "500");

        cart.add_item(&p, Some("Red".into()), None, 1).unwrap();
        cart.add_item(&p, Some(" Red ".into()), Some(String::new()), 2)
            .unwrap();

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items()[0].selected_color.as_deref(), Some("Red"));
        assert_eq!(cart.items()[0].selected_size, None);
        assert_eq!(cart.total_items(), 3);
    }

    #[test]
    fn test_different_variants_are_distinct() {
        let mut cart = cart();
        let p = product(1, "500");

        let (red, m) = variant("Red", "M");
        let (blue, _) = variant("Blue", "M");
        cart.add_item(&p, red, m.clone(), 1).unwrap();
        cart.add_item(&p, blue, m, 1).unwrap();
        cart.add_item(&p, None, None, 1).unwrap();

        assert_eq!(cart.len(), 3);
        assert_eq!(cart.total_items(), 3);
    }

    #[test]
    fn test_non_positive_update_removes() {
        let mut cart = cart();
        let (color, size) = variant("Red", "M");
        let zero = cart.add_item(&product(1, "10"), color.clone(), size.clone(), 2).unwrap();
        let negative = cart.add_item(&product(2, "10"), color, size, 2).unwrap();
        cart.add_item(&product(3, "10"), None, None, 1).unwrap();

        cart.update_quantity(&zero, 0).unwrap();
        assert_eq!(cart.len(), 2);
        assert!(cart.get(&zero).is_none());

        cart.update_quantity(&negative, -5).unwrap();
        assert_eq!(cart.len(), 1);
        assert!(cart.get(&negative).is_none());
    }

    #[test]
    fn test_update_quantity_sets_value() {
        let mut cart = cart();
        let key = cart.add_item(&product(1, "10"), None, None, 1).unwrap();

        cart.update_quantity(&key, 7).unwrap();
        assert_eq!(cart.get(&key).unwrap().quantity(), 7);

        let missing = ItemKey::new(ProductId::new(99), None, None);
        cart.update_quantity(&missing, 4).unwrap();
        assert_eq!(cart.len(), 1);

        assert!(matches!(
            cart.update_quantity(&key, i64::from(u32::MAX) + 1),
            Err(CartError::InvalidQuantity(_))
        ));
        assert_eq!(cart.get(&key).unwrap().quantity(), 7);
    }

    #[test]
    fn test_total_independent_of_merge_history() {
        let p = product(1, "1,299.50");

        let mut single = cart();
        single.add_item(&p, None, Some("L".into()), 3).unwrap();

        let mut split = cart();
        for _ in 0..3 {
            split.add_item(&p, None, Some("L".into()), 1).unwrap();
        }

        assert_eq!(single.total_price().unwrap(), split.total_price().unwrap());
        assert_eq!(single.total_items(), split.total_items());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut cart = cart();
        cart.clear_cart().unwrap();
        assert!(cart.is_empty());

        cart.add_item(&product(1, "10"), None, None, 1).unwrap();
        cart.clear_cart().unwrap();
        cart.clear_cart().unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.total_items(), 0);
        assert!(cart.total_price().unwrap().is_zero());
    }

    #[test]
    fn test_merge_keeps_first_snapshot() {
        let mut cart = cart();
        let (color, size) = variant("White", "M");

        let first = product(1, "1,200");
        cart.add_item(&first, color.clone(), size.clone(), 2).unwrap();

        let mut repriced = product(1, "9,999");
        repriced.name = "Renamed".to_string();
        let key = cart.add_item(&repriced, color, size, 1).unwrap();

        let item = cart.get(&key).unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(item.quantity(), 3);
        assert_eq!(item.name, "Product 1");
        assert_eq!(cart.total_items(), 3);
        assert_eq!(cart.total_price().unwrap().amount(), Decimal::new(3600, 0));
    }

    #[test]
    fn test_remove_missing_key_is_noop() {
        let mut cart = cart();
        cart.add_item(&product(1, "10"), None, None, 1).unwrap();
        cart.add_item(&product(2, "20"), None, None, 2).unwrap();
        let before = cart.items().to_vec();

        let removed = cart
            .remove_item(&ItemKey::new(ProductId::new(1), Some("Red".into()), None))
            .unwrap();

        assert!(!removed);
        assert_eq!(cart.items(), before.as_slice());
    }

    #[test]
    fn test_insertion_order_survives_merge_and_removal() {
        let mut cart = cart();
        let a = cart.add_item(&product(1, "10"), None, None, 1).unwrap();
        let b = cart.add_item(&product(2, "10"), None, None, 1).unwrap();
        let c = cart.add_item(&product(3, "10"), None, None, 1).unwrap();

        cart.add_item(&product(1, "10"), None, None, 1).unwrap();
        cart.remove_item(&b).unwrap();

        let keys: Vec<ItemKey> = cart.items().iter().map(LineItem::key).collect();
        assert_eq!(keys, vec![a, c]);
    }

    #[test]
    fn test_zero_quantity_add_rejected() {
        let mut cart = cart();
        assert!(matches!(
            cart.add_item(&product(1, "10"), None, None, 0),
            Err(CartError::InvalidQuantity(0))
        ));
        assert!(cart.is_empty());
        assert_eq!(cart.store().read(CART_STORAGE_KEY).unwrap(), None);
    }

    #[test]
    fn test_currency_mismatch_rejected() {
        let mut cart = cart();
        cart.add_item(&product(1, "10"), None, None, 1).unwrap();

        let dollars = Product::new(
            ProductId::new(2),
            "Import",
            Price::from_minor(500, CurrencyCode::USD),
        );
        assert!(matches!(
            cart.add_item(&dollars, None, None, 1),
            Err(CartError::CurrencyMismatch { .. })
        ));
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_every_mutation_rewrites_snapshot() {
        let store = MemoryStore::new();
        let mut cart = CartAggregator::new(store.clone());

        let key = cart.add_item(&product(1, "10"), None, None, 2).unwrap();
        assert_eq!(CartAggregator::load(store.clone()).unwrap().total_items(), 2);

        cart.update_quantity(&key, 5).unwrap();
        assert_eq!(CartAggregator::load(store.clone()).unwrap().total_items(), 5);

        cart.remove_item(&key).unwrap();
        assert!(CartAggregator::load(store.clone()).unwrap().is_empty());

        cart.add_item(&product(2, "10"), None, None, 1).unwrap();
        cart.clear_cart().unwrap();
        assert!(CartAggregator::load(store).unwrap().is_empty());
    }

    #[test]
    fn test_load_restores_order_and_fields() {
        let store = MemoryStore::new();
        let mut cart = CartAggregator::new(store.clone());
        let (color, size) = variant("White", "M");
        cart.add_item(&product(2, "1,200"), color, size, 2).unwrap();
        cart.add_item(&product(1, "300"), None, None, 1).unwrap();

        let restored = CartAggregator::load(store).unwrap();
        assert_eq!(restored.items(), cart.items());
    }

    #[test]
    fn test_persistence_failure_is_reported() {
        let mut cart = CartAggregator::new(FlakyStore::default());
        cart.add_item(&product(1, "10"), None, None, 1).unwrap();

        cart.store().failing.store(true, Ordering::SeqCst);
        let key = ItemKey::new(ProductId::new(1), None, None);
        assert!(matches!(
            cart.update_quantity(&key, 4),
            Err(CartError::Persistence(_))
        ));
        assert_eq!(cart.get(&key).unwrap().quantity(), 4);

        cart.store().failing.store(false, Ordering::SeqCst);
        cart.flush().unwrap();
        assert_eq!(CartAggregator::load(cart.into_store()).unwrap().total_items(), 4);
    }

    #[test]
    fn test_load_rejects_bad_snapshots() {
        let store = MemoryStore::new();

        store.write(CART_STORAGE_KEY, "not json").unwrap();
        assert!(matches!(
            CartAggregator::load(store.clone()),
            Err(CartError::Snapshot(_))
        ));

        store
            .write(CART_STORAGE_KEY, r#"{"version":99,"items":[]}"#)
            .unwrap();
        assert!(matches!(
            CartAggregator::load(store.clone()),
            Err(CartError::Snapshot(_))
        ));

        let line = r#"{"product_id":1,"name":"A","unit_price":{"amount_minor":100,"currency":"USD"},"quantity":1}"#;
        store
            .write(
                CART_STORAGE_KEY,
                &format!(r#"{{"version":1,"items":[{line},{line}]}}"#),
            )
            .unwrap();
        assert!(matches!(
            CartAggregator::load(store.clone()),
            Err(CartError::Snapshot(_))
        ));

        let euro = r#"{"product_id":2,"name":"B","unit_price":{"amount_minor":100,"currency":"EUR"},"quantity":1}"#;
        store
            .write(
                CART_STORAGE_KEY,
                &format!(r#"{{"version":1,"items":[{line},{euro}]}}"#),
            )
            .unwrap();
        assert!(matches!(
            CartAggregator::load(store),
            Err(CartError::Snapshot(reason)) if reason.contains("EUR")
        ));
    }

    #[test]
    fn test_last_writer_wins_across_instances() {
        let store = MemoryStore::new();
        let mut tab_a = CartAggregator::new(store.clone());
        let mut tab_b = CartAggregator::new(store.clone());

        tab_a.add_item(&product(1, "10"), None, None, 1).unwrap();
        tab_b.add_item(&product(2, "10"), None, None, 1).unwrap();

        tab_a.reload().unwrap();
        assert_eq!(tab_a.len(), 1);
        assert_eq!(tab_a.items()[0].product_id, ProductId::new(2));
    }
}
