//! Line items and their identity key.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{Price, PriceError, Product, ProductId};

/// Identity of a line item: the product plus its variant selection.
///
/// Two additions with the same key merge into one line item; any difference
/// in color or size makes a distinct line item even for the same product.
/// Selections are normalized on construction and deserialization, so
/// `" White "` and `"White"` name the same variant and a blank selection is
/// no selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "ItemKeyFields")]
pub struct ItemKey {
    pub product_id: ProductId,
    pub color: Option<String>,
    pub size: Option<String>,
}

#[derive(Deserialize)]
struct ItemKeyFields {
    product_id: ProductId,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    size: Option<String>,
}

impl From<ItemKeyFields> for ItemKey {
    fn from(fields: ItemKeyFields) -> Self {
        Self::new(fields.product_id, fields.color, fields.size)
    }
}

impl ItemKey {
    /// Create a key from a product id and variant selection.
    #[must_use]
    pub fn new(product_id: ProductId, color: Option<String>, size: Option<String>) -> Self {
        Self {
            product_id,
            color: normalize_selection(color),
            size: normalize_selection(size),
        }
    }
}

/// Trim a color or size selection, treating a blank one as no selection.
#[must_use]
pub fn normalize_selection(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.product_id,
            self.color.as_deref().unwrap_or("-"),
            self.size.as_deref().unwrap_or("-")
        )
    }
}

/// One distinct purchasable configuration in the cart.
///
/// Name, price and image are a snapshot taken when the line item was first
/// added; later additions of the same key only change the quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Price,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub selected_color: Option<String>,
    #[serde(default)]
    pub selected_size: Option<String>,
    /// Always at least 1.
    quantity: u32,
}

impl LineItem {
    /// Snapshot `product` with the given selection and quantity.
    pub(super) fn from_product(
        product: &Product,
        selected_color: Option<String>,
        selected_size: Option<String>,
        quantity: u32,
    ) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            unit_price: product.price,
            image: product.image.clone(),
            selected_color,
            selected_size,
            quantity,
        }
    }

    /// Number of units of this configuration.
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    pub(super) const fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
    }

    /// The identity key of this line item.
    #[must_use]
    pub fn key(&self) -> ItemKey {
        ItemKey::new(
            self.product_id,
            self.selected_color.clone(),
            self.selected_size.clone(),
        )
    }

    /// Whether this line item is identified by `key`.
    #[must_use]
    pub fn has_key(&self, key: &ItemKey) -> bool {
        self.product_id == key.product_id
            && self.selected_color == key.color
            && self.selected_size == key.size
    }

    /// Unit price times quantity.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Overflow`] if the line total does not fit.
    pub fn line_total(&self) -> Result<Price, PriceError> {
        self.unit_price.checked_mul(self.quantity)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::CurrencyCode;

    fn shirt() -> Product {
        Product::new(
            ProductId::new(1),
            "Linen Shirt",
            Price::from_minor(120_000, CurrencyCode::INR),
        )
    }

    #[test]
    fn test_key_matches_selection() {
        let item = LineItem::from_product(&shirt(), Some("White".into()), None, 1);
        let key = item.key();

        assert!(item.has_key(&key));
        assert!(!item.has_key(&ItemKey::new(ProductId::new(1), Some("White".into()), Some("M".into()))));
        assert!(!item.has_key(&ItemKey::new(ProductId::new(2), Some("White".into()), None)));
    }

    #[test]
    fn test_key_display() {
        let key = ItemKey::new(ProductId::new(1), Some("White".into()), None);
        assert_eq!(key.to_string(), "1/White/-");
    }

    #[test]
    fn test_selection_is_normalized() {
        let plain = ItemKey::new(ProductId::new(1), Some("White".into()), None);

        assert_eq!(
            ItemKey::new(ProductId::new(1), Some("  White ".into()), Some(String::new())),
            plain
        );

        let parsed: ItemKey =
            serde_json::from_str(r#"{"product_id": 1, "color": " White", "size": "  "}"#).unwrap();
        assert_eq!(parsed, plain);
    }

    #[test]
    fn test_line_total() {
        let item = LineItem::from_product(&shirt(), None, None, 3);
        assert_eq!(item.line_total().unwrap().amount_minor(), 360_000);
    }
}
