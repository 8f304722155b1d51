//! Product catalog loaded from a JSON file.
//!
//! The catalog file is a JSON array of products. Prices may be given either
//! as a number in the store currency's standard unit (`12.5`) or as a
//! formatted display string (`"$1,200.00"`); both are converted to minor
//! units once, at load time.
//!
//! ```json
//! [
//!   { "id": 1, "name": "Linen Shirt", "price": "1,200", "colors": ["White"], "sizes": ["M", "L"] },
//!   { "id": 2, "name": "Tote Bag", "price": 15, "image": "/static/tote.jpg" }
//! ]
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

use kiosk_core::{CurrencyCode, Price, PriceError, Product, ProductId};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

/// Errors raised while loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid price for product {id}: {source}")]
    Price {
        id: ProductId,
        #[source]
        source: PriceError,
    },
    #[error("negative price for product {0}")]
    NegativePrice(ProductId),
    #[error("duplicate product id {0}")]
    DuplicateProduct(ProductId),
}

/// Price as written in the catalog file.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPrice {
    Number(serde_json::Number),
    Display(String),
}

impl RawPrice {
    fn into_price(self, currency: CurrencyCode) -> Result<Price, PriceError> {
        match self {
            Self::Number(number) => {
                let text = number.to_string();
                let amount =
                    Decimal::from_str(&text).map_err(|_| PriceError::Malformed(text))?;
                Price::from_amount(amount, currency)
            }
            Self::Display(text) => Price::parse_display(&text, currency),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawProduct {
    id: ProductId,
    name: String,
    price: RawPrice,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    colors: Vec<String>,
    #[serde(default)]
    sizes: Vec<String>,
}

/// Read-only product catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate product ids.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateProduct`] if two products share an id.
    pub fn new(products: Vec<Product>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(products.len());
        for product in &products {
            if !seen.insert(product.id) {
                return Err(CatalogError::DuplicateProduct(product.id));
            }
        }
        Ok(Self { products })
    }

    /// Parse a catalog from JSON, pricing everything in `currency`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] for malformed JSON, unparseable or negative
    /// prices, or duplicate ids.
    pub fn from_json(json: &str, currency: CurrencyCode) -> Result<Self, CatalogError> {
        let raw: Vec<RawProduct> = serde_json::from_str(json)?;

        let products = raw
            .into_iter()
            .map(|p| {
                let price = p
                    .price
                    .into_price(currency)
                    .map_err(|source| CatalogError::Price { id: p.id, source })?;
                if price.amount_minor() < 0 {
                    return Err(CatalogError::NegativePrice(p.id));
                }
                Ok(Product {
                    id: p.id,
                    name: p.name,
                    price,
                    image: p.image,
                    colors: p.colors,
                    sizes: p.sizes,
                })
            })
            .collect::<Result<Vec<_>, CatalogError>>()?;

        Self::new(products)
    }

    /// Load a catalog file.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Io`] if the file cannot be read, otherwise as
    /// [`Catalog::from_json`].
    pub fn load(path: &Path, currency: CurrencyCode) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json, currency)
    }

    /// Look up a product by id.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// All products in file order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Number of products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalog has no products.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_accepts_numbers_and_strings() {
        let catalog = Catalog::from_json(
            r#"[
                {"id": 1, "name": "Shirt", "price": "₹1,200", "colors": ["White"], "sizes": ["M"]},
                {"id": 2, "name": "Tote", "price": 15.5},
                {"id": 3, "name": "Cap", "price": 8}
            ]"#,
            CurrencyCode::INR,
        )
        .unwrap();

        assert_eq!(catalog.len(), 3);
        let shirt = catalog.get(ProductId::new(1)).unwrap();
        assert_eq!(shirt.price.amount_minor(), 120_000);
        assert_eq!(shirt.colors, vec!["White".to_string()]);
        assert_eq!(catalog.get(ProductId::new(2)).unwrap().price.amount_minor(), 1_550);
        assert_eq!(catalog.get(ProductId::new(3)).unwrap().price.amount_minor(), 800);
        assert!(catalog.get(ProductId::new(4)).is_none());
    }

    #[test]
    fn test_malformed_price_is_rejected() {
        let err = Catalog::from_json(
            r#"[{"id": 7, "name": "Mystery", "price": "call us"}]"#,
            CurrencyCode::USD,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            CatalogError::Price { id, source: PriceError::Malformed(_) } if id == ProductId::new(7)
        ));
    }

    #[test]
    fn test_negative_prices_rejected() {
        for price in [r#""-$5""#, "-5", "-0.01"] {
            let err = Catalog::from_json(
                &format!(r#"[{{"id": 3, "name": "Refund", "price": {price}}}]"#),
                CurrencyCode::USD,
            )
            .unwrap_err();
            assert!(matches!(err, CatalogError::NegativePrice(id) if id == ProductId::new(3)));
        }

        let free = Catalog::from_json(r#"[{"id": 4, "name": "Sticker", "price": 0}]"#, CurrencyCode::USD)
            .unwrap();
        assert!(free.get(ProductId::new(4)).unwrap().price.is_zero());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = Catalog::from_json(
            r#"[{"id": 1, "name": "A", "price": 1}, {"id": 1, "name": "B", "price": 2}]"#,
            CurrencyCode::USD,
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateProduct(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Catalog::load(Path::new("/nonexistent/catalog.json"), CurrencyCode::USD)
            .unwrap_err();
        assert!(matches!(err, CatalogError::Io(_)));
    }
}
