//! Catalog product record as supplied by the catalog service.

use serde::{Deserialize, Serialize};

use super::{Price, ProductId};

/// A purchasable product and its variant options.
///
/// Products without `colors` or `sizes` have no variants; adding them to a
/// cart with no selection is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
}

impl Product {
    /// Create a product with no image and no variant options.
    #[must_use]
    pub fn new(id: ProductId, name: impl Into<String>, price: Price) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            image: None,
            colors: Vec::new(),
            sizes: Vec::new(),
        }
    }

    /// Whether `color` is an acceptable selection for this product.
    ///
    /// A product that declares no colors accepts any selection.
    #[must_use]
    pub fn offers_color(&self, color: &str) -> bool {
        self.colors.is_empty() || self.colors.iter().any(|c| c == color)
    }

    /// Whether `size` is an acceptable selection for this product.
    ///
    /// A product that declares no sizes accepts any selection.
    #[must_use]
    pub fn offers_size(&self, size: &str) -> bool {
        self.sizes.is_empty() || self.sizes.iter().any(|s| s == size)
    }
}
