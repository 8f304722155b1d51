//! Product route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use kiosk_core::{Price, Product, ProductId};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Product display data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductView {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub price_display: String,
    pub image: Option<String>,
    pub colors: Vec<String>,
    pub sizes: Vec<String>,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            price_display: product.price.display(),
            image: product.image.clone(),
            colors: product.colors.clone(),
            sizes: product.sizes.clone(),
        }
    }
}

/// List all products.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Json<Vec<ProductView>> {
    Json(
        state
            .catalog()
            .products()
            .iter()
            .map(ProductView::from)
            .collect(),
    )
}

/// Show one product.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductView>> {
    state
        .catalog()
        .get(id)
        .map(|product| Json(ProductView::from(product)))
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}
