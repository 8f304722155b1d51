//! CLI command implementations.
//!
//! Commands return their output as a string; `main` prints it.

pub mod cart;
pub mod catalog;

use kiosk_core::cart::CheckoutError;
use kiosk_core::{CartError, PriceError, ProductId};
use kiosk_storefront::catalog::CatalogError;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// The catalog could not be loaded.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// A cart operation failed.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Price arithmetic failed.
    #[error(transparent)]
    Pricing(#[from] PriceError),

    /// Checkout failed.
    #[error(transparent)]
    Checkout(#[from] CheckoutError<String, serde_json::Error>),

    /// Output could not be serialized.
    #[error("failed to render output: {0}")]
    Render(#[from] serde_json::Error),

    /// The product is not in the catalog.
    #[error("unknown product {0}")]
    UnknownProduct(ProductId),

    /// The product does not offer the selected option.
    #[error("{0}")]
    InvalidSelection(String),
}

/// Write command output to stdout.
#[allow(clippy::print_stdout)]
pub fn emit(output: &str) {
    println!("{output}");
}
