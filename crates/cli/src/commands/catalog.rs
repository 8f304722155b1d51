//! Catalog commands.

use std::path::Path;

use kiosk_core::CurrencyCode;
use kiosk_storefront::catalog::Catalog;

use super::CliError;

/// Load a catalog file and summarize it, one product per line.
///
/// # Errors
///
/// Returns [`CliError::Catalog`] if the file is missing or invalid.
pub fn check(path: &Path, currency: CurrencyCode) -> Result<String, CliError> {
    let catalog = Catalog::load(path, currency)?;
    tracing::info!(products = catalog.len(), path = %path.display(), "Catalog is valid");

    let lines: Vec<String> = catalog
        .products()
        .iter()
        .map(|p| format!("{}\t{}\t{}", p.id, p.name, p.price.display()))
        .collect();
    Ok(lines.join("\n"))
}
