//! Shopping cart aggregation.
//!
//! - [`item`] - Line items and their `(product, color, size)` identity key
//! - [`aggregator`] - The persisted, ordered cart and its operations
//! - [`store`] - Snapshot storage trait and the in-memory store
//! - [`checkout`] - Order requests built from the cart

pub mod aggregator;
pub mod checkout;
pub mod item;
pub mod store;

pub use aggregator::{CART_STORAGE_KEY, CartAggregator, CartError, SNAPSHOT_VERSION};
pub use checkout::{CheckoutError, OrderLine, OrderRequest};
pub use item::{ItemKey, LineItem, normalize_selection};
pub use store::{MemoryStore, SnapshotStore, StoreError};
