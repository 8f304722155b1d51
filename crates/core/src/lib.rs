//! Kiosk Core - Cart aggregation model and shared types.
//!
//! This crate provides the types and cart logic used across all Kiosk
//! components:
//! - `storefront` - JSON API for browsing products, managing a cart and checking out
//! - `cli` - Command-line tools for inspecting and editing carts on disk
//!
//! # Architecture
//!
//! The core crate contains only types, traits and synchronous logic - no
//! network or file I/O. Durable storage is reached through the
//! [`cart::SnapshotStore`] trait, implemented by the binaries.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, products and statuses
//! - [`cart`] - The shopping cart aggregation model

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{CartAggregator, CartError, ItemKey, LineItem, MemoryStore, SnapshotStore};
pub use types::*;
