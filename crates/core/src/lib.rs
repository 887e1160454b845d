//! Petalshop Core - Shared types library.
//!
//! This crate provides the types and pure functions used by the Petalshop
//! storefront client:
//! - `storefront` - Synchronizes catalog, cart and order state with the shop API
//! - `cli` - Command-line front end that renders those views
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no clocks. Everything here is deterministic, which is what makes
//! catalog filtering and cart totals safe to recompute at any time.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices and emails
//! - [`catalog`] - Products, categories and the catalog filter predicate
//! - [`cart`] - Cart lines and cart totals
//! - [`order`] - Placed orders
//! - [`session`] - The signed-in shopper's identity

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod order;
pub mod session;
pub mod types;

pub use cart::{CartLine, cart_id_of, cart_total};
pub use catalog::{CatalogFilter, Category, PriceRange, Product, filter_products, max_price};
pub use order::{Order, OrderLine};
pub use session::SessionIdentity;
pub use types::*;
