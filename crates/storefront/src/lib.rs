//! Petalshop Storefront library.
//!
//! Keeps a shopper's catalog, cart and order views in sync with the shop
//! API. The server is authoritative and possibly stale; this crate only
//! mirrors its latest answers and never invents state of its own.
//!
//! # Components
//!
//! - [`session`] - Who is signed in
//! - [`catalog`] - Products, categories and the shopper's filter
//! - [`cart`] - The cart view, refreshed after every mutation
//! - [`orders`] - Order placement and order history
//! - [`notify`] - Single-slot, auto-dismissing feedback
//! - [`services::auth`] - Login, registration and logout
//! - [`state`] - All of the above wired together

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod navigation;
pub mod notify;
pub mod orders;
pub mod services;
pub mod session;
pub mod state;

#[cfg(test)]
mod testing;

pub use error::{ClientError, Result};
pub use state::Storefront;
