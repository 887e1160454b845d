//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Login, registration and logout against the shop API

pub mod auth;
