//! Integration tests for Petalshop.
//!
//! # Running Tests
//!
//! ```bash
//! # Point the tests at a running shop API (default http://localhost:5139/api)
//! export PETALSHOP_API_URL=http://localhost:5139/api
//!
//! # Run the ignored live tests
//! cargo test -p petalshop-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `api_catalog` - Catalog endpoints through `ApiClient`
//! - `shopping_flow` - Register, log in, fill a cart and order it

use std::sync::Arc;
use std::time::Duration;

use petalshop_storefront::Storefront;
use petalshop_storefront::config::StorefrontConfig;
use petalshop_storefront::navigation::LogNavigator;
use petalshop_storefront::session::SessionContext;

/// Base URL for the shop API (configurable via environment).
#[must_use]
pub fn api_base_url() -> String {
    std::env::var("PETALSHOP_API_URL").unwrap_or_else(|_| "http://localhost:5139/api".to_string())
}

/// Configuration for tests: live API, no catalog cache, short delays.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        api_url: api_base_url().trim_end_matches('/').to_string(),
        catalog_cache_ttl: Duration::ZERO,
        notification_ttl: Duration::from_millis(100),
        redirect_delay: Duration::from_millis(100),
        ..StorefrontConfig::default()
    }
}

/// A storefront over the live API with an in-memory session.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
#[allow(clippy::expect_used)]
pub fn live_storefront() -> Storefront {
    let config = test_config();
    let api = petalshop_storefront::api::ApiClient::new(&config).expect("Failed to build API client");
    Storefront::with_api(
        config,
        Arc::new(api),
        SessionContext::in_memory(),
        Arc::new(LogNavigator),
    )
}

/// A fresh, unique email for a throwaway account.
#[must_use]
pub fn unique_email() -> String {
    format!("it-{}@example.com", uuid::Uuid::new_v4().simple())
}
