//! Shop API access.
//!
//! # Architecture
//!
//! - [`CommerceApi`] is the seam every component talks to; it mirrors the
//!   shop's HTTP JSON endpoints one method per endpoint
//! - [`ApiClient`] implements it over `reqwest`
//! - The server is the source of truth - NO local sync, direct API calls
//! - Catalog reads are cached via `moka`; cart and order calls never are
//!
//! # Example
//!
//! ```rust,ignore
//! use petalshop_storefront::api::{ApiClient, CommerceApi};
//!
//! let client = ApiClient::new(&config)?;
//! let products = client.list_products().await?;
//! client.add_to_cart("ayse@example.com", products[0].id).await?;
//! let lines = client.get_cart("ayse@example.com").await?;
//! ```

mod http;
pub mod types;

pub use http::ApiClient;
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

use petalshop_core::{CartId, CartLine, Category, Order, Product, ProductId};

/// Errors that can occur when talking to the shop API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the JSON we expected.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Server answered with a non-success status.
    #[error("Server returned {status}: {}", message.as_deref().unwrap_or("(no message)"))]
    Server {
        /// HTTP status code.
        status: u16,
        /// `message` field from the response body, if any.
        message: Option<String>,
    },

    /// Server answered `success: false`.
    #[error("Request rejected: {}", message.as_deref().unwrap_or("(no message)"))]
    Rejected {
        /// `message` field from the response body, if any.
        message: Option<String>,
    },

    /// Rate limited by the server.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),
}

impl ApiError {
    /// The server-provided message, when there is a non-blank one.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Server { message, .. } | Self::Rejected { message } => message
                .as_deref()
                .map(str::trim)
                .filter(|message| !message.is_empty()),
            _ => None,
        }
    }

    /// Whether the request never produced a usable server answer.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Parse(_))
    }
}

/// The shop's HTTP JSON API, one method per endpoint.
///
/// Every user-scoped call takes the plain-text username (the shopper's
/// email). The API does not ask for a token on these calls.
#[async_trait]
pub trait CommerceApi: Send + Sync {
    /// `GET /flowers/categories`
    async fn list_categories(&self) -> Result<Vec<Category>, ApiError>;

    /// `GET /flowers`
    async fn list_products(&self) -> Result<Vec<Product>, ApiError>;

    /// `GET /cart/get-by-username?username=`
    async fn get_cart(&self, username: &str) -> Result<Vec<CartLine>, ApiError>;

    /// `POST /cart/add`
    async fn add_to_cart(
        &self,
        username: &str,
        product_id: ProductId,
    ) -> Result<Acknowledgement, ApiError>;

    /// `POST /cart/remove`
    async fn remove_from_cart(
        &self,
        username: &str,
        product_id: ProductId,
    ) -> Result<Acknowledgement, ApiError>;

    /// `POST /order/create`
    async fn create_order(&self, username: &str, cart_id: CartId)
    -> Result<Acknowledgement, ApiError>;

    /// `GET /order/user/{username}`
    async fn list_orders(&self, username: &str) -> Result<Vec<Order>, ApiError>;

    /// `POST /auth/login`
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError>;

    /// `POST /auth/register`
    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError>;

    /// Drop any cached catalog data so the next read goes to the server.
    async fn invalidate_catalog(&self) {}
}
