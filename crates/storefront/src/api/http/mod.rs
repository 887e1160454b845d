//! HTTP implementation of [`CommerceApi`].
//!
//! Uses `reqwest` for transport and caches catalog reads using `moka`.
//! Every request carries an `x-request-id` header for correlation with
//! server logs.

mod cache;

use std::sync::Arc;

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::{RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use uuid::Uuid;

use petalshop_core::{CartId, CartLine, Category, Order, Product, ProductId};

use crate::api::types::{CartMutation, CreateOrder, ErrorBody};
use crate::api::{
    Acknowledgement, ApiError, AuthResponse, CommerceApi, LoginRequest, LoginResponse,
    RegisterRequest,
};
use crate::config::StorefrontConfig;

use cache::{CacheKey, CacheValue};

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// How much of a response body to keep in logs.
const LOGGED_BODY_CHARS: usize = 500;

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the shop's HTTP JSON API.
///
/// Cheap to clone. Products and categories are cached for the configured
/// TTL; cart, order and auth calls always hit the server.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    config: StorefrontConfig,
    cache: Option<Cache<CacheKey, CacheValue>>,
}

/// Status and body of a completed request.
struct RawResponse {
    status: StatusCode,
    body: String,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built.
    pub fn new(config: &StorefrontConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        let cache = (!config.catalog_cache_ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(16)
                .time_to_live(config.catalog_cache_ttl)
                .build()
        });

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                config: config.clone(),
                cache,
            }),
        })
    }

    /// Send a request and read the whole body.
    async fn send(&self, request: RequestBuilder) -> Result<RawResponse, ApiError> {
        let request_id = Uuid::new_v4().to_string();

        let response = request
            .header(REQUEST_ID_HEADER, &request_id)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        debug!(request_id = %request_id, status = %status, "API response received");

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        let body = response.text().await?;
        Ok(RawResponse { status, body })
    }

    /// GET a JSON document.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.inner.config.endpoint(path);
        let raw = self.send(self.inner.client.get(&url)).await?;
        check_status(&raw)?;

        serde_json::from_str(&raw.body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %truncate(&raw.body),
                "Failed to parse API response"
            );
            ApiError::Parse(e)
        })
    }

    /// POST a JSON body to a mutation endpoint whose answer body is optional.
    async fn post_ack<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Acknowledgement, ApiError> {
        let url = self.inner.config.endpoint(path);
        let raw = self.send(self.inner.client.post(&url).json(body)).await?;
        check_status(&raw)?;

        Ok(serde_json::from_str::<Acknowledgement>(&raw.body).unwrap_or_default())
    }

    /// POST to an auth endpoint, which reports failures in the body.
    async fn post_auth<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.inner.config.endpoint(path);
        let raw = self.send(self.inner.client.post(&url).json(body)).await?;

        serde_json::from_str(&raw.body).map_err(|e| {
            debug!(error = %e, status = %raw.status, "Auth response is not JSON");
            let text = raw.body.trim();
            if text.is_empty() {
                ApiError::Parse(e)
            } else {
                ApiError::Rejected {
                    message: Some(text.to_string()),
                }
            }
        })
    }

    async fn cached(&self, key: CacheKey) -> Option<CacheValue> {
        match &self.inner.cache {
            Some(cache) => cache.get(&key).await,
            None => None,
        }
    }

    async fn store(&self, key: CacheKey, value: CacheValue) {
        if let Some(cache) = &self.inner.cache {
            cache.insert(key, value).await;
        }
    }
}

#[async_trait]
impl CommerceApi for ApiClient {
    // =========================================================================
    // Catalog (cached)
    // =========================================================================

    #[instrument(skip(self))]
    async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        if let Some(CacheValue::Categories(categories)) = self.cached(CacheKey::Categories).await {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let categories: Vec<Category> = self.get_json("/flowers/categories").await?;
        self.store(
            CacheKey::Categories,
            CacheValue::Categories(categories.clone()),
        )
        .await;

        Ok(categories)
    }

    #[instrument(skip(self))]
    async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        if let Some(CacheValue::Products(products)) = self.cached(CacheKey::Products).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let products: Vec<Product> = self.get_json("/flowers").await?;
        self.store(CacheKey::Products, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    async fn invalidate_catalog(&self) {
        if let Some(cache) = &self.inner.cache {
            cache.invalidate_all();
            cache.run_pending_tasks().await;
        }
    }

    // =========================================================================
    // Cart (not cached - mutable state)
    // =========================================================================

    #[instrument(skip(self, username))]
    async fn get_cart(&self, username: &str) -> Result<Vec<CartLine>, ApiError> {
        let path = format!(
            "/cart/get-by-username?username={}",
            urlencoding::encode(username)
        );
        self.get_json(&path).await
    }

    #[instrument(skip(self, username))]
    async fn add_to_cart(
        &self,
        username: &str,
        product_id: ProductId,
    ) -> Result<Acknowledgement, ApiError> {
        self.post_ack(
            "/cart/add",
            &CartMutation {
                username,
                product_id,
            },
        )
        .await
    }

    #[instrument(skip(self, username))]
    async fn remove_from_cart(
        &self,
        username: &str,
        product_id: ProductId,
    ) -> Result<Acknowledgement, ApiError> {
        self.post_ack(
            "/cart/remove",
            &CartMutation {
                username,
                product_id,
            },
        )
        .await
    }

    // =========================================================================
    // Orders
    // =========================================================================

    #[instrument(skip(self, username))]
    async fn create_order(
        &self,
        username: &str,
        cart_id: CartId,
    ) -> Result<Acknowledgement, ApiError> {
        self.post_ack("/order/create", &CreateOrder { username, cart_id })
            .await
    }

    #[instrument(skip(self, username))]
    async fn list_orders(&self, username: &str) -> Result<Vec<Order>, ApiError> {
        let path = format!("/order/user/{}", urlencoding::encode(username));
        self.get_json(&path).await
    }

    // =========================================================================
    // Auth
    // =========================================================================

    #[instrument(skip(self, request))]
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.post_auth("/auth/login", request).await
    }

    #[instrument(skip(self, request))]
    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        self.post_auth("/auth/register", request).await
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Turn a non-success status into `ApiError::Server`, keeping the body's
/// `message` when it has one.
fn check_status(raw: &RawResponse) -> Result<(), ApiError> {
    if raw.status.is_success() {
        return Ok(());
    }

    tracing::error!(
        status = %raw.status,
        body = %truncate(&raw.body),
        "Shop API returned non-success status"
    );

    Err(ApiError::Server {
        status: raw.status.as_u16(),
        message: error_message(&raw.body),
    })
}

/// The `message` field of a JSON error body, if any.
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.message)
}

fn truncate(body: &str) -> String {
    body.chars().take(LOGGED_BODY_CHARS).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn raw(status: u16, body: &str) -> RawResponse {
        RawResponse {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_check_status_success() {
        assert!(check_status(&raw(200, "")).is_ok());
        assert!(check_status(&raw(204, "")).is_ok());
    }

    #[test]
    fn test_check_status_keeps_server_message() {
        let err = check_status(&raw(400, r#"{"message": "Stok yok"}"#)).unwrap_err();
        assert_eq!(err.server_message(), Some("Stok yok"));
    }

    #[test]
    fn test_check_status_without_json_body() {
        let err = check_status(&raw(500, "Internal Server Error")).unwrap_err();
        assert!(matches!(err, ApiError::Server { status: 500, message: None }));
    }

    #[test]
    fn test_error_message_ignores_non_objects() {
        assert_eq!(error_message(r#""Stok yok""#), None);
        assert_eq!(error_message(r#"{"title": "Bad Request"}"#), None);
    }

    #[test]
    fn test_truncate() {
        let long = "x".repeat(2 * LOGGED_BODY_CHARS);
        assert_eq!(truncate(&long).len(), LOGGED_BODY_CHARS);
    }

    #[tokio::test]
    async fn test_client_without_cache() {
        let config = StorefrontConfig {
            catalog_cache_ttl: std::time::Duration::ZERO,
            ..StorefrontConfig::default()
        };
        let client = ApiClient::new(&config).unwrap_or_else(|e| panic!("client: {e}"));
        assert!(client.inner.cache.is_none());
        assert!(client.cached(CacheKey::Products).await.is_none());
    }
}
