//! Storefront state shared across the front end.

use std::sync::Arc;

use petalshop_core::{ProductId, SessionIdentity};

use crate::api::{ApiClient, ApiError, CommerceApi};
use crate::cart::CartSynchronizer;
use crate::catalog::{CatalogLoad, CatalogStore};
use crate::config::StorefrontConfig;
use crate::error::Result;
use crate::navigation::Navigator;
use crate::notify::Notifier;
use crate::orders::{OrderHistory, OrderSubmitter};
use crate::services::auth::AuthService;
use crate::session::SessionContext;

/// Every storefront component, wired over one API client, one session and
/// one notification slot.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    config: StorefrontConfig,
    session: SessionContext,
    notifier: Notifier,
    catalog: CatalogStore,
    cart: CartSynchronizer,
    orders: OrderSubmitter,
    history: OrderHistory,
    auth: AuthService,
}

impl Storefront {
    /// Create the storefront over the HTTP API, with the session persisted
    /// at `config.session_file`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built.
    pub fn new(
        config: StorefrontConfig,
        navigator: Arc<dyn Navigator>,
    ) -> std::result::Result<Self, ApiError> {
        let api = ApiClient::new(&config)?;
        let session = SessionContext::load(&config.session_file);
        Ok(Self::with_api(config, Arc::new(api), session, navigator))
    }

    /// Create the storefront over any `CommerceApi`.
    #[must_use]
    pub fn with_api(
        config: StorefrontConfig,
        api: Arc<dyn CommerceApi>,
        session: SessionContext,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let notifier = Notifier::new(config.notification_ttl);
        let catalog = CatalogStore::new(Arc::clone(&api));
        let cart = CartSynchronizer::new(Arc::clone(&api), session.clone(), notifier.clone());
        let orders = OrderSubmitter::new(
            Arc::clone(&api),
            session.clone(),
            cart.clone(),
            notifier.clone(),
            Arc::clone(&navigator),
            config.redirect_delay,
        );
        let history = OrderHistory::new(Arc::clone(&api), session.clone());
        let auth = AuthService::new(
            api,
            session.clone(),
            notifier.clone(),
            navigator,
            config.redirect_delay,
        );

        Self {
            inner: Arc::new(StorefrontInner {
                config,
                session,
                notifier,
                catalog,
                cart,
                orders,
                history,
                auth,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn session(&self) -> &SessionContext {
        &self.inner.session
    }

    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogStore {
        &self.inner.catalog
    }

    #[must_use]
    pub fn cart(&self) -> &CartSynchronizer {
        &self.inner.cart
    }

    #[must_use]
    pub fn orders(&self) -> &OrderSubmitter {
        &self.inner.orders
    }

    #[must_use]
    pub fn history(&self) -> &OrderHistory {
        &self.inner.history
    }

    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    /// The signed-in shopper, if any.
    #[must_use]
    pub fn current_identity(&self) -> Option<SessionIdentity> {
        self.inner.session.current_identity()
    }

    /// Load categories and products concurrently, reporting each result.
    ///
    /// Always asks the server; cached catalog reads are dropped first so
    /// stock reflects recent cart and order changes.
    pub async fn load_catalog(&self) -> CatalogLoad {
        self.inner.catalog.refresh().await
    }

    /// Put a catalog product in the cart.
    ///
    /// # Errors
    ///
    /// See [`CartSynchronizer::add_to_cart`].
    pub async fn add_product_to_cart(&self, product_id: ProductId) -> Result<()> {
        self.inner.cart.add_to_cart(product_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use secrecy::SecretString;

    use super::*;
    use crate::api::LoginResponse;
    use crate::navigation::LogNavigator;
    use crate::testing::{Call, FakeApi, category, line, product};

    fn storefront(api: &Arc<FakeApi>) -> Storefront {
        Storefront::with_api(
            StorefrontConfig::default(),
            api.clone(),
            SessionContext::in_memory(),
            Arc::new(LogNavigator),
        )
    }

    #[tokio::test]
    async fn test_components_share_session() {
        let api = Arc::new(FakeApi::new());
        api.set_login(Ok(LoginResponse {
            success: true,
            message: None,
            token: None,
        }));
        let store = storefront(&api);
        assert!(store.current_identity().is_none());

        store
            .auth()
            .login("ayse@example.com", SecretString::from("pw"))
            .await
            .unwrap();

        store.cart().fetch_cart().await.unwrap();
        store.history().load_orders().await.unwrap();
        assert!(
            api.calls()
                .contains(&Call::GetCart("ayse@example.com".to_string()))
        );
        assert!(
            api.calls()
                .contains(&Call::ListOrders("ayse@example.com".to_string()))
        );
    }

    #[tokio::test]
    async fn test_load_catalog_bypasses_cache() {
        let api = Arc::new(FakeApi::new());
        api.set_products(Ok(vec![product(1, "Rose", 30, 5, 1)]));
        let store = storefront(&api);

        store.load_catalog().await;
        api.set_products(Ok(vec![product(1, "Rose", 30, 0, 1)]));
        let load = store.load_catalog().await;

        assert!(!load.products.unwrap()[0].in_stock());
        assert_eq!(api.calls()[0], Call::InvalidateCatalog);
        assert_eq!(api.count(|call| *call == Call::InvalidateCatalog), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_browse_add_and_order() {
        let api = Arc::new(FakeApi::new());
        api.set_categories(Ok(vec![category(1, "Güller")]));
        api.set_products(Ok(vec![product(1, "Rose", 30, 5, 1)]));
        api.set_login(Ok(LoginResponse {
            success: true,
            message: None,
            token: None,
        }));
        let store = storefront(&api);

        let load = store.load_catalog().await;
        assert_eq!(load.categories.unwrap().len(), 2);
        let rose = load.products.unwrap()[0].id;

        store
            .auth()
            .login("ayse@example.com", SecretString::from("pw"))
            .await
            .unwrap();

        api.set_cart(Ok(vec![line(1, 30, 2, 7)]));
        store.add_product_to_cart(rose).await.unwrap();
        assert_eq!(store.cart().view().total.to_string(), "60.00");

        store.orders().place_order().await.unwrap();
        assert!(store.cart().view().is_empty());
        assert!(store.notifier().current().success);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!store.notifier().current().visible);
    }
}
