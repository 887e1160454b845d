//! Catalog store: products, categories and the shopper's filter.
//!
//! Loads replace the held lists in one assignment. Filtering is pure and
//! works on the last successful load; it never reaches the network.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, instrument};

use petalshop_core::{
    CatalogFilter, Category, CategoryId, Price, PriceRange, Product, filter_products, max_price,
};

use crate::api::CommerceApi;
use crate::error::{ClientError, Result};

/// Outcome of loading categories and products together.
///
/// The two loads are independent; either may fail alone.
#[derive(Debug)]
pub struct CatalogLoad {
    pub categories: Result<Vec<Category>>,
    pub products: Result<Vec<Product>>,
}

/// Holds the fetched catalog and the active filter.
pub struct CatalogStore {
    api: Arc<dyn CommerceApi>,
    state: Mutex<CatalogState>,
}

#[derive(Default)]
struct CatalogState {
    categories: Vec<Category>,
    products: Vec<Product>,
    max_price: Price,
    filter: CatalogFilter,
}

impl CatalogStore {
    /// Create an empty store.
    #[must_use]
    pub fn new(api: Arc<dyn CommerceApi>) -> Self {
        Self {
            api,
            state: Mutex::new(CatalogState {
                max_price: Price::from_units(petalshop_core::catalog::DEFAULT_MAX_PRICE),
                ..CatalogState::default()
            }),
        }
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Fetch the categories, with the synthetic "All" entry first.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` if the fetch fails; the held list is kept.
    #[instrument(skip(self))]
    pub async fn load_categories(&self) -> Result<Vec<Category>> {
        let fetched = self
            .api
            .list_categories()
            .await
            .map_err(ClientError::from)
            .inspect_err(|e| e.report("catalog.categories"))?;

        let mut categories = Vec::with_capacity(fetched.len() + 1);
        categories.push(Category::all());
        categories.extend(fetched);

        self.lock().categories.clone_from(&categories);
        debug!(count = categories.len(), "Categories loaded");

        Ok(categories)
    }

    /// Fetch all products and reset the price range to `[0, max price]`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` if the fetch fails; the held list and
    /// filter are kept.
    #[instrument(skip(self))]
    pub async fn load_products(&self) -> Result<Vec<Product>> {
        let products = self
            .api
            .list_products()
            .await
            .map_err(ClientError::from)
            .inspect_err(|e| e.report("catalog.products"))?;

        let max = max_price(&products);
        {
            let mut state = self.lock();
            state.products.clone_from(&products);
            state.max_price = max;
            state.filter.price_range = PriceRange::up_to(max);
        }
        debug!(count = products.len(), max_price = %max, "Products loaded");

        Ok(products)
    }

    /// Load categories and products concurrently.
    pub async fn load_all(&self) -> CatalogLoad {
        let (categories, products) = tokio::join!(self.load_categories(), self.load_products());
        CatalogLoad {
            categories,
            products,
        }
    }

    /// Drop cached catalog data and load everything again.
    pub async fn refresh(&self) -> CatalogLoad {
        self.api.invalidate_catalog().await;
        self.load_all().await
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// Products passing the active filter, in fetched order.
    #[must_use]
    pub fn visible_products(&self) -> Vec<Product> {
        let state = self.lock();
        filter_products(&state.products, &state.filter)
    }

    #[must_use]
    pub fn products(&self) -> Vec<Product> {
        self.lock().products.clone()
    }

    #[must_use]
    pub fn categories(&self) -> Vec<Category> {
        self.lock().categories.clone()
    }

    /// Highest unit price among the loaded products.
    #[must_use]
    pub fn max_price(&self) -> Price {
        self.lock().max_price
    }

    #[must_use]
    pub fn filter(&self) -> CatalogFilter {
        self.lock().filter.clone()
    }

    // =========================================================================
    // Filter
    // =========================================================================

    pub fn set_category(&self, category: CategoryId) {
        self.lock().filter.category = category;
    }

    pub fn set_query(&self, query: impl Into<String>) {
        self.lock().filter.query = query.into();
    }

    pub fn set_in_stock_only(&self, in_stock_only: bool) {
        self.lock().filter.in_stock_only = in_stock_only;
    }

    /// Slider semantics: the range becomes `[0, ceiling]`, capped at the
    /// highest loaded price.
    pub fn set_price_ceiling(&self, ceiling: Price) {
        let mut state = self.lock();
        state.filter.price_range = PriceRange::up_to(ceiling.min(state.max_price));
    }

    /// Set both bounds, capped at the highest loaded price.
    pub fn set_price_range(&self, range: PriceRange) {
        let mut state = self.lock();
        let max = range.max.min(state.max_price);
        state.filter.price_range = PriceRange {
            min: range.min.min(max),
            max,
        };
    }

    /// Back to all categories, no query, any stock, full price range.
    pub fn reset_filter(&self) {
        let mut state = self.lock();
        state.filter = CatalogFilter {
            price_range: PriceRange::up_to(state.max_price),
            ..CatalogFilter::default()
        };
    }

    fn lock(&self) -> MutexGuard<'_, CatalogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use petalshop_core::catalog::ALL_CATEGORIES_LABEL;

    use super::*;
    use crate::testing::{Call, FakeApi, Failure, category, product};

    fn store_with(api: &Arc<FakeApi>) -> CatalogStore {
        CatalogStore::new(api.clone())
    }

    fn bouquet() -> Vec<Product> {
        vec![
            product(1, "Rose", 30, 5, 1),
            product(2, "Tulip", 20, 0, 1),
            product(3, "Orchid", 120, 2, 2),
        ]
    }

    #[tokio::test]
    async fn test_load_categories_prepends_all() {
        let api = Arc::new(FakeApi::new());
        api.set_categories(Ok(vec![category(1, "Güller"), category(2, "Orkideler")]));
        let store = store_with(&api);

        let categories = store.load_categories().await.unwrap();
        assert_eq!(categories.len(), 3);
        assert!(categories[0].id.is_all());
        assert_eq!(categories[0].name, ALL_CATEGORIES_LABEL);
        assert_eq!(store.categories(), categories);
    }

    #[tokio::test]
    async fn test_load_products_resets_price_range() {
        let api = Arc::new(FakeApi::new());
        api.set_products(Ok(bouquet()));
        let store = store_with(&api);
        store.set_price_ceiling(Price::from_units(10));

        store.load_products().await.unwrap();
        assert_eq!(store.max_price(), Price::from_units(120));
        assert_eq!(
            store.filter().price_range,
            PriceRange::up_to(Price::from_units(120))
        );
        assert_eq!(store.visible_products().len(), 3);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_previous_state() {
        let api = Arc::new(FakeApi::new());
        api.set_products(Ok(bouquet()));
        let store = store_with(&api);
        store.load_products().await.unwrap();

        api.set_products(Err(Failure::Server(500, None)));
        assert!(store.load_products().await.is_err());
        assert_eq!(store.products(), bouquet());
    }

    #[tokio::test]
    async fn test_first_failure_leaves_store_empty() {
        let api = Arc::new(FakeApi::new());
        api.set_categories(Err(Failure::Transport));
        let store = store_with(&api);

        assert!(store.load_categories().await.is_err());
        assert!(store.categories().is_empty());
    }

    #[tokio::test]
    async fn test_filtering_makes_no_calls() {
        let api = Arc::new(FakeApi::new());
        api.set_products(Ok(bouquet()));
        let store = store_with(&api);
        store.load_products().await.unwrap();
        let calls_before = api.calls().len();

        store.set_category(CategoryId::new(1));
        store.set_query("ros");
        store.set_in_stock_only(true);
        store.set_price_ceiling(Price::from_units(50));
        let visible = store.visible_products();

        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "Rose");
        assert_eq!(api.calls().len(), calls_before);

        store.set_price_ceiling(Price::from_units(10));
        assert!(store.visible_products().is_empty());
    }

    #[tokio::test]
    async fn test_price_ceiling_is_capped_at_max() {
        let api = Arc::new(FakeApi::new());
        api.set_products(Ok(bouquet()));
        let store = store_with(&api);
        store.load_products().await.unwrap();

        store.set_price_ceiling(Price::from_units(5000));
        assert_eq!(store.filter().price_range.max, Price::from_units(120));

        store.set_price_range(PriceRange {
            min: Price::from_units(200),
            max: Price::from_units(150),
        });
        let range = store.filter().price_range;
        assert_eq!(range.max, Price::from_units(120));
        assert!(range.min <= range.max);
    }

    #[tokio::test]
    async fn test_load_all_reports_each_result() {
        let api = Arc::new(FakeApi::new());
        api.set_categories(Err(Failure::Server(503, None)));
        api.set_products(Ok(bouquet()));
        let store = store_with(&api);

        let load = store.load_all().await;
        assert!(load.categories.is_err());
        assert_eq!(load.products.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_refresh_invalidates_first() {
        let api = Arc::new(FakeApi::new());
        let store = store_with(&api);

        let _ = store.refresh().await;
        assert_eq!(api.calls()[0], Call::InvalidateCatalog);
        assert_eq!(api.count(|c| *c == Call::ListProducts), 1);
    }

    #[tokio::test]
    async fn test_reset_filter() {
        let api = Arc::new(FakeApi::new());
        api.set_products(Ok(bouquet()));
        let store = store_with(&api);
        store.load_products().await.unwrap();

        store.set_query("rose");
        store.set_in_stock_only(true);
        store.reset_filter();

        let filter = store.filter();
        assert!(filter.query.is_empty());
        assert!(!filter.in_stock_only);
        assert_eq!(filter.price_range.max, Price::from_units(120));
    }
}
