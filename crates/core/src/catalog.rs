//! Catalog types and the catalog filter.
//!
//! [`filter_products`] is the single place where "which products does the
//! shopper see" is decided. It is pure: the same products and filter always
//! give the same result, in the same order the server returned them.

use serde::{Deserialize, Serialize};

use crate::types::{CategoryId, Price, ProductId};

/// Upper price bound used when the catalog is empty.
pub const DEFAULT_MAX_PRICE: u32 = 1000;

/// Label of the synthetic "all categories" entry.
pub const ALL_CATEGORIES_LABEL: &str = "All";

// =============================================================================
// Catalog Types
// =============================================================================

/// A product (a flower arrangement) as listed by the shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Server-assigned product id.
    #[serde(rename = "flowerId")]
    pub id: ProductId,
    /// Display name.
    #[serde(rename = "flowerName")]
    pub name: String,
    /// Unit price.
    pub price: Price,
    /// Units in stock.
    #[serde(rename = "stockQuantity")]
    pub stock: u32,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Image URL.
    #[serde(rename = "imageUrl", default)]
    pub image_url: String,
    /// Category the product belongs to.
    #[serde(rename = "categoryId")]
    pub category_id: CategoryId,
    /// Category display name, when the server joins it in.
    #[serde(default)]
    pub category: Option<String>,
}

impl Product {
    /// Whether at least one unit is in stock.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category id. [`CategoryId::ALL`] is reserved.
    #[serde(rename = "categoryId")]
    pub id: CategoryId,
    /// Display name.
    #[serde(rename = "categoryName")]
    pub name: String,
}

impl Category {
    /// The synthetic "All" entry shown first in the category bar.
    #[must_use]
    pub fn all() -> Self {
        Self {
            id: CategoryId::ALL,
            name: ALL_CATEGORIES_LABEL.to_string(),
        }
    }
}

// =============================================================================
// Filtering
// =============================================================================

/// Inclusive price bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    /// Lowest accepted price.
    pub min: Price,
    /// Highest accepted price.
    pub max: Price,
}

impl PriceRange {
    /// Range from zero up to `max`.
    #[must_use]
    pub const fn up_to(max: Price) -> Self {
        Self {
            min: Price::ZERO,
            max,
        }
    }

    /// Whether `price` lies within the bounds.
    #[must_use]
    pub fn contains(&self, price: Price) -> bool {
        self.min <= price && price <= self.max
    }
}

impl Default for PriceRange {
    fn default() -> Self {
        Self::up_to(Price::from_units(DEFAULT_MAX_PRICE))
    }
}

/// The shopper's current catalog filter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CatalogFilter {
    /// Selected category, or [`CategoryId::ALL`].
    pub category: CategoryId,
    /// Free-text search over name and description.
    pub query: String,
    /// Hide products with no stock.
    pub in_stock_only: bool,
    /// Accepted price bounds.
    pub price_range: PriceRange,
}

impl CatalogFilter {
    /// Whether `product` passes every part of the filter.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        let needle = self.query.to_lowercase();
        self.matches_with_needle(product, &needle)
    }

    fn matches_with_needle(&self, product: &Product, needle: &str) -> bool {
        (self.category.is_all() || product.category_id == self.category)
            && (needle.is_empty()
                || product.name.to_lowercase().contains(needle)
                || product.description.to_lowercase().contains(needle))
            && (!self.in_stock_only || product.in_stock())
            && self.price_range.contains(product.price)
    }
}

/// Products that pass `filter`, in their original order.
#[must_use]
pub fn filter_products(products: &[Product], filter: &CatalogFilter) -> Vec<Product> {
    let needle = filter.query.to_lowercase();
    products
        .iter()
        .filter(|product| filter.matches_with_needle(product, &needle))
        .cloned()
        .collect()
}

/// Highest unit price in `products`, or [`DEFAULT_MAX_PRICE`] when empty.
#[must_use]
pub fn max_price(products: &[Product]) -> Price {
    products
        .iter()
        .map(|product| product.price)
        .max()
        .unwrap_or_else(|| Price::from_units(DEFAULT_MAX_PRICE))
}
