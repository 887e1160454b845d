//! Catalog commands.

use petalshop_core::{CategoryId, Price};
use petalshop_storefront::Storefront;

use super::CommandError;

/// Filter options for `petalshop products`.
#[derive(Debug, Default)]
pub struct ProductFilter {
    pub category: Option<CategoryId>,
    pub query: Option<String>,
    pub in_stock: bool,
    pub max_price: Option<Price>,
}

/// List the categories, "All" first.
///
/// # Errors
///
/// Returns `CommandError` if the categories cannot be fetched.
#[allow(clippy::print_stdout)]
pub async fn categories(store: &Storefront) -> Result<(), CommandError> {
    for category in store.catalog().load_categories().await? {
        println!("{:>4}  {}", category.id, category.name);
    }
    Ok(())
}

/// List the products that pass `filter`.
///
/// # Errors
///
/// Returns `CommandError` if the products cannot be fetched.
#[allow(clippy::print_stdout)]
pub async fn products(store: &Storefront, filter: ProductFilter) -> Result<(), CommandError> {
    let catalog = store.catalog();
    let all = catalog.load_products().await?;

    if let Some(category) = filter.category {
        catalog.set_category(category);
    }
    if let Some(query) = filter.query {
        catalog.set_query(query);
    }
    catalog.set_in_stock_only(filter.in_stock);
    if let Some(max_price) = filter.max_price {
        catalog.set_price_ceiling(max_price);
    }

    let visible = catalog.visible_products();
    for product in &visible {
        let stock = if product.in_stock() {
            format!("{} in stock", product.stock)
        } else {
            "out of stock".to_string()
        };
        println!(
            "{:>4}  {:<24} {:>10}  {}",
            product.id,
            product.name,
            product.price.display(),
            stock
        );
    }
    println!(
        "{} of {} products (up to {})",
        visible.len(),
        all.len(),
        catalog.filter().price_range.max.display()
    );
    Ok(())
}
