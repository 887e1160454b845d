//! Cart commands.

use petalshop_core::{Price, ProductId};
use petalshop_storefront::Storefront;
use petalshop_storefront::cart::{CartStatus, CartView};

use super::{CommandError, print_notification};

/// Fetch and print the cart.
///
/// # Errors
///
/// Returns `CommandError` if nobody is signed in or the fetch fails.
pub async fn show(store: &Storefront) -> Result<(), CommandError> {
    let result = store.cart().fetch_cart().await;
    print_view(&store.cart().view());
    result?;
    Ok(())
}

/// Add one unit of a product and print the refreshed cart.
///
/// # Errors
///
/// Returns `CommandError` if nobody is signed in or the server refuses.
pub async fn add(store: &Storefront, product_id: ProductId) -> Result<(), CommandError> {
    let result = store.add_product_to_cart(product_id).await;
    print_notification(store);
    result?;
    print_view(&store.cart().view());
    Ok(())
}

/// Remove a product and print the refreshed cart.
///
/// # Errors
///
/// Returns `CommandError` if nobody is signed in or the server refuses.
pub async fn remove(store: &Storefront, product_id: ProductId) -> Result<(), CommandError> {
    let result = store.cart().remove_from_cart(product_id).await;
    print_notification(store);
    result?;
    print_view(&store.cart().view());
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_view(view: &CartView) {
    if let CartStatus::Error(message) = &view.status {
        println!("{message}");
        return;
    }

    if view.is_empty() {
        println!("Your cart is empty.");
        return;
    }

    for line in &view.lines {
        println!(
            "{:>4}  {:<24} {:>3} x {:>10} = {:>10}",
            line.product_id,
            line.name,
            line.quantity,
            line.price.display(),
            line.line_total().map_or_else(|| "-".to_string(), Price::display)
        );
    }
    println!("Total: {}", view.total.display());
}
