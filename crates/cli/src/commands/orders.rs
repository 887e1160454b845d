//! Order commands.

use petalshop_storefront::Storefront;

use super::{CommandError, print_notification};

/// Order the current cart.
///
/// The cart is fetched first so the order is placed for what the server
/// holds right now.
///
/// # Errors
///
/// Returns `CommandError` if nobody is signed in, the cart is empty or the
/// server refuses the order.
#[allow(clippy::print_stdout)]
pub async fn place(store: &Storefront) -> Result<(), CommandError> {
    store.cart().fetch_cart().await?;

    let result = store.orders().place_order().await;
    print_notification(store);

    let placed = result?;
    println!(
        "Cart #{} ordered, total {}",
        placed.cart_id,
        placed.total.display()
    );
    Ok(())
}

/// Print past orders, newest as the server sends them.
///
/// # Errors
///
/// Returns `CommandError` if nobody is signed in or the fetch fails.
#[allow(clippy::print_stdout)]
pub async fn list(store: &Storefront) -> Result<(), CommandError> {
    let orders = store.history().load_orders().await?;

    if orders.is_empty() {
        println!("You have no orders yet.");
        return Ok(());
    }

    for order in &orders {
        println!(
            "Order #{}  {}  Total: {}",
            order.id,
            order.placed_at.format("%d.%m.%Y %H:%M"),
            order.total.display()
        );
        for line in &order.lines {
            println!(
                "    {:<24} {:>3} x {:>10}",
                line.name,
                line.quantity,
                line.price.display()
            );
        }
    }
    Ok(())
}
