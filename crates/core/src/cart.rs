//! Cart lines and cart totals.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::types::{CartId, CategoryId, Price, PriceError, ProductId};

/// One product-quantity pairing in a shopper's cart, as reported by the server.
///
/// Carries a denormalized copy of the product so the cart can be rendered
/// without the catalog. Quantity is whatever the server last said it was.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(rename = "flowerId")]
    pub product_id: ProductId,
    #[serde(rename = "flowerName")]
    pub name: String,
    pub price: Price,
    #[serde(rename = "stockQuantity", default)]
    pub stock: u32,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "imageUrl", default)]
    pub image_url: String,
    #[serde(rename = "categoryId", default)]
    pub category_id: CategoryId,
    #[serde(default)]
    pub category: Option<String>,
    pub quantity: NonZeroU32,
    #[serde(rename = "cartId")]
    pub cart_id: CartId,
}

impl CartLine {
    /// `price × quantity` for this line, or `None` if it overflows.
    #[must_use]
    pub fn line_total(&self) -> Option<Price> {
        self.price.times(self.quantity.get())
    }
}

/// Sum of `price × quantity` over exactly the given lines.
///
/// # Errors
///
/// Returns [`PriceError::Overflow`] if a line total or the sum does not fit
/// in a decimal.
pub fn cart_total(lines: &[CartLine]) -> Result<Price, PriceError> {
    lines
        .iter()
        .try_fold(Price::ZERO, |total, line| {
            line.line_total()
                .and_then(|line_total| total.checked_add(line_total))
        })
        .ok_or(PriceError::Overflow)
}

/// The cart id shared by every line, taken from the first one.
///
/// The server groups a user's lines into a single cart, so the first line
/// speaks for all of them.
#[must_use]
pub fn cart_id_of(lines: &[CartLine]) -> Option<CartId> {
    lines.first().map(|line| line.cart_id)
}
