//! Placed orders.
//!
//! Orders are read-only history. Their totals are whatever the server
//! finalized when the order was placed; prices may have moved since, so the
//! total is never recomputed from the lines.

use std::num::NonZeroU32;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{OrderId, Price, ProductId};

/// A previously placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    #[serde(rename = "orderId")]
    pub id: OrderId,
    /// When the order was created.
    #[serde(rename = "orderDate", deserialize_with = "deserialize_timestamp")]
    pub placed_at: DateTime<Utc>,
    /// Server-computed total.
    #[serde(rename = "totalAmount")]
    pub total: Price,
    #[serde(rename = "flowers", default)]
    pub lines: Vec<OrderLine>,
}

/// One product in a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    #[serde(rename = "flowerId")]
    pub product_id: ProductId,
    #[serde(rename = "flowerName")]
    pub name: String,
    #[serde(rename = "imageUrl", default)]
    pub image_url: String,
    pub price: Price,
    pub quantity: NonZeroU32,
}

impl OrderLine {
    /// `price × quantity` at the time of ordering, or `None` if it overflows.
    #[must_use]
    pub fn line_total(&self) -> Option<Price> {
        self.price.times(self.quantity.get())
    }
}

/// Accepts RFC 3339 timestamps and offset-less ones (taken as UTC).
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!("unrecognized order timestamp: {raw}"))
    })
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
