//! The product record and its parse-with-defaults constructor.
//!
//! Backend product documents are loosely typed: any field may be absent or
//! carry the wrong JSON type. All reads go through [`Product::from_document`]
//! so the rest of the system only ever sees a fully populated record. In
//! particular an absent `stock` becomes 0 and never propagates into
//! arithmetic as a null.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::id::ProductId;
use crate::types::price::{CurrencyCode, Price};

/// Fallback display name for documents without a `name` field.
pub const DEFAULT_NAME: &str = "Unnamed";
/// Fallback category for documents without a `category` field.
pub const DEFAULT_CATEGORY: &str = "Other";

/// A catalog product.
///
/// Inside a cart this is a snapshot frozen at add (or last reconcile) time,
/// not a live view of the backend record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    /// Units purchasable right now, per the snapshot this record came from.
    /// The backend's copy is the only authoritative one.
    pub stock: u32,
    pub category: String,
    pub description: String,
    pub image: String,
}

impl Product {
    /// Build a product from a loosely typed backend document.
    ///
    /// Missing or mistyped fields fall back to defaults rather than failing:
    /// a half-filled document is still a sellable record, matching how the
    /// store behaves when the owner saves a product with optional fields
    /// left blank.
    #[must_use]
    pub fn from_document(id: ProductId, data: &Value) -> Self {
        Self {
            id,
            name: string_field(data, "name", DEFAULT_NAME),
            price: Price::new(decimal_field(data, "price"), CurrencyCode::default()),
            stock: stock_field(data),
            category: string_field(data, "category", DEFAULT_CATEGORY),
            description: string_field(data, "description", ""),
            image: string_field(data, "image", ""),
        }
    }

    /// Whether the snapshot shows no purchasable units.
    #[must_use]
    pub const fn is_out_of_stock(&self) -> bool {
        self.stock == 0
    }
}

fn string_field(data: &Value, key: &str, default: &str) -> String {
    data.get(key)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_owned()
}

/// Parse a decimal amount from a JSON number or string, defaulting to zero.
fn decimal_field(data: &Value, key: &str) -> Decimal {
    match data.get(key) {
        Some(Value::Number(n)) => n.to_string().parse().unwrap_or(Decimal::ZERO),
        Some(Value::String(s)) => s.parse().unwrap_or(Decimal::ZERO),
        _ => Decimal::ZERO,
    }
    .max(Decimal::ZERO)
}

/// Parse the stock count, clamping negatives and non-integers to zero.
fn stock_field(data: &Value) -> u32 {
    data.get("stock")
        .and_then(Value::as_u64)
        .map_or(0, |n| u32::try_from(n).unwrap_or(u32::MAX))
}
