//! The checkout transaction.
//!
//! The one operation in this system with a real correctness hazard:
//! multiple concurrent buyers must not be able to overdraw a product's
//! stock below zero. The purchase runs as a two-phase atomic transaction
//! against the backend: read every referenced product's current stock
//! inside the transaction's isolation snapshot, and only if every line can
//! be fulfilled apply all decrements together. Any failed read aborts the
//! whole attempt with nothing applied.
//!
//! The core performs no optimistic-concurrency retry of its own; if a
//! concurrent transaction committed first, the backend surfaces that as
//! [`CheckoutError::Conflict`] and the caller may let the user retry.

use serde_json::json;
use thiserror::Error;

use vivero_core::Product;

use crate::backend::{DocumentStore, StoreError};
use crate::cart::CartItem;

/// Why a purchase attempt did not commit. Whatever the reason, no stock
/// anywhere has changed and the cart is left exactly as it was.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// A carted product no longer exists in the catalog.
    #[error("\"{name}\" is no longer available")]
    ProductMissing { name: String },

    /// A carted quantity exceeds the authoritative stock.
    #[error("not enough stock for \"{name}\": {available} available")]
    InsufficientStock { name: String, available: u32 },

    /// A concurrent purchase committed first and the backend gave up
    /// retrying.
    #[error("the purchase conflicted with another order, please try again")]
    Conflict,

    /// Network or backend failure.
    #[error("backend unreachable: {0}")]
    Transport(String),
}

impl From<StoreError> for CheckoutError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Conflict => Self::Conflict,
            StoreError::Transport(message) => Self::Transport(message),
            other => Self::Transport(other.to_string()),
        }
    }
}

/// One planned decrement, computed in the read phase. The plan lives only
/// for the duration of a single attempt and is never partially applied.
struct StockUpdate {
    product_id: String,
    new_stock: u32,
}

/// Atomically decrement stock for every cart line.
///
/// On `Ok` every purchased item's stock has been reduced by exactly the
/// purchased quantity; the caller then clears the cart. On `Err` nothing
/// was mutated anywhere, so the user can adjust quantities and retry.
///
/// An empty cart is a no-op.
///
/// # Errors
///
/// See [`CheckoutError`]; all failures abort the whole attempt.
pub async fn checkout(
    store: &dyn DocumentStore,
    collection: &str,
    items: &[CartItem],
) -> Result<(), CheckoutError> {
    if items.is_empty() {
        return Ok(());
    }

    let mut tx = store.begin_transaction().await?;

    // Read phase: every line must be fulfillable before anything is written.
    let mut plan = Vec::with_capacity(items.len());
    for item in items {
        let doc = tx.get(collection, item.product.id.as_str()).await?;
        let Some(doc) = doc else {
            return Err(CheckoutError::ProductMissing {
                name: item.product.name.clone(),
            });
        };

        let available = Product::from_document(item.product.id.clone(), &doc.data).stock;
        if available < item.quantity {
            return Err(CheckoutError::InsufficientStock {
                name: item.product.name.clone(),
                available,
            });
        }

        plan.push(StockUpdate {
            product_id: item.product.id.to_string(),
            new_stock: available - item.quantity,
        });
    }

    // Write phase: all decrements together, applied by a single commit.
    for update in &plan {
        tx.update(collection, &update.product_id, json!({ "stock": update.new_stock }));
    }
    tx.commit().await?;

    tracing::info!(lines = items.len(), "checkout committed");
    Ok(())
}
