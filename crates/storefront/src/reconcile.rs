//! Inventory reconciliation.
//!
//! Cart lines hold product snapshots frozen at add time; the backend's
//! records keep moving. When the cart view becomes active this module
//! re-fetches the authoritative record for every line and corrects drift:
//! changed price, name, or stock refreshes the snapshot and caps the
//! quantity at the available stock; a deleted product drops the line.
//!
//! Reconciliation is advisory. Reads are issued independently per line with
//! no cross-item atomicity; the only operation with a strong consistency
//! guarantee is [`crate::checkout`].

use vivero_core::{Product, ProductId};

use crate::backend::{DocumentStore, StoreResult};
use crate::cart::CartItem;

/// Outcome of reconciling a cart against the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// No line drifted; the cart must not be rewritten.
    Unchanged,
    /// At least one line drifted. `items` is the corrected sequence to apply
    /// via a wholesale replace; `removed` names the products that no longer
    /// exist, for the user-facing notice.
    Changed {
        items: Vec<CartItem>,
        removed: Vec<ProductId>,
    },
}

impl Reconciliation {
    /// Whether anything drifted.
    #[must_use]
    pub const fn changed(&self) -> bool {
        matches!(self, Self::Changed { .. })
    }
}

/// Compare every cart line against the backend's current product records.
///
/// # Errors
///
/// Propagates backend read failures; in that case nothing should be applied
/// to the cart and the stale snapshots remain in place.
pub async fn reconcile(
    store: &dyn DocumentStore,
    collection: &str,
    items: &[CartItem],
) -> StoreResult<Reconciliation> {
    if items.is_empty() {
        return Ok(Reconciliation::Unchanged);
    }

    let mut changed = false;
    let mut updated = Vec::with_capacity(items.len());
    let mut removed = Vec::new();

    for item in items {
        let Some(doc) = store.get_document(collection, item.product.id.as_str()).await? else {
            // The product was deleted from the catalog; drop the line.
            changed = true;
            removed.push(item.product.id.clone());
            continue;
        };

        let fresh = Product::from_document(item.product.id.clone(), &doc.data);
        if fresh.price == item.product.price
            && fresh.name == item.product.name
            && fresh.stock == item.product.stock
        {
            updated.push(item.clone());
            continue;
        }

        changed = true;
        let quantity = item.quantity.min(fresh.stock);
        updated.push(CartItem::new(fresh, quantity));
    }

    if changed {
        Ok(Reconciliation::Changed {
            items: updated,
            removed,
        })
    } else {
        Ok(Reconciliation::Unchanged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MemoryStore, StoreError};
    use serde_json::json;

    const PRODUCTS: &str = "products";

    fn snapshot(id: &str, name: &str, price: &str, stock: u32) -> Product {
        Product::from_document(
            ProductId::new(id),
            &json!({ "name": name, "price": price, "stock": stock }),
        )
    }

    async fn seeded_store(docs: &[(&str, serde_json::Value)]) -> MemoryStore {
        let store = MemoryStore::new();
        for (id, data) in docs {
            store.set_document(PRODUCTS, id, data.clone()).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_no_drift_leaves_cart_untouched() {
        let store = seeded_store(&[(
            "p1",
            json!({ "name": "Fern", "price": "4.00", "stock": 6 }),
        )])
        .await;
        let items = vec![CartItem::new(snapshot("p1", "Fern", "4.00", 6), 2)];

        let outcome = reconcile(&store, PRODUCTS, &items).await.unwrap();
        assert_eq!(outcome, Reconciliation::Unchanged);
    }

    #[tokio::test]
    async fn test_stock_drop_caps_quantity_and_refreshes_snapshot() {
        let store = seeded_store(&[(
            "p1",
            json!({ "name": "Fern", "price": "5.50", "stock": 2 }),
        )])
        .await;
        // Carted 5 back when stock was 10 at a lower price.
        let items = vec![CartItem::new(snapshot("p1", "Fern", "4.00", 10), 5)];

        let Reconciliation::Changed { items, removed } =
            reconcile(&store, PRODUCTS, &items).await.unwrap()
        else {
            panic!("expected drift");
        };

        assert!(removed.is_empty());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[0].product.price.amount, "5.50".parse().unwrap());
        assert_eq!(items[0].product.stock, 2);
    }

    #[tokio::test]
    async fn test_stock_exhausted_keeps_line_at_zero() {
        let store = seeded_store(&[(
            "p1",
            json!({ "name": "Fern", "price": "4.00", "stock": 0 }),
        )])
        .await;
        let items = vec![CartItem::new(snapshot("p1", "Fern", "4.00", 3), 2)];

        let Reconciliation::Changed { items, .. } =
            reconcile(&store, PRODUCTS, &items).await.unwrap()
        else {
            panic!("expected drift");
        };
        assert_eq!(items[0].quantity, 0);
    }

    #[tokio::test]
    async fn test_missing_product_dropped_and_reported() {
        let store = seeded_store(&[(
            "p2",
            json!({ "name": "Cactus", "price": "3.00", "stock": 4 }),
        )])
        .await;
        let items = vec![
            CartItem::new(snapshot("p1", "Fern", "4.00", 6), 1),
            CartItem::new(snapshot("p2", "Cactus", "3.00", 4), 1),
        ];

        let Reconciliation::Changed { items, removed } =
            reconcile(&store, PRODUCTS, &items).await.unwrap()
        else {
            panic!("expected drift");
        };

        assert_eq!(removed, vec![ProductId::new("p1")]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product.id, ProductId::new("p2"));
    }

    #[tokio::test]
    async fn test_price_only_drift_preserves_quantity() {
        let store = seeded_store(&[(
            "p1",
            json!({ "name": "Fern", "price": "6.00", "stock": 6 }),
        )])
        .await;
        let items = vec![CartItem::new(snapshot("p1", "Fern", "4.00", 6), 3)];

        let Reconciliation::Changed { items, .. } =
            reconcile(&store, PRODUCTS, &items).await.unwrap()
        else {
            panic!("expected drift");
        };
        assert_eq!(items[0].quantity, 3);
        assert_eq!(items[0].product.price.amount, "6.00".parse().unwrap());
    }

    #[tokio::test]
    async fn test_read_failure_propagates() {
        let store = seeded_store(&[]).await;
        store.set_offline(true);
        let items = vec![CartItem::new(snapshot("p1", "Fern", "4.00", 6), 1)];

        let err = reconcile(&store, PRODUCTS, &items).await.unwrap_err();
        assert!(matches!(err, StoreError::Transport(_)));
    }

    #[tokio::test]
    async fn test_empty_cart_short_circuits() {
        let store = seeded_store(&[]).await;
        store.set_offline(true);

        // No lines, no reads, no error.
        let outcome = reconcile(&store, PRODUCTS, &[]).await.unwrap();
        assert_eq!(outcome, Reconciliation::Unchanged);
    }
}
