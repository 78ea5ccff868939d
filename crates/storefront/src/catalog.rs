//! Product catalog access.
//!
//! Read paths return well-typed [`Product`] records built with
//! parse-with-defaults at the store boundary, so loosely typed backend
//! documents never leak further in. All reads are point-in-time snapshots
//! subject to staleness; the detail view bounds that staleness with a live
//! subscription, the cart view with reconciliation.
//!
//! The owner-mode write paths (create/update/delete) are plain document
//! writes; role gating happens at the caller, next to the session state.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tokio::sync::watch;

use vivero_core::{Product, ProductId};

use crate::backend::{DocumentStore, StoreResult};

/// Editable product fields, as entered on the owner's add/edit form.
#[derive(Debug, Clone)]
pub struct ProductForm {
    pub name: String,
    pub price: Decimal,
    pub stock: u32,
    pub category: Option<String>,
    pub description: String,
    pub image: String,
}

impl ProductForm {
    fn to_document(&self) -> Value {
        json!({
            "name": self.name,
            "price": self.price,
            "stock": self.stock,
            "category": self.category.clone().unwrap_or_else(|| vivero_core::DEFAULT_CATEGORY.to_owned()),
            "description": self.description,
            "image": self.image,
        })
    }
}

/// Catalog reads and owner-mode writes over the products collection.
#[derive(Clone)]
pub struct ProductCatalog {
    store: Arc<dyn DocumentStore>,
    collection: String,
}

impl ProductCatalog {
    /// Create a catalog over a products collection.
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    /// Fetch the whole catalog.
    ///
    /// # Errors
    ///
    /// Propagates backend read failures.
    pub async fn list_products(&self) -> StoreResult<Vec<Product>> {
        let docs = self.store.list_documents(&self.collection).await?;
        Ok(docs
            .into_iter()
            .map(|doc| Product::from_document(ProductId::new(doc.id), &doc.data))
            .collect())
    }

    /// Fetch one product, `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Propagates backend read failures.
    pub async fn get_product(&self, id: &ProductId) -> StoreResult<Option<Product>> {
        let doc = self.store.get_document(&self.collection, id.as_str()).await?;
        Ok(doc.map(|doc| Product::from_document(id.clone(), &doc.data)))
    }

    /// Live view of one product for the detail screen. Pushes `None` when
    /// the product is deleted. Dropping the receiver unsubscribes.
    #[must_use]
    pub fn watch_product(&self, id: &ProductId) -> watch::Receiver<Option<Product>> {
        let mut source = self.store.watch_document(&self.collection, id.as_str());
        let product_id = id.clone();

        let initial = source
            .borrow_and_update()
            .as_ref()
            .map(|doc| Product::from_document(product_id.clone(), &doc.data));
        let (sender, receiver) = watch::channel(initial);

        tokio::spawn(async move {
            while source.changed().await.is_ok() {
                let next = source
                    .borrow_and_update()
                    .as_ref()
                    .map(|doc| Product::from_document(product_id.clone(), &doc.data));
                if sender.send(next).is_err() {
                    break;
                }
            }
        });

        receiver
    }

    /// Owner mode: add a product, returning its generated id.
    ///
    /// # Errors
    ///
    /// Propagates backend write failures.
    pub async fn create_product(&self, form: &ProductForm) -> StoreResult<ProductId> {
        let mut data = form.to_document();
        if let Value::Object(fields) = &mut data {
            fields.insert(
                "created_at".to_owned(),
                Value::String(Utc::now().to_rfc3339()),
            );
        }
        let id = self.store.add_document(&self.collection, data).await?;
        tracing::info!(%id, "product created");
        Ok(ProductId::new(id))
    }

    /// Owner mode: overwrite a product's editable fields.
    ///
    /// # Errors
    ///
    /// Propagates backend write failures, including
    /// [`crate::backend::StoreError::InvalidDocument`] for a missing id.
    pub async fn update_product(&self, id: &ProductId, form: &ProductForm) -> StoreResult<()> {
        self.store
            .update_document(&self.collection, id.as_str(), form.to_document())
            .await
    }

    /// Owner mode: permanently delete a product.
    ///
    /// # Errors
    ///
    /// Propagates backend write failures.
    pub async fn delete_product(&self, id: &ProductId) -> StoreResult<()> {
        self.store.delete_document(&self.collection, id.as_str()).await?;
        tracing::info!(%id, "product deleted");
        Ok(())
    }
}

/// Units of a product still addable given what the cart already holds.
///
/// The detail and cart screens use this to stop quantity steppers at the
/// snapshot's stock before invoking the cart aggregate, which itself
/// enforces no upper bound.
#[must_use]
pub const fn addable_quantity(product: &Product, already_in_cart: u32) -> u32 {
    product.stock.saturating_sub(already_in_cart)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryStore;

    const PRODUCTS: &str = "products";

    fn form(name: &str, price: &str, stock: u32) -> ProductForm {
        ProductForm {
            name: name.to_owned(),
            price: price.parse().unwrap(),
            stock,
            category: Some("Indoor".to_owned()),
            description: String::new(),
            image: String::new(),
        }
    }

    fn catalog_over(store: &MemoryStore) -> ProductCatalog {
        ProductCatalog::new(Arc::new(store.clone()), PRODUCTS)
    }

    #[tokio::test]
    async fn test_create_then_list() {
        let store = MemoryStore::new();
        let catalog = catalog_over(&store);

        let id = catalog.create_product(&form("Aloe", "4.50", 3)).await.unwrap();
        let products = catalog.list_products().await.unwrap();

        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id, id);
        assert_eq!(products[0].name, "Aloe");
        assert_eq!(products[0].price.amount, "4.50".parse().unwrap());
        assert_eq!(products[0].stock, 3);
    }

    #[tokio::test]
    async fn test_create_stamps_created_at() {
        let store = MemoryStore::new();
        let catalog = catalog_over(&store);

        let id = catalog.create_product(&form("Aloe", "4.50", 3)).await.unwrap();
        let doc = store
            .get_document(PRODUCTS, id.as_str())
            .await
            .unwrap()
            .unwrap();
        assert!(doc.data["created_at"].is_string());
    }

    #[tokio::test]
    async fn test_update_preserves_created_at() {
        let store = MemoryStore::new();
        let catalog = catalog_over(&store);
        let id = catalog.create_product(&form("Aloe", "4.50", 3)).await.unwrap();

        catalog.update_product(&id, &form("Aloe Vera", "5.00", 2)).await.unwrap();

        let doc = store
            .get_document(PRODUCTS, id.as_str())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc.data["name"], "Aloe Vera");
        assert!(doc.data["created_at"].is_string());
    }

    #[tokio::test]
    async fn test_delete_then_get_none() {
        let store = MemoryStore::new();
        let catalog = catalog_over(&store);
        let id = catalog.create_product(&form("Aloe", "4.50", 3)).await.unwrap();

        catalog.delete_product(&id).await.unwrap();
        assert!(catalog.get_product(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_watch_product_tracks_stock_and_deletion() {
        let store = MemoryStore::new();
        let catalog = catalog_over(&store);
        let id = catalog.create_product(&form("Aloe", "4.50", 3)).await.unwrap();

        let mut rx = catalog.watch_product(&id);
        assert_eq!(rx.borrow().as_ref().unwrap().stock, 3);

        store
            .update_document(PRODUCTS, id.as_str(), json!({ "stock": 1 }))
            .await
            .unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_ref().unwrap().stock, 1);

        catalog.delete_product(&id).await.unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
    }

    #[test]
    fn test_addable_quantity_caps_at_stock() {
        let product = Product::from_document(
            ProductId::new("p1"),
            &json!({ "name": "Aloe", "price": 1, "stock": 4 }),
        );
        assert_eq!(addable_quantity(&product, 0), 4);
        assert_eq!(addable_quantity(&product, 3), 1);
        assert_eq!(addable_quantity(&product, 4), 0);
        assert_eq!(addable_quantity(&product, 9), 0);
    }
}
