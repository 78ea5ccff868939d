//! Shared fixtures for Vivero integration tests.

use serde_json::json;

use vivero_core::{Product, ProductId};
use vivero_storefront::backend::{DocumentStore, MemoryBackend};
use vivero_storefront::cart::CartItem;

/// Collection names used by every scenario.
pub const PRODUCTS: &str = "products";
pub const USERS: &str = "users";

/// A backend pre-loaded with product stock levels.
pub async fn backend_with_stock(stock: &[(&str, u32)]) -> MemoryBackend {
    let backend = MemoryBackend::new();
    for (id, count) in stock {
        backend
            .store
            .set_document(
                PRODUCTS,
                id,
                json!({ "name": display_name(id), "price": "9.99", "stock": count }),
            )
            .await
            .expect("seed product");
    }
    backend
}

/// The authoritative stock for a product, read straight from the store.
pub async fn stock_of(backend: &MemoryBackend, id: &str) -> u32 {
    let doc = backend
        .store
        .get_document(PRODUCTS, id)
        .await
        .expect("read product")
        .expect("product exists");
    Product::from_document(ProductId::new(id), &doc.data).stock
}

/// A cart line matching the seeded snapshot for `id`.
pub fn line(id: &str, quantity: u32) -> CartItem {
    let product = Product::from_document(
        ProductId::new(id),
        &json!({ "name": display_name(id), "price": "9.99", "stock": 99 }),
    );
    CartItem::new(product, quantity)
}

fn display_name(id: &str) -> String {
    format!("Plant {id}")
}
