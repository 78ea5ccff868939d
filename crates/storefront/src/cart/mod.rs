//! The cart aggregate.
//!
//! The authoritative in-process view of what the signed-in user intends to
//! buy. Each line holds a *snapshot* of the product frozen at add (or last
//! reconcile) time; keeping those snapshots honest against the backend is
//! the job of [`crate::reconcile`], not of this module.
//!
//! Totals are recomputed from the line items on every read. The sequence is
//! small and mutations are rare relative to reads, so there is nothing to
//! cache or invalidate.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use vivero_core::{Price, Product, ProductId};

pub mod session;

pub use session::CartSession;

/// One product-and-quantity pair within a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Frozen product snapshot, not a live view of the backend record.
    pub product: Product,
    /// Always >= 1 while the line exists; decrements floor at 1.
    pub quantity: u32,
}

impl CartItem {
    /// Create a line item.
    #[must_use]
    pub const fn new(product: Product, quantity: u32) -> Self {
        Self { product, quantity }
    }

    /// The line total.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product.price.extended(self.quantity)
    }
}

/// Direction for a quantity adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityAction {
    Increase,
    Decrease,
}

/// An ordered sequence of line items, at most one per product id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// The current line items, in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Whether the cart has no line items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Quantity currently carted for a product, 0 if absent.
    #[must_use]
    pub fn quantity_of(&self, id: &ProductId) -> u32 {
        self.items
            .iter()
            .find(|item| &item.product.id == id)
            .map_or(0, |item| item.quantity)
    }

    /// Add one unit of a product.
    ///
    /// If a line for this product already exists its quantity goes up by one
    /// and the snapshot *already stored in the cart* is kept; repeated adds
    /// never refresh price or stock display. Otherwise a new line is
    /// appended with quantity 1 using the given snapshot.
    pub fn add(&mut self, product: Product) {
        match self
            .items
            .iter_mut()
            .find(|item| item.product.id == product.id)
        {
            Some(item) => item.quantity += 1,
            None => self.items.push(CartItem::new(product, 1)),
        }
    }

    /// Drop the line for a product. No-op if absent.
    pub fn remove(&mut self, id: &ProductId) {
        self.items.retain(|item| &item.product.id != id);
    }

    /// Adjust a line's quantity by one in the given direction.
    ///
    /// Increase has no upper bound here; the detail/cart screen is
    /// responsible for stock-capping before calling. Decrease floors at 1
    /// and never removes the line; deletion is only ever explicit via
    /// [`Cart::remove`].
    pub fn update_quantity(&mut self, id: &ProductId, action: QuantityAction) {
        if let Some(item) = self.items.iter_mut().find(|item| &item.product.id == id) {
            item.quantity = match action {
                QuantityAction::Increase => item.quantity + 1,
                QuantityAction::Decrease => item.quantity.saturating_sub(1).max(1),
            };
        }
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Wholesale replacement of the sequence, used by reconciliation.
    /// Replaces, never merges.
    pub fn replace(&mut self, items: Vec<CartItem>) {
        self.items = items;
    }

    /// Sum of line totals, recomputed on every call.
    #[must_use]
    pub fn total(&self) -> Price {
        let currency = self
            .items
            .first()
            .map_or_else(Default::default, |item| item.product.price.currency_code);
        let amount = self.items.iter().map(CartItem::line_total).sum();
        Price::new(amount, currency)
    }

    /// Sum of quantities, recomputed on every call.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn product(id: &str, price: &str, stock: u32) -> Product {
        Product::from_document(
            ProductId::new(id),
            &json!({ "name": format!("Plant {id}"), "price": price, "stock": stock }),
        )
    }

    #[test]
    fn test_add_twice_increments_one_line() {
        let mut cart = Cart::new();
        cart.add(product("p1", "10.00", 5));
        cart.add(product("p1", "10.00", 5));

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 2);
    }

    #[test]
    fn test_repeated_add_keeps_stored_snapshot() {
        let mut cart = Cart::new();
        cart.add(product("p1", "10.00", 5));

        // Same id, newer price: the add only bumps quantity.
        cart.add(product("p1", "12.00", 4));

        assert_eq!(cart.items()[0].quantity, 2);
        assert_eq!(
            cart.items()[0].product.price.amount,
            "10.00".parse().unwrap()
        );
    }

    #[test]
    fn test_decrease_floors_at_one() {
        let mut cart = Cart::new();
        cart.add(product("p1", "10.00", 5));
        cart.update_quantity(&ProductId::new("p1"), QuantityAction::Increase);
        assert_eq!(cart.items()[0].quantity, 2);

        for _ in 0..5 {
            cart.update_quantity(&ProductId::new("p1"), QuantityAction::Decrease);
        }
        assert_eq!(cart.items()[0].quantity, 1);
        assert_eq!(cart.items().len(), 1);
    }

    #[test]
    fn test_remove_is_explicit_and_absent_is_noop() {
        let mut cart = Cart::new();
        cart.add(product("p1", "10.00", 5));

        cart.remove(&ProductId::new("ghost"));
        assert_eq!(cart.items().len(), 1);

        cart.remove(&ProductId::new("p1"));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_total_and_count_recomputed() {
        let mut cart = Cart::new();
        cart.add(product("p1", "2.50", 5));
        cart.add(product("p1", "2.50", 5));
        cart.add(product("p2", "7.25", 3));

        assert_eq!(cart.total().amount, "12.25".parse().unwrap());
        assert_eq!(cart.count(), 3);

        cart.remove(&ProductId::new("p2"));
        assert_eq!(cart.total().amount, "5.00".parse().unwrap());
        assert_eq!(cart.count(), 2);

        cart.clear();
        assert_eq!(cart.total().amount, rust_decimal::Decimal::ZERO);
        assert_eq!(cart.count(), 0);
    }

    #[test]
    fn test_replace_is_wholesale() {
        let mut cart = Cart::new();
        cart.add(product("p1", "10.00", 5));
        cart.add(product("p2", "4.00", 2));

        cart.replace(vec![CartItem::new(product("p3", "1.00", 9), 4)]);

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].product.id, ProductId::new("p3"));
        assert_eq!(cart.count(), 4);
    }

    #[test]
    fn test_update_quantity_unknown_id_is_noop() {
        let mut cart = Cart::new();
        cart.add(product("p1", "10.00", 5));
        cart.update_quantity(&ProductId::new("ghost"), QuantityAction::Increase);
        assert_eq!(cart.count(), 1);
    }
}
