//! Guest cart held in the session until sign-in.

use serde::{Deserialize, Serialize};

use purewell_core::ProductId;
use purewell_core::models::MAX_LINE_QUANTITY;

/// One guest cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCartLine {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// A guest cart. Lines keep the order they were first added in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCart {
    lines: Vec<SessionCartLine>,
}

impl SessionCart {
    #[must_use]
    pub fn lines(&self) -> &[SessionCartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Quantity currently held for a product.
    #[must_use]
    pub fn quantity_of(&self, product_id: ProductId) -> i32 {
        self.lines
            .iter()
            .find(|l| l.product_id == product_id)
            .map_or(0, |l| l.quantity)
    }

    /// Add to a line, creating it if needed. The total is capped at the
    /// per-line maximum.
    pub fn add(&mut self, product_id: ProductId, quantity: i32) {
        if quantity <= 0 {
            return;
        }
        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity = line.quantity.saturating_add(quantity).min(MAX_LINE_QUANTITY);
        } else {
            self.lines.push(SessionCartLine {
                product_id,
                quantity: quantity.min(MAX_LINE_QUANTITY),
            });
        }
    }

    /// Replace a line's quantity. Zero or less removes it.
    ///
    /// Returns `false` when the product is not in the cart.
    pub fn set(&mut self, product_id: ProductId, quantity: i32) -> bool {
        if quantity <= 0 {
            return self.remove(product_id);
        }
        match self.lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => {
                line.quantity = quantity.min(MAX_LINE_QUANTITY);
                true
            }
            None => false,
        }
    }

    /// Remove a line. Returns whether it was present.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);
        self.lines.len() != before
    }

    /// `(product, quantity)` pairs for merging into a member cart.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(ProductId, i32)> {
        self.lines.iter().map(|l| (l.product_id, l.quantity)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: i32) -> ProductId {
        ProductId::new(n)
    }

    #[test]
    fn test_add_merges_and_caps() {
        let mut cart = SessionCart::default();
        cart.add(id(1), 2);
        cart.add(id(2), 1);
        cart.add(id(1), 3);
        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.quantity_of(id(1)), 5);

        cart.add(id(1), 500);
        assert_eq!(cart.quantity_of(id(1)), MAX_LINE_QUANTITY);
    }

    #[test]
    fn test_add_ignores_non_positive() {
        let mut cart = SessionCart::default();
        cart.add(id(1), 0);
        cart.add(id(1), -4);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_and_remove() {
        let mut cart = SessionCart::default();
        cart.add(id(1), 2);
        assert!(cart.set(id(1), 7));
        assert_eq!(cart.quantity_of(id(1)), 7);
        assert!(!cart.set(id(9), 1));
        assert!(cart.set(id(1), 0));
        assert!(cart.is_empty());
        assert!(!cart.remove(id(1)));
    }

    #[test]
    fn test_to_pairs_keeps_order() {
        let mut cart = SessionCart::default();
        cart.add(id(3), 1);
        cart.add(id(1), 2);
        assert_eq!(cart.to_pairs(), vec![(id(3), 1), (id(1), 2)]);
    }
}
