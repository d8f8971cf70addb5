//! Cart arithmetic and vendor grouping.
//!
//! The cart itself lives on the client and is never persisted server
//! side; this module defines its shape and the rules the checkout path
//! relies on: re-adding a product merges into the existing line, a
//! decrement never drops a line below quantity 1, and splitting groups
//! lines by the owning vendor in first-seen order.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    pub product_id: Uuid,
    /// Owning vendor of the product; drives order splitting.
    pub vendor_id: Uuid,
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: i32,
}

impl CartLine {
    pub fn subtotal_cents(&self) -> i64 {
        self.unit_price_cents * i64::from(self.quantity)
    }
}

/// One vendor's share of a cart, produced by [`Cart::grouped_by_vendor`].
#[derive(Debug, Clone)]
pub struct VendorGroup {
    pub vendor_id: Uuid,
    pub lines: Vec<CartLine>,
}

impl VendorGroup {
    pub fn total_cents(&self) -> i64 {
        self.lines.iter().map(CartLine::subtotal_cents).sum()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Add a line, merging quantities if the product is already present.
    pub fn add(&mut self, line: CartLine) {
        match self
            .lines
            .iter_mut()
            .find(|l| l.product_id == line.product_id)
        {
            Some(existing) => existing.quantity += line.quantity,
            None => self.lines.push(line),
        }
    }

    /// Lower a line's quantity by one. Quantity never goes below 1;
    /// decrementing at 1 is a no-op, not a removal.
    pub fn decrement(&mut self, product_id: Uuid) {
        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            if line.quantity > 1 {
                line.quantity -= 1;
            }
        }
    }

    pub fn remove(&mut self, product_id: Uuid) {
        self.lines.retain(|l| l.product_id != product_id);
    }

    /// Split the cart into one group per distinct vendor, preserving
    /// the order in which vendors first appear.
    pub fn grouped_by_vendor(&self) -> Vec<VendorGroup> {
        let mut groups: Vec<VendorGroup> = Vec::new();
        for line in &self.lines {
            match groups.iter_mut().find(|g| g.vendor_id == line.vendor_id) {
                Some(group) => group.lines.push(line.clone()),
                None => groups.push(VendorGroup {
                    vendor_id: line.vendor_id,
                    lines: vec![line.clone()],
                }),
            }
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product: u128, vendor: u128, price: i64, qty: i32) -> CartLine {
        CartLine {
            product_id: Uuid::from_u128(product),
            vendor_id: Uuid::from_u128(vendor),
            name: format!("product-{product}"),
            unit_price_cents: price,
            quantity: qty,
        }
    }

    #[test]
    fn re_adding_merges_quantity() {
        let mut cart = Cart::new();
        cart.add(line(1, 10, 2700, 1));
        cart.add(line(1, 10, 2700, 1));
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 2);
    }

    #[test]
    fn decrement_floors_at_one() {
        let mut cart = Cart::new();
        cart.add(line(1, 10, 2700, 2));
        cart.decrement(Uuid::from_u128(1));
        assert_eq!(cart.lines()[0].quantity, 1);
        cart.decrement(Uuid::from_u128(1));
        assert_eq!(cart.lines()[0].quantity, 1, "line must not drop below 1");
        assert_eq!(cart.lines().len(), 1, "decrement must not remove the line");
    }

    #[test]
    fn remove_deletes_the_line() {
        let mut cart = Cart::new();
        cart.add(line(1, 10, 2700, 1));
        cart.remove(Uuid::from_u128(1));
        assert!(cart.is_empty());
    }

    #[test]
    fn grouping_splits_by_vendor_with_per_group_totals() {
        let mut cart = Cart::new();
        cart.add(line(1, 10, 1000, 2));
        cart.add(line(2, 20, 500, 3));
        cart.add(line(3, 10, 250, 4));

        let groups = cart.grouped_by_vendor();
        assert_eq!(groups.len(), 2);

        assert_eq!(groups[0].vendor_id, Uuid::from_u128(10));
        assert_eq!(groups[0].lines.len(), 2);
        assert_eq!(groups[0].total_cents(), 2 * 1000 + 4 * 250);

        assert_eq!(groups[1].vendor_id, Uuid::from_u128(20));
        assert_eq!(groups[1].total_cents(), 3 * 500);
    }
}
