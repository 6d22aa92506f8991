//! Session cart.
//!
//! The cart only stores crystal IDs and quantities. Prices, names and stock
//! are resolved against the current catalog whenever the cart is shown or
//! checked out, so a price change never leaves a stale total in a session.

use serde::{Deserialize, Serialize};

use moonstone_core::{CrystalId, Money};
use moonstone_db::models::Crystal;

/// Most units of one crystal a cart line may hold.
pub const MAX_LINE_QUANTITY: u32 = 10;

/// Orders at or above this subtotal ship free.
pub const FREE_SHIPPING_THRESHOLD_CENTS: i64 = 7500;

/// Flat shipping rate below the free-shipping threshold.
pub const FLAT_SHIPPING_CENTS: i64 = 595;

/// Errors from cart operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CartError {
    #[error("{0} is out of stock")]
    OutOfStock(String),
}

/// One line in the session cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub crystal_id: CrystalId,
    pub quantity: u32,
}

/// Cart stored in the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub lines: Vec<CartLine>,
}

fn max_quantity_for(crystal: &Crystal) -> u32 {
    u32::try_from(crystal.stock_quantity)
        .unwrap_or(0)
        .min(MAX_LINE_QUANTITY)
}

impl Cart {
    /// Add units of a crystal, merging with an existing line.
    ///
    /// The resulting quantity is clamped to available stock and
    /// [`MAX_LINE_QUANTITY`]; a zero `quantity` adds one.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::OutOfStock`] if the crystal has no stock.
    pub fn add(&mut self, crystal: &Crystal, quantity: u32) -> Result<u32, CartError> {
        let max = max_quantity_for(crystal);
        if max == 0 || !crystal.is_active {
            return Err(CartError::OutOfStock(crystal.name.clone()));
        }

        let quantity = quantity.max(1);
        if let Some(line) = self.lines.iter_mut().find(|l| l.crystal_id == crystal.id) {
            line.quantity = line.quantity.saturating_add(quantity).min(max);
            Ok(line.quantity)
        } else {
            let quantity = quantity.min(max);
            self.lines.push(CartLine {
                crystal_id: crystal.id,
                quantity,
            });
            Ok(quantity)
        }
    }

    /// Set a line's quantity; zero removes the line.
    ///
    /// Returns the stored quantity (0 when removed or absent).
    pub fn update(&mut self, crystal: &Crystal, quantity: u32) -> u32 {
        if quantity == 0 {
            self.remove(crystal.id);
            return 0;
        }

        let max = max_quantity_for(crystal);
        if max == 0 {
            self.remove(crystal.id);
            return 0;
        }
        let Some(line) = self.lines.iter_mut().find(|l| l.crystal_id == crystal.id) else {
            return 0;
        };
        line.quantity = quantity.min(max);
        line.quantity
    }

    /// Remove a line.
    pub fn remove(&mut self, crystal_id: CrystalId) {
        self.lines.retain(|l| l.crystal_id != crystal_id);
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Price the cart against the catalog.
    ///
    /// Lines whose crystal is no longer active are dropped.
    #[must_use]
    pub fn priced(&self, catalog: &[Crystal]) -> PricedCart {
        let lines: Vec<PricedLine> = self
            .lines
            .iter()
            .filter_map(|line| {
                let crystal = catalog
                    .iter()
                    .find(|c| c.id == line.crystal_id && c.is_active)?;
                Some(PricedLine {
                    crystal_id: crystal.id,
                    name: crystal.name.clone(),
                    slug: crystal.slug.clone(),
                    image_url: crystal.image_url.clone(),
                    unit_price: crystal.price,
                    quantity: line.quantity,
                    line_total: crystal.price.times(line.quantity),
                    available: crystal.stock_quantity,
                })
            })
            .collect();

        let subtotal: Money = lines.iter().map(|l| l.line_total).sum();
        let shipping = shipping_for(subtotal);

        PricedCart {
            lines,
            subtotal,
            shipping,
            total: subtotal + shipping,
        }
    }
}

/// Shipping charged for a subtotal.
#[must_use]
pub fn shipping_for(subtotal: Money) -> Money {
    if subtotal == Money::ZERO || subtotal >= Money::from_cents(FREE_SHIPPING_THRESHOLD_CENTS) {
        Money::ZERO
    } else {
        Money::from_cents(FLAT_SHIPPING_CENTS)
    }
}

/// A cart line resolved against the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct PricedLine {
    pub crystal_id: CrystalId,
    pub name: String,
    pub slug: String,
    pub image_url: Option<String>,
    pub unit_price: Money,
    pub quantity: u32,
    pub line_total: Money,
    /// Stock on hand when priced.
    pub available: i32,
}

impl PricedLine {
    /// Whether the line asks for more than is in stock.
    #[must_use]
    pub fn exceeds_stock(&self) -> bool {
        i64::from(self.quantity) > i64::from(self.available)
    }
}

/// Cart with prices, shipping and totals.
#[derive(Debug, Clone, Serialize)]
pub struct PricedCart {
    pub lines: Vec<PricedLine>,
    pub subtotal: Money,
    pub shipping: Money,
    pub total: Money,
}

impl PricedCart {
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// How much more the customer must add for free shipping.
    #[must_use]
    pub fn free_shipping_remaining(&self) -> Option<Money> {
        let threshold = Money::from_cents(FREE_SHIPPING_THRESHOLD_CENTS);
        (self.subtotal < threshold && !self.is_empty())
            .then(|| Money::new(threshold.amount() - self.subtotal.amount()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use moonstone_db::fixtures::sample_catalog;

    fn crystal(slug: &str) -> Crystal {
        sample_catalog()
            .into_iter()
            .find(|c| c.slug == slug)
            .unwrap()
    }

    #[test]
    fn test_add_merges_lines() {
        let mut cart = Cart::default();
        let rose = crystal("rose-quartz-heart");
        cart.add(&rose, 2).unwrap();
        cart.add(&rose, 3).unwrap();
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.item_count(), 5);
    }

    #[test]
    fn test_add_clamps_to_line_max_and_stock() {
        let mut cart = Cart::default();
        assert_eq!(
            cart.add(&crystal("selenite-wand"), 25).unwrap(),
            MAX_LINE_QUANTITY
        );
        // Pyrite has three in stock.
        assert_eq!(cart.add(&crystal("pyrite-cube"), 5).unwrap(), 3);
    }

    #[test]
    fn test_add_out_of_stock() {
        let mut cart = Cart::default();
        let err = cart.add(&crystal("obsidian-sphere"), 1).unwrap_err();
        assert_eq!(err, CartError::OutOfStock("Obsidian Sphere".to_owned()));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_zero_removes() {
        let mut cart = Cart::default();
        let citrine = crystal("citrine-point");
        cart.add(&citrine, 2).unwrap();
        assert_eq!(cart.update(&citrine, 4), 4);
        assert_eq!(cart.update(&citrine, 0), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_priced_below_free_shipping() {
        let catalog = sample_catalog();
        let mut cart = Cart::default();
        cart.add(&crystal("rose-quartz-heart"), 1).unwrap();
        let priced = cart.priced(&catalog);
        assert_eq!(priced.subtotal, Money::from_cents(2200));
        assert_eq!(priced.shipping, Money::from_cents(FLAT_SHIPPING_CENTS));
        assert_eq!(priced.total, Money::from_cents(2795));
        assert_eq!(priced.free_shipping_remaining(), Some(Money::from_cents(5300)));
    }

    #[test]
    fn test_priced_free_shipping_at_threshold() {
        let catalog = sample_catalog();
        let mut cart = Cart::default();
        cart.add(&crystal("citrine-point"), 2).unwrap();
        cart.add(&crystal("green-aventurine"), 1).unwrap();
        let priced = cart.priced(&catalog);
        assert_eq!(priced.subtotal, Money::from_cents(8100));
        assert_eq!(priced.shipping, Money::ZERO);
        assert_eq!(priced.total, Money::from_cents(8100));
        assert_eq!(priced.free_shipping_remaining(), None);
    }

    #[test]
    fn test_shipping_boundary() {
        assert_eq!(shipping_for(Money::from_cents(7499)), Money::from_cents(595));
        assert_eq!(shipping_for(Money::from_cents(7500)), Money::ZERO);
        assert_eq!(shipping_for(Money::ZERO), Money::ZERO);
    }

    #[test]
    fn test_priced_drops_inactive_crystals() {
        let mut catalog = sample_catalog();
        let mut cart = Cart::default();
        cart.add(&catalog[0], 1).unwrap();
        cart.add(&catalog[1], 1).unwrap();
        catalog[0].is_active = false;

        let priced = cart.priced(&catalog);
        assert_eq!(priced.lines.len(), 1);
        assert_eq!(priced.lines[0].crystal_id, catalog[1].id);
    }

    #[test]
    fn test_exceeds_stock_after_stock_drop() {
        let mut catalog = sample_catalog();
        let mut cart = Cart::default();
        cart.add(&catalog[0], 5).unwrap();
        catalog[0].stock_quantity = 2;
        assert!(cart.priced(&catalog).lines[0].exceeds_stock());
    }
}
