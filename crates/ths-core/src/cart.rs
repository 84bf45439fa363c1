//! # Cart
//!
//! The in-progress sale: line items, quantities, discounts and derived totals.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Cashier Action           Cart Method              Line Change          │
//! │  ──────────────           ───────────              ───────────          │
//! │                                                                         │
//! │  Scan / click product ──► add() ─────────────────► qty += 1 or push    │
//! │                                                                         │
//! │  Type quantity ─────────► add_with_quantity() ───► qty += n or push    │
//! │                                                                         │
//! │  + / - buttons ─────────► increase() / decrease() ► qty ± 1 (0 drops)  │
//! │                                                                         │
//! │  Manual price ──────────► set_discount_price() ──► sale_price = p      │
//! │                                                                         │
//! │  Line discount ─────────► update_discount() ─────► discount = %        │
//! │                                                                         │
//! │  Remove / clear ────────► remove() / clear() ────► drop line(s)        │
//! │                                                                         │
//! │  NOTE: Every rejected call returns Err and leaves the lines untouched. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - At most one line per barcode
//! - Every line has `1 <= quantity <= min(stock snapshot, MAX_ITEM_QUANTITY)`
//! - Totals are computed on every call, never stored

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, Percentage};
use crate::types::Product;
use crate::validation::{validate_discount, validate_price, validate_quantity};
use crate::wire::lenient_i64;
use crate::MAX_ITEM_QUANTITY;

// =============================================================================
// Cart Item
// =============================================================================

/// A product in the cart with its quantity and percentage discount.
///
/// The product fields are flattened so the cached JSON keeps the same shape
/// as a catalog product plus `quantity` and `discount`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    #[serde(flatten)]
    pub product: Product,

    #[serde(deserialize_with = "lenient_i64")]
    pub quantity: i64,

    #[serde(default)]
    pub discount: Percentage,
}

impl CartItem {
    fn new(product: &Product, quantity: i64) -> Self {
        CartItem {
            product: product.clone(),
            quantity,
            discount: Percentage::zero(),
        }
    }

    #[inline]
    pub fn barcode(&self) -> &str {
        &self.product.barcode
    }

    /// Highest quantity this line may hold.
    #[inline]
    pub fn max_quantity(&self) -> i64 {
        self.product.stock_quantity.min(MAX_ITEM_QUANTITY)
    }

    /// Effective unit price (after any manual override).
    #[inline]
    pub fn unit_price(&self) -> Money {
        self.product.sale_price
    }

    /// Line total after the percentage discount, rounded to the cent.
    pub fn line_total(&self) -> Money {
        Money::from_cents(round_bps_scaled(self.discounted_scaled()))
    }

    /// `price_cents × quantity × (10000 − bps)`, i.e. the line total scaled by 10⁴.
    fn discounted_scaled(&self) -> i128 {
        let remaining = Percentage::FULL.bps().saturating_sub(self.discount.bps()) as i128;
        self.product.sale_price.cents() as i128 * self.quantity as i128 * remaining
    }
}

/// Rounds a bps-scaled cent amount to whole cents, half away from zero.
fn round_bps_scaled(scaled: i128) -> i64 {
    let full = Percentage::FULL.bps() as i128;
    let rounded = if scaled >= 0 {
        (scaled + full / 2) / full
    } else {
        (scaled - full / 2) / full
    };
    i64::try_from(rounded).unwrap_or(if rounded < 0 { i64::MIN } else { i64::MAX })
}

// =============================================================================
// Cart
// =============================================================================

/// Ordered sequence of cart lines.
///
/// Serialized as a bare JSON array, which is the cache snapshot format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart::default()
    }

    /// Rebuilds a cart from cached lines, dropping any line that breaks the
    /// line invariants (a hand-edited or stale snapshot).
    pub fn from_items(items: Vec<CartItem>) -> Self {
        let mut cart = Cart::new();
        for item in items {
            if item.quantity <= 0
                || item.quantity > item.max_quantity()
                || !item.product.sale_price.is_within_bounds()
                || cart.position(item.barcode()).is_some()
            {
                continue;
            }
            cart.items.push(item);
        }
        cart
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Looks up a line by barcode.
    pub fn get(&self, barcode: &str) -> Option<&CartItem> {
        self.items.iter().find(|i| i.barcode() == barcode)
    }

    fn position(&self, barcode: &str) -> Option<usize> {
        self.items.iter().position(|i| i.barcode() == barcode)
    }

    fn line_mut(&mut self, barcode: &str) -> CoreResult<&mut CartItem> {
        self.items
            .iter_mut()
            .find(|i| i.product.barcode == barcode)
            .ok_or_else(|| CoreError::ItemNotInCart(barcode.to_string()))
    }

    /// Adds one unit of `product`, appending a new line if needed.
    pub fn add(&mut self, product: &Product) -> CoreResult<()> {
        self.add_with_quantity(product, 1)
    }

    /// Adds `quantity` units of `product`.
    ///
    /// The stock bound is the `stock_quantity` of the product passed in,
    /// which is the freshest snapshot the caller has.
    ///
    /// ## Example
    /// ```rust
    /// use ths_core::{Cart, Money, Product};
    ///
    /// let product = Product {
    ///     id: 1,
    ///     barcode: "750100".into(),
    ///     name: "Bujía".into(),
    ///     brand: String::new(),
    ///     image: String::new(),
    ///     internal_reference: None,
    ///     cost: Money::zero(),
    ///     sale_price: Money::from_cents(4500),
    ///     stock_quantity: 3,
    ///     storehouse_id: 1,
    /// };
    ///
    /// let mut cart = Cart::new();
    /// cart.add_with_quantity(&product, 3).unwrap();
    /// assert!(cart.add(&product).is_err());
    /// assert_eq!(cart.total_quantity(), 3);
    /// ```
    pub fn add_with_quantity(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        validate_quantity(quantity)?;
        validate_price(product.sale_price)?;

        let in_cart = self.get(&product.barcode).map_or(0, |i| i.quantity);
        let requested = in_cart.saturating_add(quantity);
        if !product.in_stock() || requested > product.stock_quantity {
            return Err(CoreError::InsufficientStock {
                barcode: product.barcode.clone(),
                available: product.stock_quantity.max(0),
                requested,
            });
        }
        validate_quantity(requested)?;

        match self.position(&product.barcode) {
            Some(idx) => self.items[idx].quantity = requested,
            None => self.items.push(CartItem::new(product, quantity)),
        }
        Ok(())
    }

    /// Increments a line by one, bounded by its stock snapshot.
    pub fn increase(&mut self, barcode: &str) -> CoreResult<()> {
        let line = self.line_mut(barcode)?;
        if line.quantity >= line.product.stock_quantity {
            return Err(CoreError::InsufficientStock {
                barcode: barcode.to_string(),
                available: line.product.stock_quantity.max(0),
                requested: line.quantity + 1,
            });
        }
        validate_quantity(line.quantity + 1)?;
        line.quantity += 1;
        Ok(())
    }

    /// Decrements a line by one. A line that reaches zero is removed.
    pub fn decrease(&mut self, barcode: &str) -> CoreResult<()> {
        let idx = self
            .position(barcode)
            .ok_or_else(|| CoreError::ItemNotInCart(barcode.to_string()))?;
        if self.items[idx].quantity <= 1 {
            self.items.remove(idx);
        } else {
            self.items[idx].quantity -= 1;
        }
        Ok(())
    }

    /// Overrides the unit sale price of a line. Independent of `discount`.
    pub fn set_discount_price(&mut self, barcode: &str, new_price: Money) -> CoreResult<()> {
        validate_price(new_price)?;
        self.line_mut(barcode)?.product.sale_price = new_price;
        Ok(())
    }

    /// Sets the percentage discount of a line.
    pub fn update_discount(&mut self, barcode: &str, discount: Percentage) -> CoreResult<()> {
        validate_discount(discount)?;
        self.line_mut(barcode)?.discount = discount;
        Ok(())
    }

    /// Removes a line regardless of its quantity.
    pub fn remove(&mut self, barcode: &str) -> CoreResult<CartItem> {
        let idx = self
            .position(barcode)
            .ok_or_else(|| CoreError::ItemNotInCart(barcode.to_string()))?;
        Ok(self.items.remove(idx))
    }

    /// Takes the units of `sold` out of the cart. Lines that reach zero are
    /// removed; anything added after the sale was snapshotted stays.
    pub fn settle(&mut self, sold: &[CartItem]) {
        for line in sold {
            let Some(idx) = self.position(line.barcode()) else {
                continue;
            };
            let remaining = self.items[idx].quantity - line.quantity;
            if remaining <= 0 {
                self.items.remove(idx);
            } else {
                self.items[idx].quantity = remaining;
            }
        }
    }

    /// Clears all lines.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Returns the number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the total quantity of all lines.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Sum of discounted line totals, rounded to the cent once at the end.
    pub fn total_payable(&self) -> Money {
        let scaled: i128 = self.items.iter().map(CartItem::discounted_scaled).sum();
        Money::from_cents(round_bps_scaled(scaled))
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Cart totals summary for UI consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub item_count: usize,
    pub total_quantity: i64,
    pub total_payable: Money,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            item_count: cart.item_count(),
            total_quantity: cart.total_quantity(),
            total_payable: cart.total_payable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_product(barcode: &str, price_cents: i64, stock: i64) -> Product {
        Product {
            id: barcode.len() as i64,
            barcode: barcode.to_string(),
            name: format!("Product {}", barcode),
            brand: "ACME".to_string(),
            image: String::new(),
            internal_reference: None,
            cost: Money::zero(),
            sale_price: Money::from_cents(price_cents),
            stock_quantity: stock,
            storehouse_id: 1,
        }
    }

    #[test]
    fn test_add_never_exceeds_stock() {
        let mut cart = Cart::new();
        let product = test_product("A1", 1000, 3);

        for _ in 0..3 {
            cart.add(&product).unwrap();
        }
        let err = cart.add(&product).unwrap_err();

        assert!(matches!(err, CoreError::InsufficientStock { requested: 4, .. }));
        assert_eq!(cart.get("A1").unwrap().quantity, 3);
        assert_eq!(cart.item_count(), 1);
    }

    #[test]
    fn test_add_rejects_zero_stock() {
        let mut cart = Cart::new();
        assert!(cart.add(&test_product("A1", 1000, 0)).is_err());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_with_quantity_bounds() {
        let mut cart = Cart::new();
        let product = test_product("A1", 1000, 5);

        assert!(cart.add_with_quantity(&product, 6).is_err());
        assert!(cart.add_with_quantity(&product, 0).is_err());
        cart.add_with_quantity(&product, 4).unwrap();
        assert!(cart.add_with_quantity(&product, 2).is_err());
        cart.add_with_quantity(&product, 1).unwrap();

        assert_eq!(cart.total_quantity(), 5);
    }

    #[test]
    fn test_total_payable_example() {
        let mut cart = Cart::new();
        cart.add_with_quantity(&test_product("A1", 10000, 10), 2).unwrap();
        cart.update_discount("A1", Percentage::from_percent(10)).unwrap();
        cart.add(&test_product("B2", 5000, 10)).unwrap();

        assert_eq!(cart.total_payable(), Money::from_cents(23000));
        assert_eq!(cart.total_quantity(), 3);
    }

    #[test]
    fn test_total_payable_rounds_once() {
        let mut cart = Cart::new();
        // 3 × 5¢ at 50% = 7.5¢
        cart.add_with_quantity(&test_product("A1", 5, 10), 3).unwrap();
        cart.update_discount("A1", Percentage::from_percent(50)).unwrap();
        // 1 × 5¢ at 50% = 2.5¢
        cart.add(&test_product("B2", 5, 10)).unwrap();
        cart.update_discount("B2", Percentage::from_percent(50)).unwrap();

        // rounding each line first would give 8 + 3
        assert_eq!(cart.total_payable().cents(), 10);
    }

    #[test]
    fn test_decrease_to_zero_removes_line() {
        let mut cart = Cart::new();
        let product = test_product("A1", 1000, 5);
        cart.add_with_quantity(&product, 2).unwrap();

        cart.decrease("A1").unwrap();
        assert_eq!(cart.get("A1").unwrap().quantity, 1);
        cart.decrease("A1").unwrap();

        assert!(cart.is_empty());
        assert!(cart.items().iter().all(|i| i.quantity > 0));
    }

    #[test]
    fn test_increase_bounded_by_snapshot() {
        let mut cart = Cart::new();
        cart.add(&test_product("A1", 1000, 2)).unwrap();

        cart.increase("A1").unwrap();
        assert!(cart.increase("A1").is_err());
        assert!(cart.increase("missing").is_err());
        assert_eq!(cart.total_quantity(), 2);
    }

    #[test]
    fn test_settle_keeps_unsold_units() {
        let mut cart = Cart::new();
        let a = test_product("A1", 1000, 10);
        cart.add_with_quantity(&a, 2).unwrap();
        cart.add(&test_product("B2", 500, 10)).unwrap();
        let sold = cart.clone();

        cart.increase("A1").unwrap();
        cart.add(&test_product("C3", 700, 10)).unwrap();
        cart.settle(sold.items());

        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.get("A1").unwrap().quantity, 1);
        assert!(cart.get("B2").is_none());
        assert_eq!(cart.get("C3").unwrap().quantity, 1);

        let mut same = sold.clone();
        same.settle(sold.items());
        assert!(same.is_empty());
    }

    #[test]
    fn test_line_quantity_capped_below_huge_stock() {
        let mut cart = Cart::new();
        let product = test_product("A1", 1000, i64::MAX);

        cart.add_with_quantity(&product, MAX_ITEM_QUANTITY).unwrap();
        assert!(cart.add(&product).is_err());
        assert!(cart.increase("A1").is_err());
        assert_eq!(cart.total_quantity(), MAX_ITEM_QUANTITY);
    }

    #[test]
    fn test_out_of_range_price_is_rejected() {
        let mut cart = Cart::new();
        let product = test_product("A1", Money::MAX.cents() + 1, 5);

        assert!(cart.add_with_quantity(&product, 2).is_err());
        cart.add(&test_product("B2", Money::MAX.cents(), 5)).unwrap();
        assert!(cart.set_discount_price("B2", Money::from_cents(i64::MAX)).is_err());
        assert_eq!(cart.total_payable(), Money::MAX);
    }

    #[test]
    fn test_from_items_drops_lines_over_bound() {
        let line = |barcode: &str, quantity: i64, stock: i64| CartItem {
            product: test_product(barcode, 1000, stock),
            quantity,
            discount: Percentage::zero(),
        };
        let cart = Cart::from_items(vec![
            line("A1", 2, 5),
            line("B2", 6, 5),
            line("C3", i64::MAX - 1, i64::MAX),
            line("D4", 0, 5),
            line("A1", 1, 5),
        ]);

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.get("A1").unwrap().quantity, 2);

        let mut cart = cart;
        let huge = test_product("C3", 1000, i64::MAX);
        cart.add_with_quantity(&huge, 1).unwrap();
        assert_eq!(cart.total_quantity(), 3);
    }

    #[test]
    fn test_price_override_and_discount() {
        let mut cart = Cart::new();
        cart.add(&test_product("A1", 1000, 2)).unwrap();

        cart.set_discount_price("A1", Money::from_cents(800)).unwrap();
        assert!(cart.set_discount_price("A1", Money::from_cents(-1)).is_err());
        assert!(cart.update_discount("A1", Percentage::from_bps(10_001)).is_err());
        cart.update_discount("A1", Percentage::from_percent(25)).unwrap();

        assert_eq!(cart.total_payable().cents(), 600);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cart = Cart::new();
        cart.add(&test_product("A1", 1000, 2)).unwrap();
        cart.add(&test_product("B2", 500, 2)).unwrap();

        assert!(cart.remove("nope").is_err());
        assert_eq!(cart.remove("A1").unwrap().product.barcode, "A1");
        assert_eq!(cart.item_count(), 1);

        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total_payable(), Money::zero());
    }

    #[test]
    fn test_cache_snapshot_round_trip() {
        let mut cart = Cart::new();
        cart.add_with_quantity(&test_product("A1", 10000, 10), 2).unwrap();
        cart.update_discount("A1", Percentage::from_bps(1250)).unwrap();
        cart.add(&test_product("B2", 5000, 10)).unwrap();

        let json = serde_json::to_string(&cart).unwrap();
        assert!(json.starts_with('['));
        assert!(json.contains("\"salePrice\":100.0"));

        let reloaded: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded, cart);
        assert_eq!(reloaded.items()[0].barcode(), "A1");
    }

    #[test]
    fn test_from_items_drops_invalid_lines() {
        let mut good = CartItem::new(&test_product("A1", 100, 5), 2);
        let zero = CartItem::new(&test_product("B2", 100, 5), 0);
        let dup = good.clone();
        good.discount = Percentage::from_percent(5);

        let cart = Cart::from_items(vec![good, zero, dup]);
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.items()[0].discount, Percentage::from_percent(5));
    }

    #[test]
    fn test_totals_summary() {
        let mut cart = Cart::new();
        cart.add_with_quantity(&test_product("A1", 250, 9), 4).unwrap();

        let totals = CartTotals::from(&cart);
        assert_eq!(totals.item_count, 1);
        assert_eq!(totals.total_quantity, 4);
        assert_eq!(totals.total_payable.cents(), 1000);
    }
}
