//! Bill computation.
//!
//! Items are collected into a [`Cart`], validated against the [`Catalog`] as they
//! arrive, then priced in one go by [`Bill::compute`] using the category discount table.

use std::collections::HashMap;

use tracing::debug;

use crate::Amount;
use crate::catalog::Catalog;
use crate::model::{Category, DiscountKind, DiscountRule, ProductId};

mod error;
pub use error::CartError;

/// Discount rules keyed by category.
pub type DiscountTable = HashMap<Category, DiscountRule>;

/// Unit price after applying `rule`.
///
/// A percentage rule scales the price by `1 - value/100`, a fixed rule subtracts
/// `value`. Unrecognized kinds and missing rules leave the price as is.
/// The result is not clamped: a fixed discount above the price gives a negative price.
pub fn apply_discount(price: Amount, rule: Option<&DiscountRule>) -> Amount {
    match rule.map(|r| (&r.kind, r.value)) {
        Some((DiscountKind::Percentage, value)) => price.percent_off(value),
        Some((DiscountKind::Fixed, value)) => price - value,
        Some((DiscountKind::Other(_), _)) | None => price,
    }
}

/// Parse a quantity typed at the terminal. Must be a positive whole number.
pub fn parse_quantity(input: &str) -> Result<u32, CartError> {
    match input.trim().parse::<u32>() {
        Ok(0) | Err(_) => Err(CartError::InvalidQuantity(input.trim().to_string())),
        Ok(quantity) => Ok(quantity),
    }
}

/// Items entered for one transaction, in entry order.
/// A repeated id accumulates onto its first line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<(ProductId, u32)>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn items(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.lines.iter().map(|(id, qty)| (id.as_str(), *qty))
    }

    /// Quantity of `id` already in the cart.
    pub fn quantity_of(&self, id: &str) -> u32 {
        self.lines
            .iter()
            .find(|(line_id, _)| line_id == id)
            .map_or(0, |(_, qty)| *qty)
    }

    /// Add without any catalog validation. The quantity saturates at `u32::MAX`.
    pub fn push(&mut self, id: &str, quantity: u32) {
        match self.lines.iter_mut().find(|(line_id, _)| line_id == id) {
            Some((_, qty)) => *qty = qty.saturating_add(quantity),
            None => self.lines.push((id.to_string(), quantity)),
        }
    }

    /// Validate `id` and `quantity` against the catalog and add them.
    ///
    /// Stock is checked against what remains after the quantity already in the cart.
    pub fn add(&mut self, catalog: &Catalog, id: &str, quantity: u32) -> Result<(), CartError> {
        let product = catalog
            .get(id)
            .ok_or_else(|| CartError::UnknownProduct(id.to_string()))?;

        let in_cart = self.quantity_of(id);
        if quantity == 0 || in_cart.checked_add(quantity).is_none() {
            return Err(CartError::InvalidQuantity(quantity.to_string()));
        }

        if let Some(stock) = product.stock {
            let available = stock.saturating_sub(in_cart);
            if quantity > available {
                return Err(CartError::InsufficientStock {
                    name: product.name.clone(),
                    available,
                    requested: quantity,
                });
            }
        }

        self.push(id, quantity);
        debug!(product = id, quantity, in_cart = self.quantity_of(id), "item added");
        Ok(())
    }
}

/// A priced line of the bill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub id: ProductId,
    pub name: String,
    pub category: Category,
    pub quantity: u32,
    /// Undiscounted unit price.
    pub unit_price: Amount,
    /// Savings for the whole line: `price × quantity - total`, in cents.
    pub discount: Amount,
    /// `discounted × quantity`, rounded to cents.
    pub total: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillLine {
    Item(PricedLine),
    /// Id not present in the catalog. Shown on the receipt, excluded from totals.
    Unknown { id: ProductId, quantity: u32 },
}

/// A computed bill. `total` and `savings` are the sums of the priced lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bill {
    lines: Vec<BillLine>,
    total: Amount,
    savings: Amount,
    redeemed: Amount,
}

impl Bill {
    pub fn compute(cart: &Cart, catalog: &Catalog, discounts: &DiscountTable) -> Bill {
        let mut bill = Bill {
            lines: Vec::with_capacity(cart.lines.len()),
            total: Amount::ZERO,
            savings: Amount::ZERO,
            redeemed: Amount::ZERO,
        };

        for (id, quantity) in cart.items() {
            let Some(product) = catalog.get(id) else {
                bill.lines.push(BillLine::Unknown {
                    id: id.to_string(),
                    quantity,
                });
                continue;
            };

            let discounted = apply_discount(product.price, discounts.get(&product.category));
            // lines are kept at the 2 places they print with, so they add up to the totals
            let total = discounted.times(quantity).round_cents();
            let discount = product.price.times(quantity).round_cents() - total;

            bill.total += total;
            bill.savings += discount;
            bill.lines.push(BillLine::Item(PricedLine {
                id: product.id.clone(),
                name: product.name.clone(),
                category: product.category.clone(),
                quantity,
                unit_price: product.price,
                discount,
                total,
            }));
        }

        bill
    }

    /// Record a loyalty redemption against this bill.
    pub fn with_redemption(self, redeemed: Amount) -> Bill {
        Bill { redeemed, ..self }
    }

    pub fn lines(&self) -> &[BillLine] {
        &self.lines
    }

    pub fn priced_lines(&self) -> impl Iterator<Item = &PricedLine> + '_ {
        self.lines.iter().filter_map(|line| match line {
            BillLine::Item(priced) => Some(priced),
            BillLine::Unknown { .. } => None,
        })
    }

    /// Discounted total, before any loyalty redemption.
    pub fn total(&self) -> Amount {
        self.total
    }

    pub fn savings(&self) -> Amount {
        self.savings
    }

    pub fn redeemed(&self) -> Amount {
        self.redeemed
    }

    /// What the customer pays: total minus redeemed points.
    pub fn payable(&self) -> Amount {
        self.total - self.redeemed
    }

    /// Units sold across priced lines.
    pub fn units(&self) -> u64 {
        self.priced_lines().map(|line| u64::from(line.quantity)).sum()
    }
}
