//! Core domain records for the billing terminal.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::Amount;

/// Product identifier, as printed on the shelf label (e.g. `P001`).
pub type ProductId = String;

/// Category name shared between the catalog and the discount table.
pub type Category = String;

/// A sellable product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Undiscounted unit price.
    pub price: Amount,
    pub category: Category,
    /// Units on hand. `None` when the catalog does not track stock for this product.
    pub stock: Option<u32>,
}

/// How a category discount reduces the unit price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscountKind {
    /// `value` is a percentage of the unit price.
    Percentage,
    /// `value` is subtracted from the unit price.
    Fixed,
    /// Anything else found in the discount table; leaves the price unchanged.
    Other(String),
}

impl From<&str> for DiscountKind {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "percentage" => DiscountKind::Percentage,
            "fixed" => DiscountKind::Fixed,
            _ => DiscountKind::Other(value.trim().to_string()),
        }
    }
}

/// Category-level discount rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscountRule {
    pub category: Category,
    pub kind: DiscountKind,
    pub value: Amount,
}

/// Customer phone number: exactly ten ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Phone(String);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("phone number must be exactly 10 digits, got '{0}'")]
pub struct InvalidPhone(pub String);

impl Phone {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Phone {
    type Err = InvalidPhone;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() == 10 && s.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Phone(s.to_string()))
        } else {
            Err(InvalidPhone(s.to_string()))
        }
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Loyalty account, keyed by phone number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoyaltyAccount {
    pub phone: Phone,
    pub name: String,
    pub points: u64,
}

impl LoyaltyAccount {
    /// Create a new account with a zero balance.
    pub fn new(phone: Phone, name: impl Into<String>) -> Self {
        Self {
            phone,
            name: name.into(),
            points: 0,
        }
    }
}
