//! Product catalog and post-sale stock update.
//!
//! The catalog is a plain value: [`Catalog::apply_sale`] consumes it and hands back
//! the updated catalog, which the caller then persists with a full-file rewrite.

use std::collections::HashMap;

use tracing::warn;

use crate::billing::Cart;
use crate::model::{Product, ProductId};

/// Products in source-file order, indexed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    products: Vec<Product>,
    index: HashMap<ProductId, usize>,
}

/// A product whose remaining stock fell below the warning threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LowStock {
    pub id: ProductId,
    pub name: String,
    pub remaining: u32,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a product. Returns `false` (leaving the catalog untouched) if the id is taken.
    pub fn insert(&mut self, product: Product) -> bool {
        if self.index.contains_key(&product.id) {
            return false;
        }
        self.index.insert(product.id.clone(), self.products.len());
        self.products.push(product);
        true
    }

    pub fn get(&self, id: &str) -> Option<&Product> {
        self.index.get(id).map(|&i| &self.products[i])
    }

    pub fn products(&self) -> impl Iterator<Item = &Product> + '_ {
        self.products.iter()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Decrement stock for every sold item and report what is running low.
    ///
    /// Products without tracked stock and ids missing from the catalog are left alone.
    /// Stock saturates at zero; the cart is expected to have been validated against it.
    pub fn apply_sale(mut self, cart: &Cart, threshold: u32) -> (Catalog, Vec<LowStock>) {
        let mut low = Vec::new();

        for (id, quantity) in cart.items() {
            let Some(&i) = self.index.get(id) else {
                continue;
            };
            let product = &mut self.products[i];
            let Some(stock) = product.stock else {
                continue;
            };

            if quantity > stock {
                warn!(
                    product = %product.id,
                    stock,
                    quantity,
                    "sale exceeds stock on hand, clamping to zero"
                );
            }
            let remaining = stock.saturating_sub(quantity);
            product.stock = Some(remaining);

            if remaining < threshold {
                low.push(LowStock {
                    id: product.id.clone(),
                    name: product.name.clone(),
                    remaining,
                });
            }
        }

        (self, low)
    }
}

impl FromIterator<Product> for Catalog {
    /// Collect products, keeping the first occurrence of a duplicated id.
    fn from_iter<I: IntoIterator<Item = Product>>(iter: I) -> Self {
        let mut catalog = Catalog::new();
        for product in iter {
            catalog.insert(product);
        }
        catalog
    }
}
