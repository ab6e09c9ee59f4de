//! Validation errors raised while building a cart.

use thiserror::Error;

use crate::model::ProductId;

/// Why an entry was refused. None of these abort the transaction; the terminal re-prompts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    #[error("product {0} not found")]
    UnknownProduct(ProductId),

    #[error("invalid quantity '{0}'")]
    InvalidQuantity(String),

    #[error("only {available} of {name} in stock, requested {requested}")]
    InsufficientStock {
        name: String,
        available: u32,
        requested: u32,
    },
}
