//! Cart Error Types

use thiserror::Error;

/// Result type alias for cart operations
pub type Result<T> = std::result::Result<T, CartError>;

/// Errors raised while building or validating a cart
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// `items` missing, not a list, or empty
    #[error("No items provided")]
    NoItems,

    /// Request body is not a JSON document
    #[error("Invalid JSON body: {0}")]
    InvalidJson(String),

    /// A single entry failed coercion
    #[error("Invalid item at index {index}: {reason}")]
    InvalidItem { index: usize, reason: String },

    /// Two entries share an id but disagree on name or price
    #[error("Conflicting entries for item id: {0}")]
    DuplicateItem(String),

    /// Product id is not in the cart
    #[error("Item not in cart: {0}")]
    ItemNotFound(String),

    /// Adding would exceed the product's available quantity
    #[error("Only {available} of {id} available")]
    OutOfStock { id: String, available: u32 },
}

impl CartError {
    pub(crate) fn item(index: usize, reason: impl Into<String>) -> Self {
        CartError::InvalidItem {
            index,
            reason: reason.into(),
        }
    }
}
