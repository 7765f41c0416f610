//! Domain validation errors.

use thiserror::Error;

/// Errors raised when building an order aggregate from raw input.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Order line quantity must be positive.
    #[error("invalid quantity {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: i64 },

    /// Discount is a fraction of the line price.
    #[error("invalid discount {discount} (must be in [0, 1))")]
    InvalidDiscount { discount: f64 },

    /// Unit price may not be negative.
    #[error("invalid unit price {price} (must not be negative)")]
    InvalidUnitPrice { price: f64 },

    /// Order lines must reference a persisted or creatable product.
    #[error("invalid product id {product_id} in order detail (must be positive)")]
    InvalidProductId { product_id: i64 },
}
