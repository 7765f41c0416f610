use domain::{OrderError, OrderId};
use thiserror::Error;

/// Errors that can occur when interacting with the order store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No order exists with the given id.
    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    /// Pagination arguments out of range (skip < 0 or count <= 0).
    #[error("invalid pagination: skip {skip}, count {count}")]
    InvalidPagination { skip: i64, count: i64 },

    /// The supplied order failed domain validation.
    #[error("invalid order: {0}")]
    InvalidOrder(#[from] OrderError),

    /// A storage constraint was violated during a write.
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for order store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
