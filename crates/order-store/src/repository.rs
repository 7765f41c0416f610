//! The order repository contract.

use async_trait::async_trait;
use domain::{Order, OrderId};

use crate::error::{Result, StoreError};

/// Read/write access to the order aggregate.
///
/// Each operation is a bounded sequence of storage queries followed by
/// a single commit. There is no conflict detection between callers;
/// concurrent updates to the same order are last-writer-wins.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Fetches an order by primary key with all related entities
    /// resolved: customer, employee, shipper, and each line's product
    /// with its category and supplier.
    ///
    /// Fails with [`StoreError::OrderNotFound`] when no row matches.
    async fn get_order(&self, id: OrderId) -> Result<Order>;

    /// Returns orders sorted by id ascending, skipping `skip` rows and
    /// returning up to `count`.
    ///
    /// Fails with [`StoreError::InvalidPagination`] when `skip < 0` or
    /// `count <= 0`.
    async fn get_orders(&self, skip: i64, count: i64) -> Result<Vec<Order>>;

    /// Persists a new order and its details, returning the generated
    /// id. Each line's product is resolved or created through the
    /// product policy before the line is inserted.
    ///
    /// Fails with [`StoreError::InvalidOrder`] when any line references
    /// a non-positive product id; no partial write is left visible.
    /// Fails with [`StoreError::Conflict`] on constraint violation.
    async fn add_order(&self, order: &Order) -> Result<OrderId>;

    /// Deletes the order and its details.
    ///
    /// Fails with [`StoreError::OrderNotFound`] when absent.
    async fn remove_order(&self, id: OrderId) -> Result<()>;

    /// Overwrites all scalar header fields, deletes all existing
    /// details, and re-inserts the supplied details, re-resolving
    /// products exactly as in [`OrderRepository::add_order`]. This is
    /// a full replace, never a merge.
    ///
    /// Fails with [`StoreError::OrderNotFound`] when the order id does
    /// not exist.
    async fn update_order(&self, order: &Order) -> Result<()>;
}

/// Rejects out-of-range pagination before any query runs.
pub(crate) fn validate_pagination(skip: i64, count: i64) -> Result<()> {
    if skip < 0 || count <= 0 {
        return Err(StoreError::InvalidPagination { skip, count });
    }
    Ok(())
}

/// Rejects orders with unresolvable product references before the
/// first mutation, so a bad line never leaves a partial write.
pub(crate) fn validate_details(order: &Order) -> Result<()> {
    for detail in &order.details {
        detail.validate_product()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_rejects_negative_skip() {
        assert!(matches!(
            validate_pagination(-1, 10),
            Err(StoreError::InvalidPagination { skip: -1, count: 10 })
        ));
    }

    #[test]
    fn pagination_rejects_non_positive_count() {
        assert!(validate_pagination(0, 0).is_err());
        assert!(validate_pagination(0, -5).is_err());
    }

    #[test]
    fn pagination_accepts_zero_skip_positive_count() {
        assert!(validate_pagination(0, 1).is_ok());
    }
}
