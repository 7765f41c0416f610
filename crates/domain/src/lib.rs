//! Domain model for the orders system.
//!
//! This crate provides the storage-independent order aggregate:
//! - Typed identifiers (`OrderId`, `ProductId`, `CustomerCode`)
//! - The `Order` aggregate with its owned `OrderDetail` lines
//! - Referenced entities (customer, employee, shipper, product)
//! - Validation rules for order lines

pub mod error;
pub mod ids;
pub mod order;

pub use error::OrderError;
pub use ids::{CustomerCode, OrderId, ProductId};
pub use order::{
    Customer, Employee, Order, OrderDetail, ProductRef, Shipper, ShippingAddress,
};
