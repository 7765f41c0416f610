//! Persistence layer for the orders system.
//!
//! Defines the [`OrderRepository`] contract and two implementations:
//! [`PostgresOrderStore`] backed by sqlx, and [`InMemoryOrderStore`] for
//! tests and database-less runs. Product resolution during order writes
//! lives in [`products`] as its own policy.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod products;
pub mod repository;

pub use domain::OrderId;
pub use error::{Result, StoreError};
pub use memory::InMemoryOrderStore;
pub use postgres::PostgresOrderStore;
pub use products::{ProductAction, ProductRecord};
pub use repository::OrderRepository;
