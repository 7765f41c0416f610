//! The order aggregate and its referenced entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::OrderError;
use crate::ids::{CustomerCode, OrderId, ProductId};

/// Customer referenced by an order, with its denormalized display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub code: CustomerCode,
    pub company_name: String,
}

impl Customer {
    pub fn new(code: impl Into<CustomerCode>, company_name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            company_name: company_name.into(),
        }
    }
}

/// Employee referenced by an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub country: String,
}

/// Shipper referenced by an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipper {
    pub id: i64,
    pub company_name: String,
}

/// Product referenced by an order line, with denormalized supplier and
/// category display names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRef {
    pub id: ProductId,
    pub name: String,
    pub supplier_id: i64,
    pub supplier_name: String,
    pub category_id: i64,
    pub category_name: String,
}

impl ProductRef {
    /// A product reference carrying only an id, as write-oriented input
    /// provides it. Display fields stay empty until resolved from storage.
    pub fn by_id(id: impl Into<ProductId>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            supplier_id: 0,
            supplier_name: String::new(),
            category_id: 0,
            category_name: String::new(),
        }
    }
}

/// Ship-to address on an order header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub address: String,
    pub city: String,
    pub region: Option<String>,
    pub postal_code: String,
    pub country: String,
}

/// One line of an order.
///
/// `(order, product)` is conceptually unique within an order; the
/// persistence layer enforces it with a composite key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetail {
    pub product: ProductRef,
    pub unit_price: f64,
    pub quantity: i64,
    pub discount: f64,
}

impl OrderDetail {
    /// Creates a validated order line.
    ///
    /// Quantity must be positive, unit price non-negative, and discount
    /// a fraction in `[0, 1)`.
    pub fn new(
        product: ProductRef,
        unit_price: f64,
        quantity: i64,
        discount: f64,
    ) -> Result<Self, OrderError> {
        if quantity <= 0 {
            return Err(OrderError::InvalidQuantity { quantity });
        }
        if unit_price < 0.0 || !unit_price.is_finite() {
            return Err(OrderError::InvalidUnitPrice { price: unit_price });
        }
        if !(0.0..1.0).contains(&discount) {
            return Err(OrderError::InvalidDiscount { discount });
        }

        Ok(Self {
            product,
            unit_price,
            quantity,
            discount,
        })
    }

    /// Checks that the line references a product id storage can resolve.
    ///
    /// Write-oriented input may carry any id; stores call this before
    /// the first mutation so a bad line never leaves a partial write.
    pub fn validate_product(&self) -> Result<(), OrderError> {
        if !self.product.id.is_positive() {
            return Err(OrderError::InvalidProductId {
                product_id: self.product.id.as_i64(),
            });
        }
        Ok(())
    }
}

/// An order header together with its owned detail lines.
///
/// The id is immutable after creation; referenced entities
/// (customer, employee, shipper, products) are looked up or upserted
/// by identity and never deleted through order operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer: Customer,
    pub employee: Employee,
    pub shipper: Shipper,
    pub order_date: DateTime<Utc>,
    pub required_date: DateTime<Utc>,
    pub shipped_date: Option<DateTime<Utc>>,
    pub freight: f64,
    pub ship_name: String,
    pub shipping_address: ShippingAddress,
    pub details: Vec<OrderDetail>,
}

impl Order {
    /// Returns the detail line for a product, if the order has one.
    pub fn detail_for(&self, product_id: ProductId) -> Option<&OrderDetail> {
        self.details.iter().find(|d| d.product.id == product_id)
    }
}
