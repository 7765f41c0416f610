use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{
    Customer, Employee, Order, OrderDetail, OrderId, ProductId, ProductRef, Shipper,
    ShippingAddress,
};
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::products::{self, ProductAction, ProductRecord};
use crate::repository::{OrderRepository, validate_details, validate_pagination};

/// In-memory order store for tests and database-less runs.
///
/// Mirrors the relational schema (normalized rows, reference tables
/// resolved on read) and provides the same interface as the PostgreSQL
/// implementation. Reference rows are seeded through the `put_*`
/// methods; order writes referencing unseeded rows fail with
/// [`StoreError::Conflict`], matching a foreign-key violation.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    inner: Arc<RwLock<Tables>>,
}

#[derive(Default)]
struct Tables {
    next_order_id: i64,
    orders: BTreeMap<i64, OrderRow>,
    customers: HashMap<String, String>,
    employees: HashMap<i64, EmployeeRow>,
    shippers: HashMap<i64, String>,
    suppliers: HashMap<i64, String>,
    categories: HashMap<i64, String>,
    products: HashMap<i64, ProductRow>,
}

#[derive(Clone)]
struct EmployeeRow {
    first_name: String,
    last_name: String,
    country: String,
}

#[derive(Clone)]
struct ProductRow {
    name: String,
    supplier_id: i64,
    category_id: i64,
}

struct OrderRow {
    customer_code: String,
    employee_id: i64,
    ship_via: i64,
    order_date: DateTime<Utc>,
    required_date: DateTime<Utc>,
    shipped_date: Option<DateTime<Utc>>,
    freight: f64,
    ship_name: String,
    ship_address: String,
    ship_city: String,
    ship_region: Option<String>,
    ship_postal_code: String,
    ship_country: String,
    details: Vec<DetailRow>,
}

struct DetailRow {
    product_id: i64,
    unit_price: f64,
    quantity: i64,
    discount: f64,
}

impl Tables {
    fn product_record(&self, id: i64) -> Option<ProductRecord> {
        let product = self.products.get(&id)?;
        Some(ProductRecord {
            id: ProductId::new(id),
            name: product.name.clone(),
            supplier_id: product.supplier_id,
            supplier_name: self
                .suppliers
                .get(&product.supplier_id)
                .cloned()
                .unwrap_or_default(),
            category_id: product.category_id,
            category_name: self
                .categories
                .get(&product.category_id)
                .cloned()
                .unwrap_or_default(),
        })
    }

    /// Simulates the foreign-key checks a relational store performs on
    /// order writes.
    fn check_references(&self, order: &Order) -> Result<()> {
        if !self.customers.contains_key(order.customer.code.as_str()) {
            return Err(StoreError::Conflict(format!(
                "unknown customer {}",
                order.customer.code
            )));
        }
        if !self.employees.contains_key(&order.employee.id) {
            return Err(StoreError::Conflict(format!(
                "unknown employee {}",
                order.employee.id
            )));
        }
        if !self.shippers.contains_key(&order.shipper.id) {
            return Err(StoreError::Conflict(format!(
                "unknown shipper {}",
                order.shipper.id
            )));
        }
        Ok(())
    }

    /// Simulates the composite primary key on order lines.
    fn check_distinct_products(order: &Order) -> Result<()> {
        let mut seen = HashSet::new();
        for detail in &order.details {
            if !seen.insert(detail.product.id) {
                return Err(StoreError::Conflict(format!(
                    "duplicate product {} in order details",
                    detail.product.id
                )));
            }
        }
        Ok(())
    }

    fn apply_product_actions(&mut self, incoming: &ProductRef) {
        let existing = self.product_record(incoming.id.as_i64());
        for action in products::resolve(existing.as_ref(), incoming) {
            match action {
                ProductAction::Create => {
                    self.suppliers
                        .insert(incoming.supplier_id, incoming.supplier_name.clone());
                    self.categories
                        .insert(incoming.category_id, incoming.category_name.clone());
                    self.products.insert(
                        incoming.id.as_i64(),
                        ProductRow {
                            name: incoming.name.clone(),
                            supplier_id: incoming.supplier_id,
                            category_id: incoming.category_id,
                        },
                    );
                }
                ProductAction::SetSupplier { id, name } => {
                    self.suppliers.insert(id, name);
                    if let Some(product) = self.products.get_mut(&incoming.id.as_i64()) {
                        product.supplier_id = id;
                    }
                }
                ProductAction::SetCategory { id, name } => {
                    self.categories.insert(id, name);
                    if let Some(product) = self.products.get_mut(&incoming.id.as_i64()) {
                        product.category_id = id;
                    }
                }
            }
        }
    }

    fn header_to_row(order: &Order) -> OrderRow {
        OrderRow {
            customer_code: order.customer.code.as_str().to_string(),
            employee_id: order.employee.id,
            ship_via: order.shipper.id,
            order_date: order.order_date,
            required_date: order.required_date,
            shipped_date: order.shipped_date,
            freight: order.freight,
            ship_name: order.ship_name.clone(),
            ship_address: order.shipping_address.address.clone(),
            ship_city: order.shipping_address.city.clone(),
            ship_region: order.shipping_address.region.clone(),
            ship_postal_code: order.shipping_address.postal_code.clone(),
            ship_country: order.shipping_address.country.clone(),
            details: order
                .details
                .iter()
                .map(|d| DetailRow {
                    product_id: d.product.id.as_i64(),
                    unit_price: d.unit_price,
                    quantity: d.quantity,
                    discount: d.discount,
                })
                .collect(),
        }
    }

    fn row_to_order(&self, id: i64, row: &OrderRow) -> Order {
        let employee = self.employees.get(&row.employee_id).cloned();
        Order {
            id: OrderId::new(id),
            customer: Customer::new(
                row.customer_code.clone(),
                self.customers
                    .get(&row.customer_code)
                    .cloned()
                    .unwrap_or_default(),
            ),
            employee: Employee {
                id: row.employee_id,
                first_name: employee
                    .as_ref()
                    .map(|e| e.first_name.clone())
                    .unwrap_or_default(),
                last_name: employee
                    .as_ref()
                    .map(|e| e.last_name.clone())
                    .unwrap_or_default(),
                country: employee.map(|e| e.country).unwrap_or_default(),
            },
            shipper: Shipper {
                id: row.ship_via,
                company_name: self.shippers.get(&row.ship_via).cloned().unwrap_or_default(),
            },
            order_date: row.order_date,
            required_date: row.required_date,
            shipped_date: row.shipped_date,
            freight: row.freight,
            ship_name: row.ship_name.clone(),
            shipping_address: ShippingAddress {
                address: row.ship_address.clone(),
                city: row.ship_city.clone(),
                region: row.ship_region.clone(),
                postal_code: row.ship_postal_code.clone(),
                country: row.ship_country.clone(),
            },
            details: row
                .details
                .iter()
                .map(|d| OrderDetail {
                    product: self
                        .product_record(d.product_id)
                        .map(|record| ProductRef {
                            id: record.id,
                            name: record.name,
                            supplier_id: record.supplier_id,
                            supplier_name: record.supplier_name,
                            category_id: record.category_id,
                            category_name: record.category_name,
                        })
                        .unwrap_or_else(|| ProductRef::by_id(d.product_id)),
                    unit_price: d.unit_price,
                    quantity: d.quantity,
                    discount: d.discount,
                })
                .collect(),
        }
    }
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a customer row.
    pub async fn put_customer(&self, code: &str, company_name: &str) {
        self.inner
            .write()
            .await
            .customers
            .insert(code.to_string(), company_name.to_string());
    }

    /// Seeds an employee row.
    pub async fn put_employee(&self, id: i64, first_name: &str, last_name: &str, country: &str) {
        self.inner.write().await.employees.insert(
            id,
            EmployeeRow {
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                country: country.to_string(),
            },
        );
    }

    /// Seeds a shipper row.
    pub async fn put_shipper(&self, id: i64, company_name: &str) {
        self.inner
            .write()
            .await
            .shippers
            .insert(id, company_name.to_string());
    }

    /// Seeds a product row together with its supplier and category rows.
    pub async fn put_product(&self, record: ProductRecord) {
        let mut tables = self.inner.write().await;
        tables
            .suppliers
            .insert(record.supplier_id, record.supplier_name.clone());
        tables
            .categories
            .insert(record.category_id, record.category_name.clone());
        tables.products.insert(
            record.id.as_i64(),
            ProductRow {
                name: record.name,
                supplier_id: record.supplier_id,
                category_id: record.category_id,
            },
        );
    }

    /// Returns the stored product row joined with its reference names,
    /// if the product exists.
    pub async fn product_record(&self, id: i64) -> Option<ProductRecord> {
        self.inner.read().await.product_record(id)
    }

    /// Returns the total number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.inner.read().await.orders.len()
    }

    /// Clears all orders and reference data.
    pub async fn clear(&self) {
        let mut tables = self.inner.write().await;
        *tables = Tables::default();
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderStore {
    async fn get_order(&self, id: OrderId) -> Result<Order> {
        let tables = self.inner.read().await;
        let row = tables
            .orders
            .get(&id.as_i64())
            .ok_or(StoreError::OrderNotFound(id))?;
        Ok(tables.row_to_order(id.as_i64(), row))
    }

    async fn get_orders(&self, skip: i64, count: i64) -> Result<Vec<Order>> {
        validate_pagination(skip, count)?;

        let tables = self.inner.read().await;
        Ok(tables
            .orders
            .iter()
            .skip(skip as usize)
            .take(count as usize)
            .map(|(id, row)| tables.row_to_order(*id, row))
            .collect())
    }

    async fn add_order(&self, order: &Order) -> Result<OrderId> {
        validate_details(order)?;

        let mut tables = self.inner.write().await;
        tables.check_references(order)?;
        Tables::check_distinct_products(order)?;

        for detail in &order.details {
            tables.apply_product_actions(&detail.product);
        }

        tables.next_order_id += 1;
        let id = tables.next_order_id;
        tables.orders.insert(id, Tables::header_to_row(order));

        Ok(OrderId::new(id))
    }

    async fn remove_order(&self, id: OrderId) -> Result<()> {
        let mut tables = self.inner.write().await;
        tables
            .orders
            .remove(&id.as_i64())
            .ok_or(StoreError::OrderNotFound(id))?;
        Ok(())
    }

    async fn update_order(&self, order: &Order) -> Result<()> {
        validate_details(order)?;

        let mut tables = self.inner.write().await;
        if !tables.orders.contains_key(&order.id.as_i64()) {
            return Err(StoreError::OrderNotFound(order.id));
        }
        tables.check_references(order)?;
        Tables::check_distinct_products(order)?;

        for detail in &order.details {
            tables.apply_product_actions(&detail.product);
        }

        // Header overwrite plus full replacement of the detail set.
        tables
            .orders
            .insert(order.id.as_i64(), Tables::header_to_row(order));

        Ok(())
    }
}
