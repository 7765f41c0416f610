use std::collections::HashMap;

use async_trait::async_trait;
use domain::{
    Customer, Employee, Order, OrderDetail, OrderId, ProductId, ProductRef, Shipper,
    ShippingAddress,
};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, Row, Transaction};

use crate::error::{Result, StoreError};
use crate::products::{self, ProductAction, ProductRecord};
use crate::repository::{OrderRepository, validate_details, validate_pagination};

const ORDER_HEADER_SELECT: &str = r#"
    SELECT o.order_id,
           o.customer_code, c.company_name AS customer_company_name,
           o.employee_id, e.first_name, e.last_name, e.country,
           o.ship_via, s.company_name AS shipper_company_name,
           o.order_date, o.required_date, o.shipped_date,
           o.freight, o.ship_name, o.ship_address, o.ship_city,
           o.ship_region, o.ship_postal_code, o.ship_country
    FROM orders o
    JOIN customers c ON c.customer_code = o.customer_code
    JOIN employees e ON e.employee_id = o.employee_id
    JOIN shippers s ON s.shipper_id = o.ship_via
"#;

const ORDER_DETAIL_SELECT: &str = r#"
    SELECT d.order_id, d.product_id, p.product_name,
           p.supplier_id, sup.company_name AS supplier_name,
           p.category_id, cat.category_name,
           d.unit_price, d.quantity, d.discount
    FROM order_details d
    JOIN products p ON p.product_id = d.product_id
    JOIN suppliers sup ON sup.supplier_id = p.supplier_id
    JOIN categories cat ON cat.category_id = p.category_id
"#;

/// PostgreSQL-backed order store.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates an order store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the database at `url` and wraps the pool.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new().max_connections(10).connect(url).await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_header(row: &PgRow) -> Result<Order> {
        Ok(Order {
            id: OrderId::new(row.try_get("order_id")?),
            customer: Customer::new(
                row.try_get::<String, _>("customer_code")?,
                row.try_get::<String, _>("customer_company_name")?,
            ),
            employee: Employee {
                id: row.try_get("employee_id")?,
                first_name: row.try_get("first_name")?,
                last_name: row.try_get("last_name")?,
                country: row.try_get("country")?,
            },
            shipper: Shipper {
                id: row.try_get("ship_via")?,
                company_name: row.try_get("shipper_company_name")?,
            },
            order_date: row.try_get("order_date")?,
            required_date: row.try_get("required_date")?,
            shipped_date: row.try_get("shipped_date")?,
            freight: row.try_get("freight")?,
            ship_name: row.try_get("ship_name")?,
            shipping_address: ShippingAddress {
                address: row.try_get("ship_address")?,
                city: row.try_get("ship_city")?,
                region: row.try_get("ship_region")?,
                postal_code: row.try_get("ship_postal_code")?,
                country: row.try_get("ship_country")?,
            },
            details: Vec::new(),
        })
    }

    fn row_to_detail(row: &PgRow) -> Result<OrderDetail> {
        Ok(OrderDetail {
            product: ProductRef {
                id: ProductId::new(row.try_get("product_id")?),
                name: row.try_get("product_name")?,
                supplier_id: row.try_get("supplier_id")?,
                supplier_name: row.try_get("supplier_name")?,
                category_id: row.try_get("category_id")?,
                category_name: row.try_get("category_name")?,
            },
            unit_price: row.try_get("unit_price")?,
            quantity: row.try_get("quantity")?,
            discount: row.try_get("discount")?,
        })
    }

    /// Maps database errors from write paths, surfacing constraint
    /// violations as [`StoreError::Conflict`].
    fn map_write_error(e: sqlx::Error) -> StoreError {
        if let sqlx::Error::Database(ref db_err) = e {
            match db_err.kind() {
                sqlx::error::ErrorKind::UniqueViolation
                | sqlx::error::ErrorKind::ForeignKeyViolation
                | sqlx::error::ErrorKind::NotNullViolation
                | sqlx::error::ErrorKind::CheckViolation => {
                    return StoreError::Conflict(db_err.message().to_string());
                }
                _ => {}
            }
        }
        StoreError::Database(e)
    }

    async fn fetch_product_record(
        tx: &mut Transaction<'_, Postgres>,
        id: ProductId,
    ) -> Result<Option<ProductRecord>> {
        let row = sqlx::query(
            r#"
            SELECT p.product_id, p.product_name,
                   p.supplier_id, sup.company_name AS supplier_name,
                   p.category_id, cat.category_name
            FROM products p
            JOIN suppliers sup ON sup.supplier_id = p.supplier_id
            JOIN categories cat ON cat.category_id = p.category_id
            WHERE p.product_id = $1
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&mut **tx)
        .await?;

        row.map(|row| {
            Ok(ProductRecord {
                id: ProductId::new(row.try_get("product_id")?),
                name: row.try_get("product_name")?,
                supplier_id: row.try_get("supplier_id")?,
                supplier_name: row.try_get("supplier_name")?,
                category_id: row.try_get("category_id")?,
                category_name: row.try_get("category_name")?,
            })
        })
        .transpose()
    }

    async fn upsert_supplier(
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
        name: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO suppliers (supplier_id, company_name)
            VALUES ($1, $2)
            ON CONFLICT (supplier_id) DO UPDATE SET company_name = EXCLUDED.company_name
            "#,
        )
        .bind(id)
        .bind(name)
        .execute(&mut **tx)
        .await
        .map_err(Self::map_write_error)?;
        Ok(())
    }

    async fn upsert_category(
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
        name: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO categories (category_id, category_name)
            VALUES ($1, $2)
            ON CONFLICT (category_id) DO UPDATE SET category_name = EXCLUDED.category_name
            "#,
        )
        .bind(id)
        .bind(name)
        .execute(&mut **tx)
        .await
        .map_err(Self::map_write_error)?;
        Ok(())
    }

    /// Applies the product policy for one incoming reference inside the
    /// surrounding write transaction.
    async fn resolve_product(
        tx: &mut Transaction<'_, Postgres>,
        incoming: &ProductRef,
    ) -> Result<()> {
        let existing = Self::fetch_product_record(tx, incoming.id).await?;

        for action in products::resolve(existing.as_ref(), incoming) {
            match action {
                ProductAction::Create => {
                    Self::upsert_supplier(tx, incoming.supplier_id, &incoming.supplier_name)
                        .await?;
                    Self::upsert_category(tx, incoming.category_id, &incoming.category_name)
                        .await?;
                    sqlx::query(
                        r#"
                        INSERT INTO products (product_id, product_name, supplier_id, category_id)
                        VALUES ($1, $2, $3, $4)
                        "#,
                    )
                    .bind(incoming.id.as_i64())
                    .bind(&incoming.name)
                    .bind(incoming.supplier_id)
                    .bind(incoming.category_id)
                    .execute(&mut **tx)
                    .await
                    .map_err(Self::map_write_error)?;
                }
                ProductAction::SetSupplier { id, name } => {
                    Self::upsert_supplier(tx, id, &name).await?;
                    sqlx::query("UPDATE products SET supplier_id = $1 WHERE product_id = $2")
                        .bind(id)
                        .bind(incoming.id.as_i64())
                        .execute(&mut **tx)
                        .await
                        .map_err(Self::map_write_error)?;
                }
                ProductAction::SetCategory { id, name } => {
                    Self::upsert_category(tx, id, &name).await?;
                    sqlx::query("UPDATE products SET category_id = $1 WHERE product_id = $2")
                        .bind(id)
                        .bind(incoming.id.as_i64())
                        .execute(&mut **tx)
                        .await
                        .map_err(Self::map_write_error)?;
                }
            }
        }

        Ok(())
    }

    /// Resolves products and inserts every line of an order.
    async fn insert_details(
        tx: &mut Transaction<'_, Postgres>,
        order_id: OrderId,
        details: &[OrderDetail],
    ) -> Result<()> {
        for detail in details {
            Self::resolve_product(tx, &detail.product).await?;

            sqlx::query(
                r#"
                INSERT INTO order_details (order_id, product_id, unit_price, quantity, discount)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(order_id.as_i64())
            .bind(detail.product.id.as_i64())
            .bind(detail.unit_price)
            .bind(detail.quantity)
            .bind(detail.discount)
            .execute(&mut **tx)
            .await
            .map_err(Self::map_write_error)?;
        }
        Ok(())
    }

    async fn fetch_details_for(&self, order_ids: &[i64]) -> Result<HashMap<i64, Vec<OrderDetail>>> {
        let sql = format!("{ORDER_DETAIL_SELECT} WHERE d.order_id = ANY($1) ORDER BY d.order_id, d.product_id");
        let rows = sqlx::query(&sql).bind(order_ids).fetch_all(&self.pool).await?;

        let mut by_order: HashMap<i64, Vec<OrderDetail>> = HashMap::new();
        for row in rows {
            let order_id: i64 = row.try_get("order_id")?;
            by_order
                .entry(order_id)
                .or_default()
                .push(Self::row_to_detail(&row)?);
        }
        Ok(by_order)
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderStore {
    #[tracing::instrument(skip(self))]
    async fn get_order(&self, id: OrderId) -> Result<Order> {
        let sql = format!("{ORDER_HEADER_SELECT} WHERE o.order_id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::OrderNotFound(id))?;

        let mut order = Self::row_to_header(&row)?;

        let mut details = self.fetch_details_for(&[id.as_i64()]).await?;
        order.details = details.remove(&id.as_i64()).unwrap_or_default();

        Ok(order)
    }

    #[tracing::instrument(skip(self))]
    async fn get_orders(&self, skip: i64, count: i64) -> Result<Vec<Order>> {
        validate_pagination(skip, count)?;

        let sql = format!("{ORDER_HEADER_SELECT} ORDER BY o.order_id ASC OFFSET $1 LIMIT $2");
        let rows = sqlx::query(&sql)
            .bind(skip)
            .bind(count)
            .fetch_all(&self.pool)
            .await?;

        let mut orders = rows
            .iter()
            .map(Self::row_to_header)
            .collect::<Result<Vec<_>>>()?;

        let ids: Vec<i64> = orders.iter().map(|o| o.id.as_i64()).collect();
        let mut details = self.fetch_details_for(&ids).await?;
        for order in &mut orders {
            order.details = details.remove(&order.id.as_i64()).unwrap_or_default();
        }

        Ok(orders)
    }

    #[tracing::instrument(skip(self, order))]
    async fn add_order(&self, order: &Order) -> Result<OrderId> {
        validate_details(order)?;

        let mut tx = self.pool.begin().await?;

        let order_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO orders (customer_code, employee_id, order_date, required_date,
                                shipped_date, ship_via, freight, ship_name, ship_address,
                                ship_city, ship_region, ship_postal_code, ship_country)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING order_id
            "#,
        )
        .bind(order.customer.code.as_str())
        .bind(order.employee.id)
        .bind(order.order_date)
        .bind(order.required_date)
        .bind(order.shipped_date)
        .bind(order.shipper.id)
        .bind(order.freight)
        .bind(&order.ship_name)
        .bind(&order.shipping_address.address)
        .bind(&order.shipping_address.city)
        .bind(&order.shipping_address.region)
        .bind(&order.shipping_address.postal_code)
        .bind(&order.shipping_address.country)
        .fetch_one(&mut *tx)
        .await
        .map_err(Self::map_write_error)?;

        let order_id = OrderId::new(order_id);
        Self::insert_details(&mut tx, order_id, &order.details).await?;

        tx.commit().await?;
        tracing::info!(%order_id, "order added");
        Ok(order_id)
    }

    #[tracing::instrument(skip(self))]
    async fn remove_order(&self, id: OrderId) -> Result<()> {
        let result = sqlx::query("DELETE FROM orders WHERE order_id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::OrderNotFound(id));
        }

        tracing::info!(order_id = %id, "order removed");
        Ok(())
    }

    #[tracing::instrument(skip(self, order))]
    async fn update_order(&self, order: &Order) -> Result<()> {
        validate_details(order)?;

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET customer_code = $1, employee_id = $2, order_date = $3, required_date = $4,
                shipped_date = $5, ship_via = $6, freight = $7, ship_name = $8,
                ship_address = $9, ship_city = $10, ship_region = $11,
                ship_postal_code = $12, ship_country = $13
            WHERE order_id = $14
            "#,
        )
        .bind(order.customer.code.as_str())
        .bind(order.employee.id)
        .bind(order.order_date)
        .bind(order.required_date)
        .bind(order.shipped_date)
        .bind(order.shipper.id)
        .bind(order.freight)
        .bind(&order.ship_name)
        .bind(&order.shipping_address.address)
        .bind(&order.shipping_address.city)
        .bind(&order.shipping_address.region)
        .bind(&order.shipping_address.postal_code)
        .bind(&order.shipping_address.country)
        .bind(order.id.as_i64())
        .execute(&mut *tx)
        .await
        .map_err(Self::map_write_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::OrderNotFound(order.id));
        }

        // Full replace of the detail set, never a merge.
        sqlx::query("DELETE FROM order_details WHERE order_id = $1")
            .bind(order.id.as_i64())
            .execute(&mut *tx)
            .await?;

        Self::insert_details(&mut tx, order.id, &order.details).await?;

        tx.commit().await?;
        tracing::info!(order_id = %order.id, "order updated");
        Ok(())
    }
}
