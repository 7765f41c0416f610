//! Order CRUD endpoints.
//!
//! Single-order reads return the full representation with denormalized
//! display fields for every referenced entity; lists and writes use the
//! brief representation that carries identifiers only.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use domain::{Customer, Employee, Order, OrderDetail, OrderId, ProductRef, Shipper, ShippingAddress};
use order_store::OrderRepository;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<R: OrderRepository> {
    pub repository: R,
}

// -- Wire types --

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FullOrder {
    pub id: i64,
    pub customer: CustomerDto,
    pub employee: EmployeeDto,
    pub order_date: DateTime<Utc>,
    pub required_date: DateTime<Utc>,
    pub shipped_date: Option<DateTime<Utc>>,
    pub shipper: ShipperDto,
    pub freight: f64,
    pub ship_name: String,
    pub shipping_address: ShippingAddressDto,
    pub order_details: Vec<FullOrderDetail>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDto {
    pub code: String,
    pub company_name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDto {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub country: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipperDto {
    pub id: i64,
    pub company_name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddressDto {
    pub address: String,
    pub city: String,
    pub region: Option<String>,
    pub postal_code: String,
    pub country: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FullOrderDetail {
    pub product_id: i64,
    pub product_name: String,
    pub category_id: i64,
    pub category_name: String,
    pub supplier_id: i64,
    pub supplier_company_name: String,
    pub unit_price: f64,
    pub quantity: i64,
    pub discount: f64,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BriefOrder {
    #[serde(default)]
    pub id: i64,
    pub customer_id: String,
    pub employee_id: i64,
    pub order_date: DateTime<Utc>,
    pub required_date: DateTime<Utc>,
    #[serde(default)]
    pub shipped_date: Option<DateTime<Utc>>,
    pub shipper_id: i64,
    pub freight: f64,
    pub ship_name: String,
    pub ship_address: String,
    pub ship_city: String,
    #[serde(default)]
    pub ship_region: Option<String>,
    pub ship_postal_code: String,
    pub ship_country: String,
    #[serde(default)]
    pub order_details: Vec<BriefOrderDetail>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BriefOrderDetail {
    pub product_id: i64,
    pub unit_price: f64,
    pub quantity: i64,
    pub discount: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddOrderResponse {
    pub order_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub skip: Option<i64>,
    pub count: Option<i64>,
}

// -- Handlers --

/// GET /orders/{id} — full representation of one order.
#[tracing::instrument(skip(state))]
pub async fn get<R: OrderRepository>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<i64>,
) -> Result<Json<FullOrder>, ApiError> {
    let order = state.repository.get_order(OrderId::new(id)).await?;
    Ok(Json(map_to_full(&order)))
}

/// GET /orders?skip=&count= — brief representations, id ascending.
#[tracing::instrument(skip(state))]
pub async fn list<R: OrderRepository>(
    State(state): State<Arc<AppState<R>>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<BriefOrder>>, ApiError> {
    let orders = state
        .repository
        .get_orders(params.skip.unwrap_or(0), params.count.unwrap_or(10))
        .await?;
    Ok(Json(orders.iter().map(map_to_brief).collect()))
}

/// POST /orders — create an order from its brief representation.
#[tracing::instrument(skip(state, body))]
pub async fn create<R: OrderRepository>(
    State(state): State<Arc<AppState<R>>>,
    Json(body): Json<BriefOrder>,
) -> Result<Json<AddOrderResponse>, ApiError> {
    let order = map_to_order(&body)?;
    let order_id = state.repository.add_order(&order).await?;

    metrics::counter!("orders_created_total").increment(1);
    Ok(Json(AddOrderResponse {
        order_id: order_id.as_i64(),
    }))
}

/// PUT /orders/{id} — replace an order with its brief representation.
#[tracing::instrument(skip(state, body))]
pub async fn update<R: OrderRepository>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<i64>,
    Json(body): Json<BriefOrder>,
) -> Result<StatusCode, ApiError> {
    if id != body.id {
        return Err(ApiError::BadRequest(format!(
            "path id {id} does not match body id {}",
            body.id
        )));
    }

    let order = map_to_order(&body)?;
    state.repository.update_order(&order).await?;

    metrics::counter!("orders_updated_total").increment(1);
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /orders/{id} — remove an order and its details.
#[tracing::instrument(skip(state))]
pub async fn remove<R: OrderRepository>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.repository.remove_order(OrderId::new(id)).await?;

    metrics::counter!("orders_removed_total").increment(1);
    Ok(StatusCode::NO_CONTENT)
}

// -- Mapping --

fn map_to_full(order: &Order) -> FullOrder {
    FullOrder {
        id: order.id.as_i64(),
        customer: CustomerDto {
            code: order.customer.code.as_str().to_string(),
            company_name: order.customer.company_name.clone(),
        },
        employee: EmployeeDto {
            id: order.employee.id,
            first_name: order.employee.first_name.clone(),
            last_name: order.employee.last_name.clone(),
            country: order.employee.country.clone(),
        },
        order_date: order.order_date,
        required_date: order.required_date,
        shipped_date: order.shipped_date,
        shipper: ShipperDto {
            id: order.shipper.id,
            company_name: order.shipper.company_name.clone(),
        },
        freight: order.freight,
        ship_name: order.ship_name.clone(),
        shipping_address: ShippingAddressDto {
            address: order.shipping_address.address.clone(),
            city: order.shipping_address.city.clone(),
            region: order.shipping_address.region.clone(),
            postal_code: order.shipping_address.postal_code.clone(),
            country: order.shipping_address.country.clone(),
        },
        order_details: order
            .details
            .iter()
            .map(|d| FullOrderDetail {
                product_id: d.product.id.as_i64(),
                product_name: d.product.name.clone(),
                category_id: d.product.category_id,
                category_name: d.product.category_name.clone(),
                supplier_id: d.product.supplier_id,
                supplier_company_name: d.product.supplier_name.clone(),
                unit_price: d.unit_price,
                quantity: d.quantity,
                discount: d.discount,
            })
            .collect(),
    }
}

fn map_to_brief(order: &Order) -> BriefOrder {
    BriefOrder {
        id: order.id.as_i64(),
        customer_id: order.customer.code.as_str().to_string(),
        employee_id: order.employee.id,
        order_date: order.order_date,
        required_date: order.required_date,
        shipped_date: order.shipped_date,
        shipper_id: order.shipper.id,
        freight: order.freight,
        ship_name: order.ship_name.clone(),
        ship_address: order.shipping_address.address.clone(),
        ship_city: order.shipping_address.city.clone(),
        ship_region: order.shipping_address.region.clone(),
        ship_postal_code: order.shipping_address.postal_code.clone(),
        ship_country: order.shipping_address.country.clone(),
        order_details: order
            .details
            .iter()
            .map(|d| BriefOrderDetail {
                product_id: d.product.id.as_i64(),
                unit_price: d.unit_price,
                quantity: d.quantity,
                discount: d.discount,
            })
            .collect(),
    }
}

/// Builds the domain aggregate from brief write input. The brief shape
/// carries identifiers only, so display fields start out empty and the
/// customer company name defaults to the code.
fn map_to_order(brief: &BriefOrder) -> Result<Order, ApiError> {
    let details = brief
        .order_details
        .iter()
        .map(|d| {
            OrderDetail::new(
                ProductRef::by_id(d.product_id),
                d.unit_price,
                d.quantity,
                d.discount,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Order {
        id: OrderId::new(brief.id),
        customer: Customer::new(brief.customer_id.clone(), brief.customer_id.clone()),
        employee: Employee {
            id: brief.employee_id,
            first_name: String::new(),
            last_name: String::new(),
            country: String::new(),
        },
        shipper: Shipper {
            id: brief.shipper_id,
            company_name: String::new(),
        },
        order_date: brief.order_date,
        required_date: brief.required_date,
        shipped_date: brief.shipped_date,
        freight: brief.freight,
        ship_name: brief.ship_name.clone(),
        shipping_address: ShippingAddress {
            address: brief.ship_address.clone(),
            city: brief.ship_city.clone(),
            region: brief.ship_region.clone(),
            postal_code: brief.ship_postal_code.clone(),
            country: brief.ship_country.clone(),
        },
        details,
    })
}
