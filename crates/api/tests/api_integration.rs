//! Integration tests for the API server over the in-memory store.

use std::sync::OnceLock;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::InMemoryOrderStore;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

/// App over a store seeded with the reference rows order writes need.
async fn setup() -> Router {
    let store = InMemoryOrderStore::new();
    store.put_customer("ALFKI", "Alfreds Futterkiste").await;
    store.put_employee(1, "Nancy", "Davolio", "USA").await;
    store.put_shipper(1, "Speedy Express").await;

    let state = api::create_state(store);
    api::create_app(state, get_metrics_handle(), Duration::from_secs(5))
}

fn order_body() -> serde_json::Value {
    serde_json::json!({
        "customerId": "ALFKI",
        "employeeId": 1,
        "orderDate": "1996-07-04T00:00:00Z",
        "requiredDate": "1996-08-01T00:00:00Z",
        "shipperId": 1,
        "freight": 10.5,
        "shipName": "Alfreds Futterkiste",
        "shipAddress": "Obere Str. 57",
        "shipCity": "Berlin",
        "shipPostalCode": "12209",
        "shipCountry": "Germany",
        "orderDetails": [
            { "productId": 7, "unitPrice": 9.99, "quantity": 2, "discount": 0.0 }
        ]
    })
}

async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_string(&json).unwrap())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, json)
}

#[tokio::test]
async fn test_health_check() {
    let app = setup().await;
    let (status, json) = request(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_create_then_get_full_order() {
    let app = setup().await;

    let (status, json) = request(&app, "POST", "/orders", Some(order_body())).await;
    assert_eq!(status, StatusCode::OK);
    let order_id = json["orderId"].as_i64().unwrap();
    assert!(order_id > 0);

    let (status, json) = request(&app, "GET", &format!("/orders/{order_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], order_id);
    assert_eq!(json["customer"]["code"], "ALFKI");
    assert_eq!(json["customer"]["companyName"], "Alfreds Futterkiste");
    assert_eq!(json["employee"]["firstName"], "Nancy");
    assert_eq!(json["shipper"]["id"], 1);
    assert_eq!(json["freight"], 10.5);
    assert_eq!(json["shippingAddress"]["city"], "Berlin");

    let details = json["orderDetails"].as_array().unwrap();
    assert_eq!(details.len(), 1);
    assert_eq!(details[0]["productId"], 7);
    assert_eq!(details[0]["quantity"], 2);
    assert_eq!(details[0]["unitPrice"], 9.99);
}

#[tokio::test]
async fn test_get_missing_order_is_404() {
    let app = setup().await;
    let (status, _) = request(&app, "GET", "/orders/424242", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_pages_brief_orders_in_id_order() {
    let app = setup().await;

    for _ in 0..3 {
        let (status, _) = request(&app, "POST", "/orders", Some(order_body())).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, json) = request(&app, "GET", "/orders", None).await;
    assert_eq!(status, StatusCode::OK);
    let orders = json.as_array().unwrap();
    assert_eq!(orders.len(), 3);
    assert_eq!(orders[0]["customerId"], "ALFKI");
    // Brief shape: identifiers only, no nested display objects.
    assert!(orders[0].get("customer").is_none());

    let ids: Vec<i64> = orders.iter().map(|o| o["id"].as_i64().unwrap()).collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    assert_eq!(ids, sorted);

    let (status, json) = request(&app, "GET", "/orders?skip=1&count=1", None).await;
    assert_eq!(status, StatusCode::OK);
    let page = json.as_array().unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0]["id"].as_i64().unwrap(), ids[1]);
}

#[tokio::test]
async fn test_bad_pagination_is_400() {
    let app = setup().await;

    let (status, _) = request(&app, "GET", "/orders?skip=-1&count=10", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = request(&app, "GET", "/orders?skip=0&count=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_with_invalid_quantity_is_400() {
    let app = setup().await;

    let mut body = order_body();
    body["orderDetails"][0]["quantity"] = serde_json::json!(0);
    let (status, _) = request(&app, "POST", "/orders", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_with_non_positive_product_id_is_400() {
    let app = setup().await;

    let mut body = order_body();
    body["orderDetails"][0]["productId"] = serde_json::json!(0);
    let (status, _) = request(&app, "POST", "/orders", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_put_with_mismatched_id_is_400() {
    let app = setup().await;

    let (_, json) = request(&app, "POST", "/orders", Some(order_body())).await;
    let order_id = json["orderId"].as_i64().unwrap();

    let mut body = order_body();
    body["id"] = serde_json::json!(order_id + 1);
    let (status, _) = request(&app, "PUT", &format!("/orders/{order_id}"), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_put_missing_order_is_404() {
    let app = setup().await;

    let mut body = order_body();
    body["id"] = serde_json::json!(424242);
    let (status, _) = request(&app, "PUT", "/orders/424242", Some(body)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_put_replaces_the_detail_set() {
    let app = setup().await;

    let (_, json) = request(&app, "POST", "/orders", Some(order_body())).await;
    let order_id = json["orderId"].as_i64().unwrap();

    let mut body = order_body();
    body["id"] = serde_json::json!(order_id);
    body["freight"] = serde_json::json!(3.25);
    body["orderDetails"] = serde_json::json!([]);
    let (status, _) = request(&app, "PUT", &format!("/orders/{order_id}"), Some(body)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, json) = request(&app, "GET", &format!("/orders/{order_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["freight"], 3.25);
    assert!(json["orderDetails"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_then_get_is_404() {
    let app = setup().await;

    let (_, json) = request(&app, "POST", "/orders", Some(order_body())).await;
    let order_id = json["orderId"].as_i64().unwrap();

    let (status, _) = request(&app, "DELETE", &format!("/orders/{order_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = request(&app, "GET", &format!("/orders/{order_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = request(&app, "DELETE", &format!("/orders/{order_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_metrics_endpoint_renders() {
    let app = setup().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
