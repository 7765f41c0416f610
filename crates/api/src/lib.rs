//! HTTP API server for the orders system.
//!
//! Exposes the order repository over REST with structured logging
//! (tracing), Prometheus metrics, CORS, and a per-request timeout.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::OrderRepository;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<R: OrderRepository + 'static>(
    state: Arc<AppState<R>>,
    metrics_handle: PrometheusHandle,
    request_timeout: Duration,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/orders",
            get(routes::orders::list::<R>).post(routes::orders::create::<R>),
        )
        .route(
            "/orders/{id}",
            get(routes::orders::get::<R>)
                .put(routes::orders::update::<R>)
                .delete(routes::orders::remove::<R>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
}

/// Creates the application state over the given repository.
pub fn create_state<R: OrderRepository>(repository: R) -> Arc<AppState<R>> {
    Arc::new(AppState { repository })
}
