//! HTTP API for the storefront checkout service.
//!
//! Exposes checkout, customer order management and the admin dashboard
//! (orders, catalogue, notifications and a live event stream), with
//! structured logging (tracing) and Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use checkout::{
    Catalog, CheckoutOrchestrator, Notifier, OrderLifecycle, ReservationEngine,
    SimulatedPaymentGateway,
};
use metrics_exporter_prometheus::PrometheusHandle;
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::{Config, PaymentSimulation};
use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    let admin = Router::new()
        .route("/orders", get(routes::admin::list_orders::<S>))
        .route(
            "/orders/{id}",
            axum::routing::delete(routes::admin::delete_order::<S>),
        )
        .route("/orders/{id}/status", put(routes::admin::update_status::<S>))
        .route("/orders/{id}/cancel", post(routes::admin::cancel_order::<S>))
        .route("/products", put(routes::admin::upsert_product::<S>))
        .route("/products/{id}/restock", put(routes::admin::restock::<S>))
        .route("/notifications", get(routes::admin::notifications::<S>))
        .route("/notifications/{id}/read", put(routes::admin::mark_read::<S>))
        .route("/events", get(routes::events::stream::<S>));

    Router::new()
        .route("/health", get(routes::health::check::<S>))
        .route("/checkout", post(routes::checkout::place::<S>))
        .route("/checkout/restore", post(routes::checkout::restore::<S>))
        .route("/orders/mine", get(routes::orders::mine::<S>))
        .route("/orders/mine/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}/cancel", post(routes::orders::cancel::<S>))
        .route("/orders/{id}/address", put(routes::orders::update_address::<S>))
        .route("/products/{id}", get(routes::products::get::<S>))
        .nest("/admin", admin)
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Wires the checkout services over `store` using the given configuration.
pub fn create_state<S: Store + Clone + 'static>(store: S, config: &Config) -> Arc<AppState<S>> {
    let payment = match config.payment_simulation {
        PaymentSimulation::Approve => SimulatedPaymentGateway::new(),
        PaymentSimulation::Decline => SimulatedPaymentGateway::declining(),
    };
    create_state_with_payment(store, config, payment)
}

/// Like [`create_state`] but with a caller-supplied payment gateway.
pub fn create_state_with_payment<S: Store + Clone + 'static>(
    store: S,
    config: &Config,
    payment: SimulatedPaymentGateway,
) -> Arc<AppState<S>> {
    let policy = config.pricing_policy();
    let notifier = Notifier::new(store.clone(), config.event_channel_capacity);
    let engine = ReservationEngine::new(store.clone(), notifier.clone(), policy);

    Arc::new(AppState {
        orchestrator: CheckoutOrchestrator::new(store.clone(), notifier.clone(), payment, policy),
        lifecycle: OrderLifecycle::new(store.clone(), engine, notifier.clone()),
        catalog: Catalog::new(store.clone(), notifier.clone()),
        notifier,
        store,
    })
}
