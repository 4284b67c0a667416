//! HTTP API for the book catalog.
//!
//! Exposes catalog commands and cached queries over REST, projection
//! administration, a Server-Sent-Events notification stream, and the usual
//! health and Prometheus endpoints.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use event_store::EventStore;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::{Config, ConfigError, LogFormat};
pub use state::{AppState, CatalogStore};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: EventStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<S>))
        .route(
            "/books",
            post(routes::books::create::<S>).get(routes::books::search::<S>),
        )
        .route(
            "/books/{id}",
            get(routes::books::get::<S>)
                .put(routes::books::update::<S>)
                .delete(routes::books::soft_delete::<S>),
        )
        .route("/books/{id}/restore", post(routes::books::restore::<S>))
        .route(
            "/books/{id}/sale",
            post(routes::books::schedule_sale::<S>).delete(routes::books::cancel_sale::<S>),
        )
        .route("/books/{id}/cover", put(routes::books::update_cover::<S>))
        .route("/books/{id}/events", get(routes::books::events::<S>))
        .route(
            "/authors",
            post(routes::authors::create::<S>).get(routes::authors::list::<S>),
        )
        .route(
            "/authors/{id}",
            get(routes::authors::get::<S>)
                .put(routes::authors::update::<S>)
                .delete(routes::authors::soft_delete::<S>),
        )
        .route("/authors/{id}/restore", post(routes::authors::restore::<S>))
        .route(
            "/publishers",
            post(routes::publishers::create::<S>).get(routes::publishers::list::<S>),
        )
        .route(
            "/publishers/{id}",
            get(routes::publishers::get::<S>)
                .put(routes::publishers::update::<S>)
                .delete(routes::publishers::soft_delete::<S>),
        )
        .route(
            "/publishers/{id}/restore",
            post(routes::publishers::restore::<S>),
        )
        .route(
            "/categories",
            post(routes::categories::create::<S>).get(routes::categories::list::<S>),
        )
        .route(
            "/categories/{id}",
            get(routes::categories::get::<S>)
                .put(routes::categories::update::<S>)
                .delete(routes::categories::soft_delete::<S>),
        )
        .route(
            "/categories/{id}/restore",
            post(routes::categories::restore::<S>),
        )
        .route("/statistics/{kind}/{id}", get(routes::statistics::get::<S>))
        .route(
            "/admin/projections/rebuild",
            post(routes::admin::rebuild::<S>),
        )
        .route("/notifications", get(routes::notifications::stream::<S>))
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
