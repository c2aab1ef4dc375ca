//! HTTP services for the user sync pipeline.
//!
//! Two routers, one per process:
//! - the user service: writes to the authoritative store and publishes
//!   a change event per mutation
//! - the notification service: serves the projection kept up to date by
//!   the subscriber
//!
//! Both carry structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod telemetry;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use event_bus::EventBus;
use metrics_exporter_prometheus::PrometheusHandle;
use projections::ProjectionStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use user_store::UserStore;

use routes::notifications::NotificationAppState;
use routes::users::UserAppState;

/// Creates the user service router with all routes and shared state.
pub fn create_user_app<S: UserStore + 'static, B: EventBus + 'static>(
    state: Arc<UserAppState<S, B>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    Router::new()
        .route("/health", get(routes::health::user_service))
        .route(
            "/users",
            get(routes::users::list::<S, B>).post(routes::users::create::<S, B>),
        )
        .route(
            "/users/{id}",
            get(routes::users::get::<S, B>).put(routes::users::update::<S, B>),
        )
        .with_state(state)
        .merge(metrics_router(metrics_handle))
        .layer(cors())
        .layer(TraceLayer::new_for_http())
}

/// Creates the notification service router.
pub fn create_notification_app<P: ProjectionStore + 'static>(
    state: Arc<NotificationAppState<P>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    Router::new()
        .route("/health", get(routes::health::notification_service))
        .route("/notifications", get(routes::notifications::list::<P>))
        .route(
            "/notifications/user/{id}",
            get(routes::notifications::get_for_user::<P>),
        )
        .with_state(state)
        .merge(metrics_router(metrics_handle))
        .layer(cors())
        .layer(TraceLayer::new_for_http())
}

fn metrics_router(handle: PrometheusHandle) -> Router {
    Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(handle)
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}
