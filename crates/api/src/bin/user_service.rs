//! User service entry point: authoritative writes plus change events.

use std::sync::Arc;
use std::time::Duration;

use api::config::UserServiceConfig;
use api::routes::users::UserAppState;
use api::telemetry::{init_tracing, install_metrics_recorder, shutdown_signal};
use domain::UserService;
use event_bus::KafkaEventBus;
use sqlx::postgres::PgPoolOptions;
use user_store::PostgresUserStore;

#[tokio::main]
async fn main() {
    let config = UserServiceConfig::from_env().expect("invalid configuration");

    // 1. Initialize tracing
    init_tracing(&config.log_level);

    // 2. Install Prometheus metrics recorder
    let metrics_handle = install_metrics_recorder().expect("failed to install Prometheus recorder");

    // 3. Connect the authoritative store and bring its schema up to date
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url())
        .await
        .expect("failed to connect to PostgreSQL");
    let store = PostgresUserStore::new(pool);
    store.run_migrations().await.expect("migrations failed");
    tracing::info!(host = %config.postgres_host, db = %config.postgres_db, "connected to user store");

    // 4. Create the bus producer
    let bus = KafkaEventBus::builder()
        .brokers(config.kafka_brokers.as_str())
        .message_timeout(Duration::from_millis(config.kafka_message_timeout_ms))
        .build()
        .expect("failed to create event bus");
    let user_service = UserService::with_policy(store, bus, config.publish_policy);
    tracing::info!(
        brokers = %config.kafka_brokers,
        policy = %user_service.policy(),
        "event bus ready"
    );

    // 5. Build the application
    let state = Arc::new(UserAppState { user_service });
    let app = api::create_user_app(state, metrics_handle);

    // 6. Start server
    let addr = config.addr();
    tracing::info!(%addr, "starting user service");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("user service shut down gracefully");
}
