//! Notification service entry point: keeps the read replica in sync and serves it.

use std::sync::Arc;

use api::config::NotificationServiceConfig;
use api::routes::notifications::NotificationAppState;
use api::telemetry::{init_tracing, install_metrics_recorder, shutdown_signal};
use event_bus::KafkaEventBus;
use projections::{PostgresProjectionStore, ProjectionSubscriber, UserProjector};

#[tokio::main]
async fn main() {
    let config = NotificationServiceConfig::from_env().expect("invalid configuration");

    // 1. Initialize tracing
    init_tracing(&config.log_level);

    // 2. Install Prometheus metrics recorder
    let metrics_handle = install_metrics_recorder().expect("failed to install Prometheus recorder");

    // 3. Connect the projection store (its own database)
    let store = PostgresProjectionStore::connect(&config.database_url, config.table.as_str())
        .await
        .expect("failed to connect to projection database");
    store
        .ensure_schema()
        .await
        .expect("failed to create projection table");
    tracing::info!(table = %config.table, "connected to projection store");

    // 4. Subscribe to user events
    let bus = KafkaEventBus::builder()
        .brokers(config.kafka_brokers.as_str())
        .consumer_group(config.consumer_group.as_str())
        .auto_offset_reset(config.auto_offset_reset.as_str())
        .buffer_size(config.buffer_size)
        .build()
        .expect("failed to create event bus");
    let projector = Arc::new(UserProjector::new(store));
    let subscriber_task = ProjectionSubscriber::new(Arc::clone(&projector))
        .start(&bus)
        .await
        .expect("failed to subscribe to user events");

    // 5. Build the application
    let state = Arc::new(NotificationAppState { projector });
    let app = api::create_notification_app(state, metrics_handle);

    // 6. Start server
    let addr = config.addr();
    tracing::info!(%addr, "starting notification service");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    subscriber_task.abort();
    tracing::info!("notification service shut down gracefully");
}
