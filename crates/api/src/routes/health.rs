//! Health check endpoint.

use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

/// GET /health for the user service.
pub async fn user_service() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "user-service",
    })
}

/// GET /health for the notification service.
pub async fn notification_service() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "notification-service",
    })
}
