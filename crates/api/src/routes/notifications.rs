//! Read-only endpoints over the notification projection.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::UserId;
use projections::{ProjectionStore, UserNotification, UserProjector};

use crate::error::ApiError;

/// Notification service state. The projector is shared with the
/// subscriber task, so reads see what the subscriber wrote.
pub struct NotificationAppState<P: ProjectionStore> {
    pub projector: Arc<UserProjector<P>>,
}

/// GET /notifications
#[tracing::instrument(skip_all)]
pub async fn list<P: ProjectionStore + 'static>(
    State(state): State<Arc<NotificationAppState<P>>>,
) -> Result<Json<Vec<UserNotification>>, ApiError> {
    Ok(Json(state.projector.store().list().await?))
}

/// GET /notifications/user/:id
#[tracing::instrument(skip(state))]
pub async fn get_for_user<P: ProjectionStore + 'static>(
    State(state): State<Arc<NotificationAppState<P>>>,
    Path(id): Path<String>,
) -> Result<Json<UserNotification>, ApiError> {
    let user_id: UserId = id.parse()?;
    state
        .projector
        .store()
        .get(user_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Notification not found for user {user_id}")))
}
