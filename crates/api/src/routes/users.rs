//! User endpoints backed by the authoritative store.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::UserId;
use domain::UserService;
use event_bus::EventBus;
use serde::Deserialize;
use std::sync::Arc;
use user_store::{UserRecord, UserStore};

use crate::error::ApiError;

/// Shared user service state accessible from all handlers.
pub struct UserAppState<S: UserStore, B: EventBus> {
    pub user_service: UserService<S, B>,
}

/// Body of both create and update.
#[derive(Debug, Deserialize)]
pub struct UserRequest {
    pub name: String,
    pub email: String,
}

/// POST /users — insert a user and announce it.
#[tracing::instrument(skip_all)]
pub async fn create<S: UserStore + 'static, B: EventBus + 'static>(
    State(state): State<Arc<UserAppState<S, B>>>,
    body: Result<Json<UserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserRecord>), ApiError> {
    let Json(req) = body?;
    let user = state.user_service.create_user(&req.name, &req.email).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /users — all users by ascending id.
#[tracing::instrument(skip_all)]
pub async fn list<S: UserStore + 'static, B: EventBus + 'static>(
    State(state): State<Arc<UserAppState<S, B>>>,
) -> Result<Json<Vec<UserRecord>>, ApiError> {
    Ok(Json(state.user_service.list_users().await?))
}

/// GET /users/:id
#[tracing::instrument(skip(state))]
pub async fn get<S: UserStore + 'static, B: EventBus + 'static>(
    State(state): State<Arc<UserAppState<S, B>>>,
    Path(id): Path<String>,
) -> Result<Json<UserRecord>, ApiError> {
    let id: UserId = id.parse()?;
    Ok(Json(state.user_service.get_user(id).await?))
}

/// PUT /users/:id — overwrite name and email of an existing user.
#[tracing::instrument(skip(state, body))]
pub async fn update<S: UserStore + 'static, B: EventBus + 'static>(
    State(state): State<Arc<UserAppState<S, B>>>,
    Path(id): Path<String>,
    body: Result<Json<UserRequest>, JsonRejection>,
) -> Result<Json<UserRecord>, ApiError> {
    let id: UserId = id.parse()?;
    let Json(req) = body?;
    let user = state
        .user_service
        .update_user(id, &req.name, &req.email)
        .await?;
    Ok(Json(user))
}
