//! Account management endpoints (administrators only).

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::validation::validate_id;
use super::{ApiError, ApiResponse, AppState};
use crate::db::User;
use crate::domain::{ActorContext, ActorId};
use crate::services::{CreateUserRequest, UpdateUserRequest, UserError};

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::Forbidden(denied) => Self::from(denied),
            UserError::InvalidCredentials => Self::unauthorized("Usuario o contraseña incorrectos"),
            UserError::Validation(msg) => Self::validation(msg),
            UserError::NotFound(id) => Self::not_found("User", id),
            UserError::Conflict(msg) => Self::Conflict(msg),
            UserError::Database(msg) => Self::DatabaseError(msg),
            UserError::Internal(msg) => Self::internal(msg),
        }
    }
}

fn user_id(id: i32) -> Result<ActorId, ApiError> {
    validate_id("user", id).map(ActorId::new)
}

/// POST /usuarios/crear/
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<ActorContext>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let user = state.user_service().create(&actor, payload).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// GET /usuarios/listar/
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<ActorContext>,
) -> Result<Json<ApiResponse<Vec<User>>>, ApiError> {
    let users = state.user_service().list(&actor).await?;
    Ok(Json(ApiResponse::success(users)))
}

/// GET /usuarios/{id}/editar/
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let user = state.user_service().get(&actor, user_id(id)?).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// POST /usuarios/{id}/editar/
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let user = state
        .user_service()
        .update(&actor, user_id(id)?, payload)
        .await?;
    Ok(Json(ApiResponse::success(user)))
}

/// GET /usuarios/{id}/eliminar/
/// Returns the account that a following POST would delete.
pub async fn confirm_delete_user(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let user = state.user_service().get(&actor, user_id(id)?).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// POST /usuarios/{id}/eliminar/
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let user = state.user_service().delete(&actor, user_id(id)?).await?;
    Ok(Json(ApiResponse::success(user)))
}
