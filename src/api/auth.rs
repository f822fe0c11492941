use axum::{
    Extension, Json,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, ApiResponse, AppState, ClientAddress, MessageResponse};
use crate::db::User;
use crate::domain::{ActorContext, ActorId};

/// Session key holding the signed-in account id.
pub const SESSION_ACTOR_KEY: &str = "actor_id";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct SessionStatus {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

// ============================================================================
// Middleware
// ============================================================================

/// Resolves the session into an [`ActorContext`] for the handlers behind it.
///
/// Sessions that point at a deleted or deactivated account are flushed.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(actor_id) = session.get::<ActorId>(SESSION_ACTOR_KEY).await? else {
        return Err(ApiError::unauthorized("Authentication required"));
    };

    let Some(user) = state.user_service().session_account(actor_id).await? else {
        session.flush().await?;
        return Err(ApiError::unauthorized("Session is no longer valid"));
    };

    tracing::Span::current().record("user_id", user.id.value());

    let source_address = request
        .extensions()
        .get::<ClientAddress>()
        .and_then(|address| address.0.clone());

    request.extensions_mut().insert(ActorContext::new(
        user.id,
        user.username,
        user.role,
        source_address,
    ));

    Ok(next.run(request).await)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /
pub async fn session_status(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<SessionStatus>>, ApiError> {
    let user = match session.get::<ActorId>(SESSION_ACTOR_KEY).await? {
        Some(actor_id) => state.user_service().session_account(actor_id).await?,
        None => None,
    };

    Ok(Json(ApiResponse::success(SessionStatus {
        authenticated: user.is_some(),
        user,
    })))
}

/// POST /
/// The LOGIN audit entry is written before the session exists.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Extension(client): Extension<ClientAddress>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let user = state
        .user_service()
        .login(&payload.username, &payload.password, client.0)
        .await?;

    session.cycle_id().await?;
    session.insert(SESSION_ACTOR_KEY, user.id).await?;

    Ok(Json(ApiResponse::success(user)))
}

/// GET /logout/
/// The LOGOUT audit entry is written before the session is destroyed.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<ActorContext>,
    session: Session,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.user_service().logout(&actor).await?;
    session.flush().await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Sesión cerrada correctamente",
    ))))
}
