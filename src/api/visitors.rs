//! Visitor registry endpoints (front desk).

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::validate_id;
use super::{ApiError, ApiResponse, AppState, DocumentTypeDto};
use crate::db::{VisitorFields, VisitorRecord};
use crate::domain::{ActorContext, DocumentType, VisitorId};
use crate::services::VisitorError;

impl From<VisitorError> for ApiError {
    fn from(err: VisitorError) -> Self {
        match err {
            VisitorError::Forbidden(denied) => Self::from(denied),
            VisitorError::Validation(msg) => Self::validation(msg),
            VisitorError::NotFound(id) => Self::not_found("Visitor", id),
            VisitorError::Conflict(msg) => Self::Conflict(msg),
            VisitorError::Database(msg) => Self::DatabaseError(msg),
            VisitorError::Internal(msg) => Self::internal(msg),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default, alias = "buscar")]
    pub search: Option<String>,
}

fn visitor_id(id: i32) -> Result<VisitorId, ApiError> {
    validate_id("visitor", id).map(VisitorId::new)
}

/// GET /visitantes/registrar/
/// Document types the registration form offers.
pub async fn document_types(
    Extension(actor): Extension<ActorContext>,
) -> Result<Json<ApiResponse<Vec<DocumentTypeDto>>>, ApiError> {
    actor.require(crate::domain::Capability::FrontDesk)?;

    let types = DocumentType::ALL
        .iter()
        .map(|t| DocumentTypeDto {
            code: t.code(),
            label: t.label(),
        })
        .collect();

    Ok(Json(ApiResponse::success(types)))
}

/// POST /visitantes/registrar/
pub async fn create_visitor(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<ActorContext>,
    Json(payload): Json<VisitorFields>,
) -> Result<Json<ApiResponse<VisitorRecord>>, ApiError> {
    let visitor = state.visitor_service().create(&actor, payload).await?;
    Ok(Json(ApiResponse::success(visitor)))
}

/// GET /visitantes/listar/?buscar=
pub async fn list_visitors(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<ActorContext>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<Vec<VisitorRecord>>>, ApiError> {
    let visitors = state
        .visitor_service()
        .list(&actor, query.search.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(visitors)))
}

/// GET /visitantes/{id}/editar/
pub async fn get_visitor(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<VisitorRecord>>, ApiError> {
    let visitor = state.visitor_service().get(&actor, visitor_id(id)?).await?;
    Ok(Json(ApiResponse::success(visitor)))
}

/// POST /visitantes/{id}/editar/
pub async fn update_visitor(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<i32>,
    Json(payload): Json<VisitorFields>,
) -> Result<Json<ApiResponse<VisitorRecord>>, ApiError> {
    let visitor = state
        .visitor_service()
        .update(&actor, visitor_id(id)?, payload)
        .await?;
    Ok(Json(ApiResponse::success(visitor)))
}
