//! Entry/exit endpoints (front desk).

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::validation::validate_id;
use super::{ApiError, ApiResponse, AppState};
use crate::constants::limits::DEFAULT_RECENT_VISITS;
use crate::db::{VisitEvent, VisitRow, VisitorRecord};
use crate::domain::{ActorContext, VisitorId};
use crate::services::{ReportFilter, VisitError};

impl From<VisitError> for ApiError {
    fn from(err: VisitError) -> Self {
        match err {
            VisitError::Forbidden(denied) => Self::from(denied),
            VisitError::Validation(msg) => Self::validation(msg),
            VisitError::VisitorNotFound(id) => Self::not_found("Visitor", id),
            err @ VisitError::AlreadyInside(_) => Self::Conflict(err.to_string()),
            err @ VisitError::NoOpenEntry(_) => Self::StateError(err.to_string()),
            VisitError::Database(msg) => Self::DatabaseError(msg),
            VisitError::Internal(msg) => Self::internal(msg),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct VisitRequest {
    #[serde(alias = "visitante")]
    pub visitor_id: VisitorId,
    #[serde(default, alias = "observaciones")]
    pub notes: String,
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    #[serde(default = "default_recent_limit", alias = "limite")]
    pub limit: u64,
}

const fn default_recent_limit() -> u64 {
    DEFAULT_RECENT_VISITS
}

#[derive(Debug, Serialize)]
pub struct PresenceResponse {
    pub visitor_id: VisitorId,
    pub inside: bool,
}

/// GET /registros/entrada/
/// Visitors that can be checked in.
pub async fn check_in_candidates(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<ActorContext>,
) -> Result<Json<ApiResponse<Vec<VisitorRecord>>>, ApiError> {
    let visitors = state.visit_service().list_outside(&actor).await?;
    Ok(Json(ApiResponse::success(visitors)))
}

/// POST /registros/entrada/
pub async fn check_in(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<ActorContext>,
    Json(payload): Json<VisitRequest>,
) -> Result<Json<ApiResponse<VisitEvent>>, ApiError> {
    let event = state
        .visit_service()
        .check_in(&actor, payload.visitor_id, &payload.notes)
        .await?;
    Ok(Json(ApiResponse::success(event)))
}

/// GET /registros/salida/
/// Visitors that can be checked out.
pub async fn check_out_candidates(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<ActorContext>,
) -> Result<Json<ApiResponse<Vec<VisitorRecord>>>, ApiError> {
    let visitors = state.visit_service().list_inside(&actor).await?;
    Ok(Json(ApiResponse::success(visitors)))
}

/// POST /registros/salida/
pub async fn check_out(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<ActorContext>,
    Json(payload): Json<VisitRequest>,
) -> Result<Json<ApiResponse<VisitEvent>>, ApiError> {
    let event = state
        .visit_service()
        .check_out(&actor, payload.visitor_id, &payload.notes)
        .await?;
    Ok(Json(ApiResponse::success(event)))
}

/// GET /registros/consultar/
pub async fn query_visits(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<ActorContext>,
    Query(filter): Query<ReportFilter>,
) -> Result<Json<ApiResponse<Vec<VisitRow>>>, ApiError> {
    let rows = state.report_service().query(&actor, &filter).await?;
    Ok(Json(ApiResponse::success(rows)))
}

/// POST /registros/consultar/
pub async fn query_visits_form(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<ActorContext>,
    Json(filter): Json<ReportFilter>,
) -> Result<Json<ApiResponse<Vec<VisitRow>>>, ApiError> {
    let rows = state.report_service().query(&actor, &filter).await?;
    Ok(Json(ApiResponse::success(rows)))
}

/// GET /registros/recientes/?limite=
pub async fn recent_visits(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<ActorContext>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<ApiResponse<Vec<VisitRow>>>, ApiError> {
    let rows = state.visit_service().list_recent(&actor, query.limit).await?;
    Ok(Json(ApiResponse::success(rows)))
}

/// GET /visitantes/{id}/estado/
pub async fn presence(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<PresenceResponse>>, ApiError> {
    let visitor_id = VisitorId::new(validate_id("visitor", id)?);
    let inside = state.visit_service().is_inside(&actor, visitor_id).await?;
    Ok(Json(ApiResponse::success(PresenceResponse { visitor_id, inside })))
}
