use axum::{
    Extension, Json,
    extract::{Query, State},
};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::domain::ActorContext;
use crate::services::{AuditError, AuditFilter, AuditPage};

impl From<AuditError> for ApiError {
    fn from(err: AuditError) -> Self {
        match err {
            AuditError::Forbidden(denied) => Self::from(denied),
            AuditError::Validation(msg) => Self::validation(msg),
            AuditError::Database(msg) => Self::DatabaseError(msg),
        }
    }
}

/// GET /auditoria/
pub async fn list_audit_entries(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<ActorContext>,
    Query(filter): Query<AuditFilter>,
) -> Result<Json<ApiResponse<AuditPage>>, ApiError> {
    let page = state.audit_service().query(&actor, filter).await?;
    Ok(Json(ApiResponse::success(page)))
}
