use axum::{Extension, Json, extract::State};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::domain::ActorContext;
use crate::services::{DashboardError, DashboardStats};

impl From<DashboardError> for ApiError {
    fn from(err: DashboardError) -> Self {
        match err {
            DashboardError::Database(msg) => Self::DatabaseError(msg),
        }
    }
}

/// GET /dashboard/
/// Open to every signed-in account, whatever its role.
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<ActorContext>,
) -> Result<Json<ApiResponse<DashboardStats>>, ApiError> {
    let stats = state.dashboard_service().stats(&actor).await?;
    Ok(Json(ApiResponse::success(stats)))
}
