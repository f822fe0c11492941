//! Report endpoints: the filtered visit table, or the same rows as CSV.

use axum::{
    Extension, Json,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::constants::report::{CSV_CONTENT_TYPE, CSV_FILENAME};
use crate::domain::form::{empty_as_none, flag};
use crate::domain::{ActorContext, VisitorId};
use crate::services::{ReportError, ReportFilter};

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::Forbidden(denied) => Self::from(denied),
            ReportError::Validation(msg) => Self::validation(msg),
            ReportError::Database(msg) => Self::DatabaseError(msg),
            ReportError::Internal(msg) => Self::internal(msg),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportRequest {
    #[serde(default, alias = "fecha_inicio", deserialize_with = "empty_as_none")]
    pub date_from: Option<NaiveDate>,
    #[serde(default, alias = "fecha_fin", deserialize_with = "empty_as_none")]
    pub date_to: Option<NaiveDate>,
    #[serde(default, alias = "visitante", deserialize_with = "empty_as_none")]
    pub visitor_id: Option<VisitorId>,
    #[serde(default, alias = "exportar_csv", deserialize_with = "flag")]
    pub export_csv: bool,
}

impl ReportRequest {
    const fn filter(&self) -> ReportFilter {
        ReportFilter {
            date_from: self.date_from,
            date_to: self.date_to,
            visitor_id: self.visitor_id,
        }
    }
}

async fn render(
    state: &AppState,
    actor: &ActorContext,
    request: &ReportRequest,
) -> Result<Response, ApiError> {
    let filter = request.filter();

    if request.export_csv {
        let body = state.report_service().export_csv(actor, &filter).await?;
        let disposition = format!("attachment; filename=\"{CSV_FILENAME}\"");
        return Ok((
            [
                (header::CONTENT_TYPE, CSV_CONTENT_TYPE.to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            body,
        )
            .into_response());
    }

    let rows = state.report_service().query(actor, &filter).await?;
    Ok(Json(ApiResponse::success(rows)).into_response())
}

/// GET /registros/reporte/
pub async fn report(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<ActorContext>,
    Query(request): Query<ReportRequest>,
) -> Result<Response, ApiError> {
    render(&state, &actor, &request).await
}

/// POST /registros/reporte/
pub async fn report_form(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<ActorContext>,
    Json(request): Json<ReportRequest>,
) -> Result<Response, ApiError> {
    render(&state, &actor, &request).await
}
