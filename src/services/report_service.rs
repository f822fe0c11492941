//! Domain service for visit reports.
//!
//! Reports are read-only views over the entry/exit log, filtered by whole
//! UTC days of the entry time and optionally by visitor. The CSV export
//! carries the same rows as the tabular query.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::io::Write;
use thiserror::Error;

use crate::domain::form::empty_as_none;
use crate::constants::report::CSV_HEADER;
use crate::db::{Store, VisitQuery, VisitRow, clock};
use crate::domain::{AccessDenied, ActorContext, Capability, VisitorId};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Forbidden(#[from] AccessDenied),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for ReportError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<csv::Error> for ReportError {
    fn from(err: csv::Error) -> Self {
        Self::Internal(format!("CSV error: {err}"))
    }
}

/// Report filter; every bound is optional and both dates are inclusive.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportFilter {
    #[serde(default, alias = "fecha_inicio", deserialize_with = "empty_as_none")]
    pub date_from: Option<NaiveDate>,
    #[serde(default, alias = "fecha_fin", deserialize_with = "empty_as_none")]
    pub date_to: Option<NaiveDate>,
    #[serde(default, alias = "visitante", deserialize_with = "empty_as_none")]
    pub visitor_id: Option<VisitorId>,
}

impl ReportFilter {
    /// Translates the day bounds into entry-time bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Validation`] when `date_from` is after `date_to`.
    pub fn to_query(&self) -> Result<VisitQuery, ReportError> {
        if let (Some(from), Some(to)) = (self.date_from, self.date_to)
            && from > to
        {
            return Err(ReportError::Validation(format!(
                "date_from ({from}) must not be after date_to ({to})"
            )));
        }

        Ok(VisitQuery {
            entered_from: self.date_from.map(clock::start_of_day),
            entered_before: self.date_to.map(clock::start_of_next_day),
            visitor_id: self.visitor_id,
        })
    }
}

/// Writes `rows` as CSV with the report header; an open visit has an empty exit column.
pub fn write_csv<W: Write>(rows: &[VisitRow], out: W) -> Result<(), ReportError> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(CSV_HEADER)?;

    for row in rows {
        writer.write_record([
            row.visitor.name.as_str(),
            row.visitor.document.as_str(),
            row.event.entered_at.as_str(),
            row.event.exited_at.as_deref().unwrap_or(""),
            row.visitor.visit_purpose.as_str(),
        ])?;
    }

    writer
        .flush()
        .map_err(|e| ReportError::Internal(format!("Failed to write CSV: {e}")))
}

#[async_trait]
pub trait ReportService: Send + Sync {
    /// Visits matching `filter`, newest entry first, joined with their visitor.
    async fn query(
        &self,
        actor: &ActorContext,
        filter: &ReportFilter,
    ) -> Result<Vec<VisitRow>, ReportError>;

    /// The rows of [`ReportService::query`] rendered as UTF-8 CSV.
    async fn export_csv(
        &self,
        actor: &ActorContext,
        filter: &ReportFilter,
    ) -> Result<Vec<u8>, ReportError>;
}

pub struct SeaOrmReportService {
    store: Store,
}

impl SeaOrmReportService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ReportService for SeaOrmReportService {
    async fn query(
        &self,
        actor: &ActorContext,
        filter: &ReportFilter,
    ) -> Result<Vec<VisitRow>, ReportError> {
        actor.require(Capability::FrontDesk)?;
        let query = filter.to_query()?;
        Ok(self.store.visits().query(&query).await?)
    }

    async fn export_csv(
        &self,
        actor: &ActorContext,
        filter: &ReportFilter,
    ) -> Result<Vec<u8>, ReportError> {
        let rows = self.query(actor, filter).await?;

        let mut buffer = Vec::new();
        write_csv(&rows, &mut buffer)?;

        tracing::info!(
            actor_id = %actor.id,
            rows = rows.len(),
            bytes = buffer.len(),
            "Report exported"
        );

        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{VisitEvent, VisitorRecord};
    use crate::domain::{DocumentType, VisitEventId};

    fn row(name: &str, exited_at: Option<&str>) -> VisitRow {
        VisitRow {
            event: VisitEvent {
                id: VisitEventId::new(1),
                visitor_id: VisitorId::new(1),
                entered_at: "2026-03-01T08:00:00.000000Z".to_string(),
                exited_at: exited_at.map(str::to_string),
                notes: String::new(),
                recorded_by: None,
            },
            visitor: VisitorRecord {
                id: VisitorId::new(1),
                name: name.to_string(),
                document_type: DocumentType::NationalId,
                document: "CC-123".to_string(),
                email: String::new(),
                phone: String::new(),
                visit_purpose: "Reunión, piso 3".to_string(),
                unit_visited: "301".to_string(),
                host_name: "Luis".to_string(),
                notes: String::new(),
                registered_at: "2026-03-01T07:59:00.000000Z".to_string(),
                updated_at: "2026-03-01T07:59:00.000000Z".to_string(),
            },
        }
    }

    #[test]
    fn filter_bounds_cover_whole_days() {
        let filter = ReportFilter {
            date_from: NaiveDate::from_ymd_opt(2026, 3, 1),
            date_to: NaiveDate::from_ymd_opt(2026, 3, 1),
            visitor_id: None,
        };
        let query = filter.to_query().unwrap();
        assert_eq!(query.entered_from.as_deref(), Some("2026-03-01T00:00:00.000000Z"));
        assert_eq!(query.entered_before.as_deref(), Some("2026-03-02T00:00:00.000000Z"));
    }

    #[test]
    fn reversed_range_is_invalid() {
        let filter = ReportFilter {
            date_from: NaiveDate::from_ymd_opt(2026, 3, 2),
            date_to: NaiveDate::from_ymd_opt(2026, 3, 1),
            visitor_id: None,
        };
        assert!(matches!(filter.to_query(), Err(ReportError::Validation(_))));
    }

    #[test]
    fn filter_accepts_form_names() {
        let filter: ReportFilter =
            serde_json::from_str(r#"{"fecha_inicio": "2026-03-01", "fecha_fin": "", "visitante": "7"}"#)
                .unwrap();
        assert_eq!(filter.date_from, NaiveDate::from_ymd_opt(2026, 3, 1));
        assert_eq!(filter.date_to, None);
        assert_eq!(filter.visitor_id, Some(VisitorId::new(7)));
    }

    #[test]
    fn csv_quotes_and_blank_exit() {
        let rows = vec![
            row("Ana", None),
            row("Pérez, \"Beto\"", Some("2026-03-01T09:00:00.000000Z")),
        ];
        let mut out = Vec::new();
        write_csv(&rows, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Visitante,Documento,Entrada,Salida,Motivo"));
        assert_eq!(
            lines.next(),
            Some("Ana,CC-123,2026-03-01T08:00:00.000000Z,,\"Reunión, piso 3\"")
        );
        assert_eq!(
            lines.next(),
            Some(
                "\"Pérez, \"\"Beto\"\"\",CC-123,2026-03-01T08:00:00.000000Z,2026-03-01T09:00:00.000000Z,\"Reunión, piso 3\""
            )
        );
    }
}
