//! Audit trail: append-only record of administrative actions.
//!
//! Writers call [`record`] with whatever connection or transaction the
//! primary change runs on. Reading the trail is reserved to administrators.

use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::{ConnectionTrait, DbErr};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::form::empty_as_none;
use crate::constants::limits::{DEFAULT_AUDIT_PAGE_SIZE, MAX_AUDIT_PAGE_SIZE};
use crate::db::{AuditEntry, AuditQuery, AuditRepository, NewAuditEntry, Store, clock};
use crate::domain::{AccessDenied, ActorContext, ActorId, AuditAction, Capability};

/// Appends `entry` on `conn`.
pub async fn record<C: ConnectionTrait>(conn: &C, entry: NewAuditEntry) -> Result<AuditEntry, DbErr> {
    let action = entry.action;
    let saved = AuditRepository::new(conn).add(entry).await?;

    tracing::debug!(
        audit_id = saved.id,
        action = %action,
        entity_type = %saved.entity_type,
        entity_id = saved.entity_id,
        "Audit entry recorded"
    );
    metrics::counter!("audit_entries_total", "action" => action.as_str()).increment(1);

    Ok(saved)
}

#[derive(Debug, Error)]
pub enum AuditError {
    #[error(transparent)]
    Forbidden(#[from] AccessDenied),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<DbErr> for AuditError {
    fn from(err: DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

/// Filter accepted from administrators; both dates are whole UTC days.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditFilter {
    #[serde(default, alias = "usuario", deserialize_with = "empty_as_none")]
    pub actor_id: Option<ActorId>,
    #[serde(default, alias = "accion", deserialize_with = "empty_as_none")]
    pub action: Option<AuditAction>,
    #[serde(default, alias = "fecha_inicio", deserialize_with = "empty_as_none")]
    pub date_from: Option<NaiveDate>,
    #[serde(default, alias = "fecha_fin", deserialize_with = "empty_as_none")]
    pub date_to: Option<NaiveDate>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub page: Option<u64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub page_size: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditPage {
    pub entries: Vec<AuditEntry>,
    pub page: u64,
    pub total_pages: u64,
}

#[async_trait]
pub trait AuditService: Send + Sync {
    /// Entries matching `filter`, newest first.
    async fn query(&self, actor: &ActorContext, filter: AuditFilter) -> Result<AuditPage, AuditError>;
}

pub struct SeaOrmAuditService {
    store: Store,
}

impl SeaOrmAuditService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    fn to_query(filter: &AuditFilter) -> Result<AuditQuery, AuditError> {
        if let (Some(from), Some(to)) = (filter.date_from, filter.date_to)
            && from > to
        {
            return Err(AuditError::Validation(
                "date_from must not be after date_to".to_string(),
            ));
        }

        let page_size = filter.page_size.unwrap_or(DEFAULT_AUDIT_PAGE_SIZE);
        if !(1..=MAX_AUDIT_PAGE_SIZE).contains(&page_size) {
            return Err(AuditError::Validation(format!(
                "Invalid page size: {page_size}. Must be between 1 and {MAX_AUDIT_PAGE_SIZE}"
            )));
        }

        Ok(AuditQuery {
            actor_id: filter.actor_id,
            action: filter.action,
            from: filter.date_from.map(clock::start_of_day),
            before: filter.date_to.map(clock::start_of_next_day),
            page: filter.page.unwrap_or(1).max(1),
            page_size,
        })
    }
}

#[async_trait]
impl AuditService for SeaOrmAuditService {
    async fn query(&self, actor: &ActorContext, filter: AuditFilter) -> Result<AuditPage, AuditError> {
        actor.require(Capability::Administration)?;

        let query = Self::to_query(&filter)?;
        let (entries, total_pages) = self.store.audit().query(&query).await?;

        Ok(AuditPage {
            entries,
            page: query.page,
            total_pages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reversed_dates_are_rejected() {
        let filter = AuditFilter {
            date_from: NaiveDate::from_ymd_opt(2026, 3, 2),
            date_to: NaiveDate::from_ymd_opt(2026, 3, 1),
            ..Default::default()
        };
        assert!(matches!(
            SeaOrmAuditService::to_query(&filter),
            Err(AuditError::Validation(_))
        ));
    }

    #[test]
    fn date_to_covers_the_whole_day() {
        let filter = AuditFilter {
            date_to: NaiveDate::from_ymd_opt(2026, 3, 1),
            ..Default::default()
        };
        let query = SeaOrmAuditService::to_query(&filter).unwrap();
        assert_eq!(query.before.as_deref(), Some("2026-03-02T00:00:00.000000Z"));
        assert_eq!(query.page, 1);
        assert_eq!(query.page_size, DEFAULT_AUDIT_PAGE_SIZE);
    }
}
