//! Domain service for the entry/exit log.
//!
//! A visitor is either outside (no open visit) or inside (exactly one visit
//! without an exit time). Checking in opens a visit, checking out closes the
//! most recent open one.

use thiserror::Error;

use crate::db::{VisitEvent, VisitRow, VisitorRecord};
use crate::domain::{AccessDenied, ActorContext, VisitorId};

/// Errors specific to entry/exit operations.
#[derive(Debug, Error)]
pub enum VisitError {
    #[error(transparent)]
    Forbidden(#[from] AccessDenied),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Visitor not found: {0}")]
    VisitorNotFound(VisitorId),

    #[error("Visitor {0} is already inside the building")]
    AlreadyInside(VisitorId),

    #[error("No open entry for visitor {0}")]
    NoOpenEntry(VisitorId),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for VisitError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for VisitError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Domain service trait for the entry/exit log.
#[async_trait::async_trait]
pub trait VisitService: Send + Sync {
    /// Opens a visit for `visitor_id`, recorded by `actor`.
    ///
    /// # Errors
    ///
    /// - [`VisitError::VisitorNotFound`] if the visitor does not exist
    /// - [`VisitError::AlreadyInside`] if the visitor already has an open visit
    async fn check_in(
        &self,
        actor: &ActorContext,
        visitor_id: VisitorId,
        notes: &str,
    ) -> Result<VisitEvent, VisitError>;

    /// Closes the most recent open visit of `visitor_id`, appending `notes`.
    ///
    /// # Errors
    ///
    /// - [`VisitError::VisitorNotFound`] if the visitor does not exist
    /// - [`VisitError::NoOpenEntry`] if the visitor is not inside
    async fn check_out(
        &self,
        actor: &ActorContext,
        visitor_id: VisitorId,
        notes: &str,
    ) -> Result<VisitEvent, VisitError>;

    async fn is_inside(&self, actor: &ActorContext, visitor_id: VisitorId)
    -> Result<bool, VisitError>;

    /// The `limit` most recent visits, newest entry first.
    async fn list_recent(&self, actor: &ActorContext, limit: u64)
    -> Result<Vec<VisitRow>, VisitError>;

    /// Visitors currently inside; candidates for checking out.
    async fn list_inside(&self, actor: &ActorContext) -> Result<Vec<VisitorRecord>, VisitError>;

    /// Visitors currently outside; candidates for checking in.
    async fn list_outside(&self, actor: &ActorContext) -> Result<Vec<VisitorRecord>, VisitError>;
}
