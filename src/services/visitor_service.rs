//! Domain service for the visitor registry.
//!
//! Visitors are identified by their document number, which is unique across
//! the registry. Records are never deleted through this service.

use thiserror::Error;

use crate::db::{VisitorFields, VisitorRecord};
use crate::domain::{AccessDenied, ActorContext, VisitorId};

/// Errors specific to visitor registry operations.
#[derive(Debug, Error)]
pub enum VisitorError {
    #[error(transparent)]
    Forbidden(#[from] AccessDenied),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Visitor not found: {0}")]
    NotFound(VisitorId),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for VisitorError {
    fn from(err: sea_orm::DbErr) -> Self {
        crate::db::unique_violation(&err).map_or_else(
            || Self::Database(err.to_string()),
            |_| Self::Conflict("A visitor with this document number already exists".to_string()),
        )
    }
}

impl From<anyhow::Error> for VisitorError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Domain service trait for the visitor registry.
#[async_trait::async_trait]
pub trait VisitorService: Send + Sync {
    /// Registers a new visitor.
    ///
    /// # Errors
    ///
    /// - [`VisitorError::Validation`] if a required field is blank or the email is malformed
    /// - [`VisitorError::Conflict`] if the document number is already registered
    async fn create(
        &self,
        actor: &ActorContext,
        fields: VisitorFields,
    ) -> Result<VisitorRecord, VisitorError>;

    /// Lists visitors, newest registration first, optionally filtered by a
    /// substring of the name or document number.
    async fn list(
        &self,
        actor: &ActorContext,
        search: Option<&str>,
    ) -> Result<Vec<VisitorRecord>, VisitorError>;

    async fn get(&self, actor: &ActorContext, id: VisitorId) -> Result<VisitorRecord, VisitorError>;

    /// Replaces the editable fields of a visitor.
    ///
    /// # Errors
    ///
    /// Same rules as [`VisitorService::create`], plus [`VisitorError::NotFound`].
    async fn update(
        &self,
        actor: &ActorContext,
        id: VisitorId,
        fields: VisitorFields,
    ) -> Result<VisitorRecord, VisitorError>;
}
