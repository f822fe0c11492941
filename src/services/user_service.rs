//! Domain service for staff accounts and authentication.
//!
//! Account creation, edits, deletion, login and logout each leave exactly one
//! entry in the audit trail. For account mutations the entry is written in the
//! same transaction as the change itself.

use serde::Deserialize;
use thiserror::Error;

use crate::db::User;
use crate::domain::{AccessDenied, ActorContext, ActorId, Role};

/// Errors specific to account operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Forbidden(#[from] AccessDenied),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("User not found: {0}")]
    NotFound(ActorId),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        crate::db::unique_violation(&err).map_or_else(
            || Self::Database(err.to_string()),
            |_| Self::Conflict("Username or document number already in use".to_string()),
        )
    }
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    #[serde(alias = "password_confirm")]
    pub password_confirmation: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(alias = "rol")]
    pub role: Role,
    #[serde(default, alias = "telefono")]
    pub phone: String,
    #[serde(default, alias = "documento")]
    pub document: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(alias = "rol")]
    pub role: Role,
    #[serde(default, alias = "telefono")]
    pub phone: String,
    pub is_active: bool,
}

/// Domain service trait for staff accounts.
#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    /// Creates an account.
    ///
    /// # Errors
    ///
    /// - [`UserError::Validation`] for a blank username, a short or unconfirmed password
    /// - [`UserError::Conflict`] if the username or document number is taken
    async fn create(&self, actor: &ActorContext, request: CreateUserRequest)
    -> Result<User, UserError>;

    async fn list(&self, actor: &ActorContext) -> Result<Vec<User>, UserError>;

    async fn get(&self, actor: &ActorContext, id: ActorId) -> Result<User, UserError>;

    async fn update(
        &self,
        actor: &ActorContext,
        id: ActorId,
        request: UpdateUserRequest,
    ) -> Result<User, UserError>;

    /// Deletes an account and returns it as it was.
    ///
    /// Visits it recorded and audit entries it authored are kept, detached
    /// from the account.
    async fn delete(&self, actor: &ActorContext, id: ActorId) -> Result<User, UserError>;

    /// Verifies credentials.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::InvalidCredentials`] for an unknown username, a
    /// wrong password and an inactive account alike.
    async fn login(
        &self,
        username: &str,
        password: &str,
        source_address: Option<String>,
    ) -> Result<User, UserError>;

    async fn logout(&self, actor: &ActorContext) -> Result<(), UserError>;

    /// Loads the account behind a session; `None` when it is gone or inactive.
    async fn session_account(&self, id: ActorId) -> Result<Option<User>, UserError>;
}
