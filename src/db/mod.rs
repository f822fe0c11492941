use anyhow::{Context, Result};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DatabaseTransaction, DbErr,
    SqlErr, Statement, TransactionTrait,
};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::{BootstrapConfig, SecurityConfig};
use crate::domain::{ActorId, AuditAction, EntityKind, Role};

pub mod clock;
pub mod migrator;
pub mod repositories;

pub use crate::entities::audit_entries::Model as AuditEntry;
pub use repositories::audit::{AuditQuery, AuditRepository, NewAuditEntry};
pub use repositories::user::{NewUser, User, UserChanges, UserRepository};
pub use repositories::visit::{VisitEvent, VisitQuery, VisitRepository, VisitRow};
pub use repositories::visitor::{VisitorFields, VisitorRecord, VisitorRepository};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");

        if !in_memory {
            let path_str = db_url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)
                    .with_context(|| format!("Failed to create database file: {path_str}"))?;
            }
        }

        // Every pooled connection to `:memory:` would see its own empty database.
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt)
            .await
            .with_context(|| format!("Failed to connect to database: {db_url}"))?;

        migrator::Migrator::up(&conn, None)
            .await
            .context("Failed to apply database migrations")?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    pub async fn begin(&self) -> Result<DatabaseTransaction, DbErr> {
        self.conn.begin().await
    }

    #[must_use]
    pub fn sqlite_pool(&self) -> &sea_orm::sqlx::SqlitePool {
        self.conn.get_sqlite_connection_pool()
    }

    #[must_use]
    pub const fn users(&self) -> UserRepository<'_, DatabaseConnection> {
        UserRepository::new(&self.conn)
    }

    #[must_use]
    pub const fn visitors(&self) -> VisitorRepository<'_, DatabaseConnection> {
        VisitorRepository::new(&self.conn)
    }

    #[must_use]
    pub const fn visits(&self) -> VisitRepository<'_, DatabaseConnection> {
        VisitRepository::new(&self.conn)
    }

    #[must_use]
    pub const fn audit(&self) -> AuditRepository<'_, DatabaseConnection> {
        AuditRepository::new(&self.conn)
    }

    /// Creates the initial administrator when the accounts table is empty.
    ///
    /// Returns the id of the account that was created, if any.
    pub async fn ensure_bootstrap_admin(
        &self,
        bootstrap: &BootstrapConfig,
        security: &SecurityConfig,
    ) -> Result<Option<ActorId>> {
        if self.users().count().await? > 0 {
            return Ok(None);
        }

        let password = bootstrap.admin_password.clone();
        let security = security.clone();
        let password_hash = tokio::task::spawn_blocking(move || {
            repositories::user::hash_password(&password, Some(&security))
        })
        .await
        .context("Password hashing task panicked")??;

        let txn = self.begin().await?;
        let admin = UserRepository::new(&txn)
            .insert(NewUser {
                username: bootstrap.admin_username.clone(),
                password_hash,
                role: Role::Administrator,
                first_name: "Administrador".to_string(),
                last_name: String::new(),
                email: bootstrap.admin_email.clone(),
                phone: String::new(),
                document: None,
            })
            .await?;
        AuditRepository::new(&txn)
            .add(NewAuditEntry {
                actor_id: None,
                action: AuditAction::Create,
                entity: EntityKind::User,
                entity_id: admin.id.value(),
                description: format!("Crear administrador inicial {}", admin.username),
                source_address: None,
            })
            .await?;
        txn.commit().await?;

        info!(username = %admin.username, "Bootstrap administrator created");
        Ok(Some(admin.id))
    }
}

/// Returns the constraint message when `err` is a unique-constraint violation.
#[must_use]
pub fn unique_violation(err: &DbErr) -> Option<String> {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(message)) => Some(message),
        _ => None,
    }
}
