//! `SeaORM` implementation of the `UserService` trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::config::SecurityConfig;
use crate::constants::MIN_PASSWORD_LENGTH;
use crate::db::repositories::user::{hash_password, verify_password};
use crate::db::{NewAuditEntry, NewUser, Store, User, UserChanges, UserRepository};
use crate::domain::{ActorContext, ActorId, AuditAction, Capability, EntityKind, validation};
use crate::services::audit_service::record;
use crate::services::user_service::{CreateUserRequest, UpdateUserRequest, UserError, UserService};

const MAX_USERNAME_LENGTH: usize = 150;
const DUMMY_PASSWORD: &str = "visitrack-unknown-account";

pub struct SeaOrmUserService {
    store: Store,
    security: SecurityConfig,
    /// Hash checked for unknown usernames so every failed login pays for one
    /// Argon2 verification.
    dummy_hash: OnceCell<String>,
}

impl SeaOrmUserService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self {
            store,
            security,
            dummy_hash: OnceCell::const_new(),
        }
    }

    fn validate_username(username: &str) -> Result<(), UserError> {
        validation::required("username", username)
            .and_then(|()| validation::max_length("username", username, MAX_USERNAME_LENGTH))
            .map_err(UserError::Validation)?;

        if !username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
        {
            return Err(UserError::Validation(
                "Username can only contain letters, numbers and @ . + - _".to_string(),
            ));
        }

        Ok(())
    }

    fn validate_password(password: &str, confirmation: &str) -> Result<(), UserError> {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(UserError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }

        if password != confirmation {
            return Err(UserError::Validation("Passwords do not match".to_string()));
        }

        Ok(())
    }

    async fn hash(&self, password: String) -> Result<String, UserError> {
        let security = self.security.clone();
        tokio::task::spawn_blocking(move || hash_password(&password, Some(&security)))
            .await
            .map_err(|e| UserError::Internal(format!("Password hashing task failed: {e}")))?
            .map_err(UserError::from)
    }

    async fn verify(password_hash: String, password: &str) -> Result<bool, UserError> {
        let candidate = password.to_string();
        tokio::task::spawn_blocking(move || verify_password(&password_hash, &candidate))
            .await
            .map_err(|e| UserError::Internal(format!("Password verification task failed: {e}")))?
            .map_err(UserError::from)
    }

    async fn dummy_hash(&self) -> Result<String, UserError> {
        self.dummy_hash
            .get_or_try_init(|| self.hash(DUMMY_PASSWORD.to_string()))
            .await
            .cloned()
    }

    fn audit_entry(
        actor: &ActorContext,
        action: AuditAction,
        target: &User,
        description: String,
    ) -> NewAuditEntry {
        NewAuditEntry {
            actor_id: Some(actor.id),
            action,
            entity: EntityKind::User,
            entity_id: target.id.value(),
            description,
            source_address: actor.source_address.clone(),
        }
    }
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn create(
        &self,
        actor: &ActorContext,
        request: CreateUserRequest,
    ) -> Result<User, UserError> {
        actor.require(Capability::Administration)?;

        let username = request.username.trim().to_string();
        Self::validate_username(&username)?;
        Self::validate_password(&request.password, &request.password_confirmation)?;
        validation::email(&request.email).map_err(UserError::Validation)?;

        let document = request
            .document
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        let users = self.store.users();
        if users.username_exists(&username).await? {
            return Err(UserError::Conflict(format!(
                "Username '{username}' is already taken"
            )));
        }
        if let Some(document) = &document
            && users.document_exists(document).await?
        {
            return Err(UserError::Conflict(format!(
                "An account with document number {document} already exists"
            )));
        }

        let password_hash = self.hash(request.password).await?;

        let txn = self.store.begin().await?;
        let user = UserRepository::new(&txn)
            .insert(NewUser {
                username,
                password_hash,
                role: request.role,
                first_name: request.first_name.trim().to_string(),
                last_name: request.last_name.trim().to_string(),
                email: request.email.trim().to_string(),
                phone: request.phone.trim().to_string(),
                document,
            })
            .await?;
        record(
            &txn,
            Self::audit_entry(
                actor,
                AuditAction::Create,
                &user,
                format!("Crear usuario {}", user.username),
            ),
        )
        .await?;
        txn.commit().await?;

        info!(
            user_id = %user.id,
            username = %user.username,
            role = %user.role,
            actor_id = %actor.id,
            "User created"
        );

        Ok(user)
    }

    async fn list(&self, actor: &ActorContext) -> Result<Vec<User>, UserError> {
        actor.require(Capability::Administration)?;
        Ok(self.store.users().list().await?)
    }

    async fn get(&self, actor: &ActorContext, id: ActorId) -> Result<User, UserError> {
        actor.require(Capability::Administration)?;
        self.store
            .users()
            .get_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))
    }

    async fn update(
        &self,
        actor: &ActorContext,
        id: ActorId,
        request: UpdateUserRequest,
    ) -> Result<User, UserError> {
        actor.require(Capability::Administration)?;
        validation::email(&request.email).map_err(UserError::Validation)?;

        let txn = self.store.begin().await?;
        let user = UserRepository::new(&txn)
            .update(
                id,
                UserChanges {
                    first_name: request.first_name.trim().to_string(),
                    last_name: request.last_name.trim().to_string(),
                    email: request.email.trim().to_string(),
                    role: request.role,
                    phone: request.phone.trim().to_string(),
                    is_active: request.is_active,
                },
            )
            .await?
            .ok_or(UserError::NotFound(id))?;
        record(
            &txn,
            Self::audit_entry(
                actor,
                AuditAction::Update,
                &user,
                format!("Editar usuario {}", user.username),
            ),
        )
        .await?;
        txn.commit().await?;

        info!(user_id = %user.id, actor_id = %actor.id, "User updated");

        Ok(user)
    }

    async fn delete(&self, actor: &ActorContext, id: ActorId) -> Result<User, UserError> {
        actor.require(Capability::Administration)?;

        if actor.id == id {
            return Err(UserError::Validation(
                "You cannot delete your own account".to_string(),
            ));
        }

        let txn = self.store.begin().await?;
        let users = UserRepository::new(&txn);
        let user = users.get_by_id(id).await?.ok_or(UserError::NotFound(id))?;

        record(
            &txn,
            Self::audit_entry(
                actor,
                AuditAction::Delete,
                &user,
                format!("Eliminar usuario {}", user.username),
            ),
        )
        .await?;
        users.delete(id).await?;
        txn.commit().await?;

        info!(user_id = %user.id, username = %user.username, actor_id = %actor.id, "User deleted");

        Ok(user)
    }

    async fn login(
        &self,
        username: &str,
        password: &str,
        source_address: Option<String>,
    ) -> Result<User, UserError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(UserError::Validation(
                "Username and password are required".to_string(),
            ));
        }

        let Some((user, password_hash)) =
            self.store.users().get_with_password_hash(username).await?
        else {
            let dummy_hash = self.dummy_hash().await?;
            Self::verify(dummy_hash, password).await?;
            warn!(username = %username, "Login failed: unknown user");
            metrics::counter!("logins_total", "outcome" => "failure").increment(1);
            return Err(UserError::InvalidCredentials);
        };

        let valid = Self::verify(password_hash, password).await?;

        if !valid || !user.is_active {
            warn!(
                user_id = %user.id,
                active = user.is_active,
                "Login failed"
            );
            metrics::counter!("logins_total", "outcome" => "failure").increment(1);
            return Err(UserError::InvalidCredentials);
        }

        record(
            &self.store.conn,
            NewAuditEntry {
                actor_id: Some(user.id),
                action: AuditAction::Login,
                entity: EntityKind::User,
                entity_id: user.id.value(),
                description: format!("Inicio de sesión de {}", user.username),
                source_address,
            },
        )
        .await?;

        info!(user_id = %user.id, username = %user.username, "User logged in");
        metrics::counter!("logins_total", "outcome" => "success").increment(1);

        Ok(user)
    }

    async fn logout(&self, actor: &ActorContext) -> Result<(), UserError> {
        record(
            &self.store.conn,
            NewAuditEntry {
                actor_id: Some(actor.id),
                action: AuditAction::Logout,
                entity: EntityKind::User,
                entity_id: actor.id.value(),
                description: format!("Cierre de sesión de {}", actor.username),
                source_address: actor.source_address.clone(),
            },
        )
        .await?;

        info!(user_id = %actor.id, username = %actor.username, "User logged out");
        Ok(())
    }

    async fn session_account(&self, id: ActorId) -> Result<Option<User>, UserError> {
        Ok(self
            .store
            .users()
            .get_by_id(id)
            .await?
            .filter(|user| user.is_active))
    }
}
