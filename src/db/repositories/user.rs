use anyhow::Result;
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::Serialize;

use crate::config::SecurityConfig;
use crate::db::clock;
use crate::domain::{ActorId, Role};
use crate::entities::{prelude::*, users};

/// User data returned from repository (without sensitive password hash)
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: ActorId,
    pub username: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub document: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<users::Model> for User {
    type Error = DbErr;

    fn try_from(model: users::Model) -> Result<Self, Self::Error> {
        let role = model
            .role
            .parse::<Role>()
            .map_err(|e| DbErr::Custom(format!("user {}: {e}", model.id)))?;

        Ok(Self {
            id: ActorId::new(model.id),
            username: model.username,
            role,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
            phone: model.phone,
            document: model.document,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub document: Option<String>,
}

/// Fields an administrator may change on an existing account.
#[derive(Debug, Clone)]
pub struct UserChanges {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub phone: String,
    pub is_active: bool,
}

pub struct UserRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> UserRepository<'a, C> {
    #[must_use]
    pub const fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, id: ActorId) -> Result<Option<User>, DbErr> {
        Users::find_by_id(id.value())
            .one(self.conn)
            .await?
            .map(User::try_from)
            .transpose()
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, DbErr> {
        Users::find()
            .filter(users::Column::Username.eq(username))
            .one(self.conn)
            .await?
            .map(User::try_from)
            .transpose()
    }

    /// Get user by username together with the stored password hash
    pub async fn get_with_password_hash(
        &self,
        username: &str,
    ) -> Result<Option<(User, String)>, DbErr> {
        let Some(model) = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(self.conn)
            .await?
        else {
            return Ok(None);
        };

        let password_hash = model.password_hash.clone();
        Ok(Some((User::try_from(model)?, password_hash)))
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool, DbErr> {
        let count = Users::find()
            .filter(users::Column::Username.eq(username))
            .count(self.conn)
            .await?;
        Ok(count > 0)
    }

    pub async fn document_exists(&self, document: &str) -> Result<bool, DbErr> {
        let count = Users::find()
            .filter(users::Column::Document.eq(document))
            .count(self.conn)
            .await?;
        Ok(count > 0)
    }

    /// All accounts, newest first.
    pub async fn list(&self) -> Result<Vec<User>, DbErr> {
        Users::find()
            .order_by_desc(users::Column::CreatedAt)
            .order_by_desc(users::Column::Id)
            .all(self.conn)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    pub async fn count(&self) -> Result<u64, DbErr> {
        Users::find().count(self.conn).await
    }

    pub async fn count_active(&self) -> Result<u64, DbErr> {
        Users::find()
            .filter(users::Column::IsActive.eq(true))
            .count(self.conn)
            .await
    }

    pub async fn insert(&self, user: NewUser) -> Result<User, DbErr> {
        let now = clock::now();

        let model = users::ActiveModel {
            username: Set(user.username),
            password_hash: Set(user.password_hash),
            role: Set(user.role.as_str().to_string()),
            first_name: Set(user.first_name),
            last_name: Set(user.last_name),
            email: Set(user.email),
            phone: Set(user.phone),
            document: Set(user.document),
            is_active: Set(true),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.conn)
        .await?;

        User::try_from(model)
    }

    /// Applies `changes`; `None` when no account has that id.
    pub async fn update(&self, id: ActorId, changes: UserChanges) -> Result<Option<User>, DbErr> {
        let Some(model) = Users::find_by_id(id.value()).one(self.conn).await? else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = model.into();
        active.first_name = Set(changes.first_name);
        active.last_name = Set(changes.last_name);
        active.email = Set(changes.email);
        active.role = Set(changes.role.as_str().to_string());
        active.phone = Set(changes.phone);
        active.is_active = Set(changes.is_active);
        active.updated_at = Set(clock::now());

        let model = active.update(self.conn).await?;
        User::try_from(model).map(Some)
    }

    pub async fn delete(&self, id: ActorId) -> Result<bool, DbErr> {
        let result = Users::delete_by_id(id.value()).exec(self.conn).await?;
        Ok(result.rows_affected > 0)
    }
}

/// Hash a password using Argon2id with optional custom params.
/// If config is None, uses the crate's default params.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None, // output length (use default)
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Checks `password` against a stored PHC hash string.
/// The parameters embedded in the hash are used, not the current config.
pub fn verify_password(password_hash: &str, password: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_params() -> SecurityConfig {
        SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
        }
    }

    #[test]
    fn hash_and_verify() {
        let hash = hash_password("correct horse", Some(&fast_params())).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password(&hash, "correct horse").unwrap());
        assert!(!verify_password(&hash, "wrong horse").unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("not-a-hash", "anything").is_err());
    }
}
