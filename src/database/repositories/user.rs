use std::sync::Arc;

use uuid::Uuid;

use super::{RepositoryBinding, RepositoryHandle, RepositoryKind, TenantRepository};
use crate::database::connection::TenantConnection;
use crate::database::models::{User, normalize_email};
use crate::database::schema::USER_SCHEMA;
use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct UserRepository {
    binding: RepositoryBinding,
}

impl TenantRepository for UserRepository {
    const KIND: RepositoryKind = RepositoryKind::User;

    fn bind(connection: Arc<TenantConnection>) -> Self {
        Self {
            binding: RepositoryBinding::new(connection, &USER_SCHEMA),
        }
    }

    fn into_handle(self) -> RepositoryHandle {
        RepositoryHandle::User(self)
    }

    fn from_handle(handle: &RepositoryHandle) -> Option<Self> {
        match handle {
            RepositoryHandle::User(repository) => Some(repository.clone()),
            _ => None,
        }
    }
}

impl UserRepository {
    pub fn binding(&self) -> &RepositoryBinding {
        &self.binding
    }

    pub fn is_same_handle(&self, other: &Self) -> bool {
        self.binding.same_binding(&other.binding)
    }

    pub async fn create_user(&self, user: &User) -> Result<User, AppError> {
        let pool = self.binding.pool().await?;

        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, password_hash, is_owner, name, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, email, password_hash, is_owner, name, created_at
            "#,
        )
        .bind(user.id)
        .bind(normalize_email(&user.email))
        .bind(&user.password_hash)
        .bind(user.is_owner)
        .bind(&user.name)
        .bind(user.created_at)
        .fetch_one(pool)
        .await;

        self.binding
            .observe(result)
            .map_err(|e| email_conflict(e, &user.email))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let pool = self.binding.pool().await?;

        let user = self.binding.observe(
            sqlx::query_as::<_, User>(
                r#"
                SELECT id, email, password_hash, is_owner, name, created_at
                FROM users
                WHERE email = ?
                "#,
            )
            .bind(normalize_email(email))
            .fetch_optional(pool)
            .await,
        )?;

        Ok(user)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let pool = self.binding.pool().await?;

        let user = self.binding.observe(
            sqlx::query_as::<_, User>(
                r#"
                SELECT id, email, password_hash, is_owner, name, created_at
                FROM users
                WHERE id = ?
                "#,
            )
            .bind(id)
            .fetch_optional(pool)
            .await,
        )?;

        Ok(user)
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        let pool = self.binding.pool().await?;

        let count: i64 = self.binding.observe(
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ?")
                .bind(normalize_email(email))
                .fetch_one(pool)
                .await,
        )?;

        Ok(count > 0)
    }

    /// Persists the mutable fields of an existing user.
    pub async fn save(&self, user: &User) -> Result<User, AppError> {
        let pool = self.binding.pool().await?;

        let result = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET email = ?, password_hash = ?, is_owner = ?, name = ?
            WHERE id = ?
            RETURNING id, email, password_hash, is_owner, name, created_at
            "#,
        )
        .bind(normalize_email(&user.email))
        .bind(&user.password_hash)
        .bind(user.is_owner)
        .bind(&user.name)
        .bind(user.id)
        .fetch_optional(pool)
        .await;

        self.binding
            .observe(result)
            .map_err(|e| email_conflict(e, &user.email))?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.id)))
    }
}

fn email_conflict(error: sqlx::Error, email: &str) -> AppError {
    if let sqlx::Error::Database(db_error) = &error {
        if db_error.is_unique_violation() {
            return AppError::Conflict(format!(
                "User with email {} already exists",
                normalize_email(email)
            ));
        }
    }

    AppError::from(error)
}
