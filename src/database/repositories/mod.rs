use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::OnceCell;

use crate::database::connection::TenantConnection;
use crate::database::schema::RecordSchema;
use crate::error::AppError;

pub mod shift;
pub mod user;

// Re-export all repositories for easy importing
pub use shift::ShiftRepository;
pub use user::UserRepository;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryKind {
    User,
    Shift,
}

impl std::fmt::Display for RepositoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepositoryKind::User => write!(f, "User"),
            RepositoryKind::Shift => write!(f, "Shift"),
        }
    }
}

/// A memoized repository as stored by the tenant registry.
#[derive(Debug, Clone)]
pub enum RepositoryHandle {
    User(UserRepository),
    Shift(ShiftRepository),
}

/// A repository that the tenant registry can bind to a connection and hand
/// back out of its cache.
pub trait TenantRepository: Clone + Sized {
    const KIND: RepositoryKind;

    fn bind(connection: Arc<TenantConnection>) -> Self;

    fn into_handle(self) -> RepositoryHandle;

    fn from_handle(handle: &RepositoryHandle) -> Option<Self>;
}

/// Ties a record schema to one tenant connection. Clones share the
/// applied-schema cell, so the DDL runs once per handle no matter how many
/// copies are in flight.
#[derive(Debug, Clone)]
pub struct RepositoryBinding {
    connection: Arc<TenantConnection>,
    schema: &'static RecordSchema,
    applied: Arc<OnceCell<()>>,
}

impl RepositoryBinding {
    pub fn new(connection: Arc<TenantConnection>, schema: &'static RecordSchema) -> Self {
        Self {
            connection,
            schema,
            applied: Arc::new(OnceCell::new()),
        }
    }

    pub fn connection(&self) -> &Arc<TenantConnection> {
        &self.connection
    }

    pub fn schema(&self) -> &'static RecordSchema {
        self.schema
    }

    pub fn is_schema_applied(&self) -> bool {
        self.applied.initialized()
    }

    pub fn same_binding(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.applied, &other.applied)
    }

    /// The tenant pool, with this record's table created on first use.
    pub async fn pool(&self) -> Result<&SqlitePool, AppError> {
        self.applied
            .get_or_try_init(|| self.apply_schema())
            .await?;
        Ok(self.connection.pool())
    }

    async fn apply_schema(&self) -> Result<(), AppError> {
        for statement in self.schema.create_statements() {
            self.observe(sqlx::query(&statement).execute(self.connection.pool()).await)?;
        }

        log::debug!(
            "Applied {} schema on {} database",
            self.schema.table,
            self.connection.location()
        );

        Ok(())
    }

    pub(crate) fn observe<T>(&self, result: sqlx::Result<T>) -> sqlx::Result<T> {
        self.connection.observe(result)
    }
}
