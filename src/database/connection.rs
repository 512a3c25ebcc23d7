use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tokio::sync::watch;
use uuid::Uuid;

use crate::config::Config;
use crate::database::location::Location;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Errored,
    Disconnected,
    Closed,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Errored => write!(f, "errored"),
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Closed => write!(f, "closed"),
        }
    }
}

/// A lazily established pool for one tenant's database.
///
/// The handle is usable as soon as it is built. The first connection is
/// opened by a background task, and queries issued before that finishes wait
/// on the pool (up to its acquire timeout).
#[derive(Debug)]
pub struct TenantConnection {
    id: Uuid,
    location: Location,
    pool: SqlitePool,
    state: watch::Sender<ConnectionState>,
}

impl TenantConnection {
    /// Must be called from within a Tokio runtime.
    pub(crate) fn open(
        location: Location,
        database_url: &str,
        config: &Config,
    ) -> Result<Arc<Self>, AppError> {
        if !database_url.starts_with("sqlite:") {
            return Err(AppError::Configuration(format!(
                "Unsupported database URL for location {}: expected a sqlite: URL",
                location
            )));
        }

        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| {
                AppError::Configuration(format!(
                    "Invalid database URL for location {}: {}",
                    location, e
                ))
            })?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout())
            .connect_lazy_with(options);

        let (state, _) = watch::channel(ConnectionState::Connecting);

        let connection = Arc::new(Self {
            id: Uuid::new_v4(),
            location,
            pool,
            state,
        });

        log::debug!(
            "Opening {} database (connection {})",
            location,
            connection.id
        );
        connection.spawn_handshake();

        Ok(connection)
    }

    fn spawn_handshake(self: &Arc<Self>) {
        let connection = Arc::clone(self);
        tokio::spawn(async move {
            match connection.pool.acquire().await {
                Ok(_) => connection.transition(ConnectionState::Connected, None),
                Err(e) => connection.transition(ConnectionState::Errored, Some(&e)),
            }
        });
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn is_ready(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Connected, or still completing its first handshake.
    pub fn is_live(&self) -> bool {
        matches!(
            self.state(),
            ConnectionState::Connecting | ConnectionState::Connected
        )
    }

    /// Waits until the handshake has either succeeded or failed.
    pub async fn wait_until_settled(&self) -> ConnectionState {
        let mut receiver = self.state.subscribe();
        match receiver
            .wait_for(|state| *state != ConnectionState::Connecting)
            .await
        {
            Ok(state) => *state,
            Err(_) => self.state(),
        }
    }

    /// Feeds a query outcome back into the connection state. The result is
    /// returned untouched.
    pub(crate) fn observe<T>(&self, result: sqlx::Result<T>) -> sqlx::Result<T> {
        match &result {
            Ok(_) => self.transition(ConnectionState::Connected, None),
            Err(e) if is_connectivity_error(e) => {
                self.transition(ConnectionState::Disconnected, Some(e))
            }
            Err(_) => {}
        }
        result
    }

    fn transition(&self, next: ConnectionState, cause: Option<&sqlx::Error>) {
        let changed = self.state.send_if_modified(|current| {
            // closed is terminal
            if *current == next || *current == ConnectionState::Closed {
                return false;
            }
            *current = next;
            true
        });

        if !changed {
            return;
        }

        let cause = cause.map_or_else(String::new, |e| format!(": {}", e));
        match next {
            ConnectionState::Connected => {
                log::info!("Connected to {} database", self.location)
            }
            ConnectionState::Errored => {
                log::error!("Error connecting to {} database{}", self.location, cause)
            }
            ConnectionState::Disconnected => {
                log::warn!("Disconnected from {} database{}", self.location, cause)
            }
            ConnectionState::Closed => log::info!("Closed {} database", self.location),
            ConnectionState::Connecting => {}
        }
    }

    /// Closes the pool, waiting at most `timeout` for checked-out connections
    /// to be returned.
    pub async fn close(&self, timeout: Duration) -> Result<(), AppError> {
        match tokio::time::timeout(timeout, self.pool.close()).await {
            Ok(()) => {
                self.transition(ConnectionState::Closed, None);
                Ok(())
            }
            Err(_) => {
                log::error!(
                    "Timed out after {:?} closing {} database",
                    timeout,
                    self.location
                );
                Err(AppError::internal_server_error_message(format!(
                    "Timed out closing {} database",
                    self.location
                )))
            }
        }
    }

    /// Closes a connection that has been replaced in the registry without
    /// blocking the caller.
    pub(crate) fn discard(self: Arc<Self>) {
        tokio::spawn(async move {
            self.pool.close().await;
            self.transition(ConnectionState::Closed, None);
        });
    }
}

fn is_connectivity_error(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn config() -> Config {
        Config {
            database_url: None,
            location_database_urls: Default::default(),
            max_connections: 2,
            acquire_timeout_secs: 5,
            shutdown_timeout_secs: 1,
            jwt_secret: "test-jwt-secret".to_string(),
            jwt_expiration_days: 1,
            host: "127.0.0.1".to_string(),
            port: 0,
            environment: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn handshake_moves_to_connected() {
        let temp_dir = TempDir::new().unwrap();
        let url = format!("sqlite:{}/tempe.db", temp_dir.path().display());

        let connection = TenantConnection::open(Location::Tempe, &url, &config()).unwrap();

        assert_eq!(
            connection.wait_until_settled().await,
            ConnectionState::Connected
        );
        assert!(connection.is_ready());
        assert!(connection.is_live());
    }

    #[tokio::test]
    async fn unreachable_store_moves_to_errored() {
        let url = "sqlite:/stafftable-missing-dir/nested/tempe.db";

        let connection = TenantConnection::open(Location::Tempe, url, &config()).unwrap();

        assert_eq!(
            connection.wait_until_settled().await,
            ConnectionState::Errored
        );
        assert!(!connection.is_live());
    }

    #[tokio::test]
    async fn unusable_urls_are_configuration_errors() {
        let error = TenantConnection::open(Location::Becker, "postgres://db/becker", &config())
            .unwrap_err();
        assert!(error.is_configuration());

        let error =
            TenantConnection::open(Location::Becker, "sqlite:becker.db?bogus=1", &config())
                .unwrap_err();
        assert!(error.is_configuration());
    }

    #[tokio::test]
    async fn closed_is_terminal() {
        let temp_dir = TempDir::new().unwrap();
        let url = format!("sqlite:{}/becker.db", temp_dir.path().display());
        let connection = TenantConnection::open(Location::Becker, &url, &config()).unwrap();
        connection.wait_until_settled().await;

        connection.close(Duration::from_secs(1)).await.unwrap();
        assert_eq!(connection.state(), ConnectionState::Closed);

        let result = connection.observe(Ok::<_, sqlx::Error>(()));
        assert!(result.is_ok());
        assert_eq!(connection.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn connectivity_failures_mark_disconnected() {
        let temp_dir = TempDir::new().unwrap();
        let url = format!("sqlite:{}/downtown.db", temp_dir.path().display());
        let connection = TenantConnection::open(Location::Downtown, &url, &config()).unwrap();
        connection.wait_until_settled().await;

        let result = connection.observe(Err::<(), _>(sqlx::Error::PoolTimedOut));
        assert!(matches!(result, Err(sqlx::Error::PoolTimedOut)));
        assert_eq!(connection.state(), ConnectionState::Disconnected);

        let result = connection.observe(Err::<(), _>(sqlx::Error::RowNotFound));
        assert!(result.is_err());
        assert_eq!(connection.state(), ConnectionState::Disconnected);

        connection.observe(Ok::<_, sqlx::Error>(())).unwrap();
        assert_eq!(connection.state(), ConnectionState::Connected);
    }
}
