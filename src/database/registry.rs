use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::join_all;

use crate::config::Config;
use crate::database::connection::TenantConnection;
use crate::database::location::Location;
use crate::database::repositories::{
    RepositoryHandle, RepositoryKind, ShiftRepository, TenantRepository, UserRepository,
};
use crate::error::AppError;

struct TenantEntry {
    connection: Arc<TenantConnection>,
    repositories: HashMap<RepositoryKind, RepositoryHandle>,
}

/// Per-location connections and the repositories bound to them.
///
/// Connections are opened on first use and kept until [`shutdown`]. A single
/// lock guards both levels of the map, so concurrent first requests for a
/// location share one connection and each connection gets at most one
/// repository of each kind.
///
/// [`shutdown`]: TenantRegistry::shutdown
pub struct TenantRegistry {
    config: Config,
    tenants: Mutex<HashMap<Location, TenantEntry>>,
}

impl TenantRegistry {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            tenants: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn parse_location(location: &str) -> Result<Location, AppError> {
        location.parse().map_err(AppError::Configuration)
    }

    pub fn resolve_connection(&self, location: &str) -> Result<Arc<TenantConnection>, AppError> {
        self.connection_for(Self::parse_location(location)?)
    }

    pub fn connection_for(&self, location: Location) -> Result<Arc<TenantConnection>, AppError> {
        let mut tenants = self.tenants();
        let entry = self.live_entry(&mut tenants, location)?;
        Ok(Arc::clone(&entry.connection))
    }

    pub fn resolve_repository<R: TenantRepository>(&self, location: &str) -> Result<R, AppError> {
        self.repository_for(Self::parse_location(location)?)
    }

    pub fn repository_for<R: TenantRepository>(&self, location: Location) -> Result<R, AppError> {
        let mut tenants = self.tenants();
        let entry = self.live_entry(&mut tenants, location)?;

        if let Some(repository) = entry.repositories.get(&R::KIND).and_then(R::from_handle) {
            return Ok(repository);
        }

        let repository = R::bind(Arc::clone(&entry.connection));
        entry
            .repositories
            .insert(R::KIND, repository.clone().into_handle());
        log::debug!("Bound {} repository for {}", R::KIND, location);

        Ok(repository)
    }

    pub fn users(&self, location: Location) -> Result<UserRepository, AppError> {
        self.repository_for(location)
    }

    pub fn shifts(&self, location: Location) -> Result<ShiftRepository, AppError> {
        self.repository_for(location)
    }

    /// Locations that currently have a registered connection.
    pub fn resolved_locations(&self) -> Vec<Location> {
        let mut locations: Vec<Location> = self.tenants().keys().copied().collect();
        locations.sort();
        locations
    }

    /// Closes every registered connection concurrently. All closes are
    /// attempted; the error names each location that failed.
    pub async fn shutdown(&self) -> Result<(), AppError> {
        let connections: Vec<Arc<TenantConnection>> = self
            .tenants()
            .drain()
            .map(|(_, entry)| entry.connection)
            .collect();

        if connections.is_empty() {
            log::info!("No tenant databases to close");
            return Ok(());
        }

        let timeout = self.config.shutdown_timeout();
        let results = join_all(connections.iter().map(|connection| async move {
            (connection.location(), connection.close(timeout).await)
        }))
        .await;

        let mut failed: Vec<String> = results
            .into_iter()
            .filter_map(|(location, result)| match result {
                Ok(()) => None,
                Err(e) => {
                    log::error!("Failed to close {} database: {}", location, e);
                    Some(location.to_string())
                }
            })
            .collect();

        if failed.is_empty() {
            log::info!("All {} tenant database connections closed", connections.len());
            Ok(())
        } else {
            failed.sort();
            Err(AppError::ShutdownIncomplete(failed))
        }
    }

    fn tenants(&self) -> MutexGuard<'_, HashMap<Location, TenantEntry>> {
        // Every update is a single insert or drain, so a poisoned map is still consistent
        self.tenants.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The registered entry for `location`, replacing it first if its
    /// connection has failed. Connections still handshaking are reused.
    fn live_entry<'a>(
        &self,
        tenants: &'a mut HashMap<Location, TenantEntry>,
        location: Location,
    ) -> Result<&'a mut TenantEntry, AppError> {
        match tenants.entry(location) {
            Entry::Occupied(mut occupied) => {
                if !occupied.get().connection.is_live() {
                    let fresh = self.open_entry(location)?;
                    let stale = occupied.insert(fresh);
                    log::warn!(
                        "Replacing {} database connection in state {}",
                        location,
                        stale.connection.state()
                    );
                    stale.connection.discard();
                }
                Ok(occupied.into_mut())
            }
            Entry::Vacant(vacant) => Ok(vacant.insert(self.open_entry(location)?)),
        }
    }

    fn open_entry(&self, location: Location) -> Result<TenantEntry, AppError> {
        let database_url = self.config.database_url_for(location).ok_or_else(|| {
            AppError::Configuration(format!(
                "No database URL configured for location: {}",
                location
            ))
        })?;

        Ok(TenantEntry {
            connection: TenantConnection::open(location, &database_url, &self.config)?,
            repositories: HashMap::new(),
        })
    }
}
