use anyhow::{Result, bail};
use std::collections::HashMap;
use std::env;
use std::time::Duration;

use crate::database::location::Location;

/// Placeholder in the shared `DATABASE_URL` that is replaced by the location
/// identifier, so that a single template still yields one store per tenant.
pub const LOCATION_PLACEHOLDER: &str = "{location}";

#[derive(Debug, Clone)]
pub struct Config {
    /// Shared fallback connection string for locations without their own.
    pub database_url: Option<String>,
    pub location_database_urls: HashMap<Location, String>,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub shutdown_timeout_secs: u64,
    pub jwt_secret: String,
    pub jwt_expiration_days: i64,
    pub host: String,
    pub port: u16,
    pub environment: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        Self::from_env_only()
    }

    /// Load configuration from environment variables only (without loading .env files)
    /// This is useful for testing where you want to control the environment directly
    pub fn from_env_only() -> Result<Self> {
        let location_database_urls = Location::ALL
            .into_iter()
            .filter_map(|location| {
                env::var(location.env_var())
                    .ok()
                    .filter(|url| !url.trim().is_empty())
                    .map(|url| (location, url))
            })
            .collect();

        Ok(Config {
            database_url: env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            location_database_urls,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),
            acquire_timeout_secs: env::var("DATABASE_ACQUIRE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
            shutdown_timeout_secs: env::var("SHUTDOWN_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| {
                "your-super-secret-jwt-key-change-this-in-production-12345".to_string()
            }),
            jwt_expiration_days: env::var("JWT_EXPIRATION_DAYS")
                .unwrap_or_else(|_| "7".to_string())
                .parse()
                .unwrap_or(7),
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "5001".to_string())
                .parse()
                .unwrap_or(5001),
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        })
    }

    /// Connection string for a location: its own variable first, then the
    /// shared default with `{location}` substituted.
    pub fn database_url_for(&self, location: Location) -> Option<String> {
        if let Some(url) = self.location_database_urls.get(&location) {
            return Some(url.clone());
        }

        self.database_url
            .as_ref()
            .map(|url| url.replace(LOCATION_PLACEHOLDER, location.as_str()))
    }

    /// Locations that will fail to resolve because no connection string applies.
    pub fn missing_locations(&self) -> Vec<Location> {
        Location::ALL
            .into_iter()
            .filter(|location| self.database_url_for(*location).is_none())
            .collect()
    }

    /// Groups of locations whose connection strings resolve to the same
    /// store. In-memory SQLite URLs are private to each pool and never count.
    pub fn shared_database_urls(&self) -> Vec<(String, Vec<Location>)> {
        let mut by_url: Vec<(String, Vec<Location>)> = Vec::new();

        for location in Location::ALL {
            let Some(url) = self.database_url_for(location) else {
                continue;
            };
            if url.contains(":memory:") {
                continue;
            }
            match by_url.iter_mut().find(|(existing, _)| *existing == url) {
                Some((_, locations)) => locations.push(location),
                None => by_url.push((url, vec![location])),
            }
        }

        by_url.retain(|(_, locations)| locations.len() > 1);
        by_url
    }

    /// Rejects configurations in which two locations would share one store.
    pub fn validate(&self) -> Result<()> {
        if let Some((url, locations)) = self.shared_database_urls().into_iter().next() {
            let names: Vec<&str> = locations.iter().map(|l| l.as_str()).collect();
            bail!(
                "Locations {} resolve to the same database {}; give each its own DATABASE_URL_<LOCATION> or add {} to DATABASE_URL",
                names.join(", "),
                url,
                LOCATION_PLACEHOLDER
            );
        }

        Ok(())
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
