use std::sync::Arc;

pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod services;

pub use config::Config;
pub use database::TenantRegistry;
pub use error::AppError;
pub use services::AuthService;

pub struct AppState {
    pub auth_service: AuthService,
    pub registry: Arc<TenantRegistry>,
}

impl AppState {
    pub fn new(registry: Arc<TenantRegistry>) -> Self {
        Self {
            auth_service: AuthService::new(Arc::clone(&registry), registry.config().clone()),
            registry,
        }
    }
}
