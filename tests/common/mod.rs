#![allow(dead_code)]

use std::collections::HashMap;
use std::env;
use std::sync::Arc;

use actix_web::{App, web};
use anyhow::Result;
use chrono::NaiveDate;
use fake::Fake;
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use tempfile::TempDir;

use stafftable::database::models::{CreateUserInput, ShiftInput, ShiftRole};
use stafftable::{AppState, AuthService, Config, TenantRegistry, routes};

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-key-that-is-long-enough";

pub fn setup_test_env() {
    unsafe {
        env::set_var("RUST_LOG", "debug");
    }
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Configuration whose shared URL puts each location in its own file under `dir`.
pub fn test_config(dir: &TempDir) -> Config {
    Config {
        database_url: Some(format!("sqlite:{}/{{location}}.db", dir.path().display())),
        location_database_urls: HashMap::new(),
        max_connections: 2,
        acquire_timeout_secs: 5,
        shutdown_timeout_secs: 5,
        jwt_secret: TEST_JWT_SECRET.to_string(),
        jwt_expiration_days: 1,
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: "test".to_string(),
    }
}

pub struct TestContext {
    pub registry: Arc<TenantRegistry>,
    pub auth_service: AuthService,
    pub config: Config,
    _temp_dir: TempDir,
}

impl TestContext {
    pub async fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        Ok(Self::with_config(test_config(&temp_dir), temp_dir))
    }

    pub fn with_config(config: Config, temp_dir: TempDir) -> Self {
        let registry = Arc::new(TenantRegistry::new(config.clone()));
        let auth_service = AuthService::new(Arc::clone(&registry), config.clone());

        TestContext {
            registry,
            auth_service,
            config,
            _temp_dir: temp_dir,
        }
    }

    pub fn app_state(&self) -> web::Data<AppState> {
        web::Data::new(AppState::new(Arc::clone(&self.registry)))
    }

    /// The routed application, wired the same way as the server binary.
    pub fn app(
        &self,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        > + use<>,
    > {
        App::new()
            .app_data(self.app_state())
            .app_data(web::Data::new(self.config.clone()))
            .configure(routes::configure)
    }
}

pub struct MockData;

impl MockData {
    pub fn user(location: &str) -> CreateUserInput {
        CreateUserInput {
            email: SafeEmail().fake(),
            password: "password123".to_string(),
            name: Some(Name().fake()),
            location: location.to_string(),
        }
    }

    pub fn shift(date: NaiveDate, start_time: &str) -> ShiftInput {
        ShiftInput {
            date,
            start_time: start_time.to_string(),
            end_time: "17:00".to_string(),
            employee_name: Name().fake(),
            role: ShiftRole::Server,
            notes: None,
        }
    }
}

pub fn date(value: &str) -> NaiveDate {
    value.parse().unwrap()
}

pub struct AuthHelper;

impl AuthHelper {
    pub fn auth_header(token: &str) -> (&'static str, String) {
        ("Authorization", format!("Bearer {}", token))
    }
}
