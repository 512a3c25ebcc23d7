use std::sync::Arc;

use actix_web::{App, HttpResponse, HttpServer, Responder, get, middleware::Logger, web};
use anyhow::Result;

use stafftable::{AppState, Config, TenantRegistry, routes};

#[get("/")]
async fn hello() -> impl Responder {
    HttpResponse::Ok().body("StaffTable API v1.0")
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now()
    }))
}

#[actix_web::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init();

    log::info!("Starting StaffTable API server");

    // Load configuration
    let config = Config::from_env()?;
    log::info!("Configuration loaded (environment: {})", config.environment);

    // Two locations on one store would see each other's records
    config.validate()?;

    for location in config.missing_locations() {
        log::warn!(
            "No database URL for {}; set {} or DATABASE_URL",
            location,
            location.env_var()
        );
    }

    // Tenant databases are opened on first request
    let registry = Arc::new(TenantRegistry::new(config.clone()));
    let app_state = web::Data::new(AppState::new(Arc::clone(&registry)));
    let config_data = web::Data::new(config.clone());

    let server_address = config.server_address();
    log::info!("Server starting on http://{}", server_address);

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .app_data(config_data.clone())
            .wrap(Logger::default())
            .service(hello)
            .service(health)
            .configure(routes::configure)
    })
    .bind(&server_address)?
    .run()
    .await
    .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    log::info!("Server stopped, closing tenant databases");
    registry.shutdown().await?;

    Ok(())
}
