use actix_web::web;

use crate::handlers::shared::{json_config, path_config, query_config};

pub mod auth;
pub mod shifts;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .app_data(json_config())
            .app_data(query_config())
            .app_data(path_config())
            .configure(auth::configure)
            .configure(shifts::configure),
    );
}
