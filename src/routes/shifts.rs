use actix_web::web;

use crate::handlers::shifts;

pub fn configure(cfg: &mut web::ServiceConfig) {
    // literal segments before /{id}
    cfg.service(
        web::scope("/shifts")
            .route("", web::post().to(shifts::create_shift))
            .route("/week", web::get().to(shifts::get_week))
            .route("/date/{date}", web::get().to(shifts::get_by_date))
            .route("/{id}", web::get().to(shifts::get_shift))
            .route("/{id}", web::put().to(shifts::update_shift))
            .route("/{id}", web::delete().to(shifts::delete_shift)),
    );
}
