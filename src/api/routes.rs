// API route configuration

use crate::api::handlers;
use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health_check))
            .route("/search", web::get().to(handlers::search))
            .route("/movies/titles", web::get().to(handlers::list_titles)),
    );
}
