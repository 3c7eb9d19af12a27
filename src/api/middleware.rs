// Logging, compression and CORS wrappers

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::middleware::{Compress, Logger};

pub fn setup_middleware() -> (Logger, Compress) {
    let logger = Logger::default();
    let compress = Compress::default();
    (logger, compress)
}

/// Comma-separated origin list; `*` opens the API to any origin.
pub fn setup_cors(allowed_origins: &str) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET"])
        .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
        .max_age(3600);

    for origin in allowed_origins.split(',').map(str::trim) {
        if origin == "*" {
            return cors.allow_any_origin();
        }
        if !origin.is_empty() {
            cors = cors.allowed_origin(origin);
        }
    }

    cors
}
