use actix_web::web;

use crate::handlers::system::{health_check, index};

mod admin;
mod auth;
mod content;
mod json_error;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(index);

    cfg.service(
        web::scope("/api/v1")
            .service(health_check)
            .configure(content::config_routes)
            .configure(auth::config_routes)
            .configure(admin::config_routes)
    );

    cfg.configure(json_error::config_routes);
}
