//! HTTP handlers and route configuration.

mod convert;
mod health;
mod posts;
mod submission;


use actix_web::{HttpRequest, error, web};

use crate::middleware::error::AppError;

fn query_error(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(format!("Invalid query: {err}")).into()
}

fn path_error(err: error::PathError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(format!("Invalid path parameter: {err}")).into()
}

/// Configure all application routes.
///
/// Fixed segments (`/user`, `/admin`, `/id`) are registered ahead of the
/// catch-all `/{slug}`.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(web::QueryConfig::default().error_handler(query_error))
            .app_data(web::PathConfig::default().error_handler(path_error))
            // Public routes
            .route("/health", web::get().to(health::health_check))
            .service(
                web::scope("/posts")
                    .service(
                        web::resource("")
                            .route(web::get().to(posts::list_public))
                            .route(web::post().to(posts::create)),
                    )
                    .route("/user/{user_id}", web::get().to(posts::list_for_user))
                    .route("/admin/all", web::get().to(posts::list_admin))
                    .route("/id/{id}", web::get().to(posts::get_by_id))
                    .route("/{id}/featured", web::patch().to(posts::toggle_featured))
                    .service(
                        web::resource("/{key}")
                            .route(web::get().to(posts::get_by_slug))
                            .route(web::put().to(posts::update))
                            .route(web::delete().to(posts::delete)),
                    ),
            ),
    );
}
