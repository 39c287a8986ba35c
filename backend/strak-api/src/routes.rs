//! Route configuration
//!
//! Health probes and `/metrics` sit outside the authenticated scope; every
//! other endpoint lives under `/api/v1` behind the JWT middleware, which
//! lets anonymous requests through for the public endpoints.

use actix_web::{error, web, HttpRequest, HttpResponse};
use sqlx::PgPool;

use crate::error::{AppError, Result};
use crate::handlers;
use crate::metrics::serve_metrics;
use crate::middleware::JwtAuthMiddleware;

const JSON_LIMIT_BYTES: usize = 64 * 1024;

/// Register every route. The pool backs the deleted-account check in the
/// auth middleware.
pub fn configure(pool: PgPool) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(json_config())
            .app_data(query_config())
            .app_data(path_config())
            .route("/metrics", web::get().to(serve_metrics))
            .route("/api/v1/health", web::get().to(handlers::health_check))
            .route("/api/v1/health/ready", web::get().to(handlers::readiness_check))
            .route("/api/v1/health/live", web::get().to(handlers::liveness_check))
            .service(
                web::scope("/api/v1")
                    .wrap(JwtAuthMiddleware::new(pool))
                    .configure(auth_routes)
                    .configure(user_routes)
                    .configure(feed_routes)
                    .configure(post_routes)
                    .configure(comment_routes)
                    .configure(list_routes)
                    .configure(search_routes)
                    .configure(settings_routes),
            );
    }
}

fn auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/register", web::post().to(handlers::register))
            .route("/login", web::post().to(handlers::login))
            .route("/refresh", web::post().to(handlers::refresh))
            .route("/me", web::get().to(handlers::me)),
    );
}

fn user_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .route("/me", web::patch().to(handlers::update_profile))
            .route("/{username}", web::get().to(handlers::get_profile))
            .route("/{id}/posts", web::get().to(handlers::get_user_posts))
            .route("/{id}/lists", web::get().to(handlers::get_user_lists))
            .service(
                web::resource("/{id}/follow")
                    .route(web::post().to(handlers::follow_user))
                    .route(web::delete().to(handlers::unfollow_user)),
            )
            .route("/{id}/followers", web::get().to(handlers::get_followers))
            .route("/{id}/following", web::get().to(handlers::get_following)),
    );
}

fn feed_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/feed", web::get().to(handlers::get_feed))
        .route("/explore", web::get().to(handlers::get_explore));
}

fn post_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/posts")
            .route("", web::post().to(handlers::create_post))
            .service(
                web::resource("/{id}")
                    .route(web::get().to(handlers::get_post))
                    .route(web::patch().to(handlers::update_post))
                    .route(web::delete().to(handlers::delete_post)),
            )
            .route("/{id}/media/order", web::put().to(handlers::reorder_media))
            .service(
                web::resource("/{id}/like")
                    .route(web::post().to(handlers::like_post))
                    .route(web::delete().to(handlers::unlike_post)),
            )
            .service(
                web::resource("/{id}/comments")
                    .route(web::get().to(handlers::get_comments))
                    .route(web::post().to(handlers::create_comment)),
            ),
    )
    .service(
        web::scope("/media")
            .route("", web::post().to(handlers::upload_media))
            .route("/{id}", web::get().to(handlers::get_media)),
    );
}

fn comment_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/comments")
            .service(
                web::resource("/{id}")
                    .route(web::patch().to(handlers::update_comment))
                    .route(web::delete().to(handlers::delete_comment)),
            )
            .route("/{id}/replies", web::get().to(handlers::get_replies)),
    );
}

fn list_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/lists")
            .service(
                web::resource("")
                    .route(web::get().to(handlers::get_my_lists))
                    .route(web::post().to(handlers::create_list)),
            )
            .service(
                web::resource("/{id}")
                    .route(web::get().to(handlers::get_list))
                    .route(web::patch().to(handlers::update_list))
                    .route(web::delete().to(handlers::delete_list)),
            )
            .service(
                web::resource("/{id}/members")
                    .route(web::get().to(handlers::get_members))
                    .route(web::post().to(handlers::add_member)),
            )
            .route(
                "/{id}/members/{member_id}",
                web::delete().to(handlers::remove_member),
            ),
    );
}

fn search_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/search")
            .route("/users", web::get().to(handlers::search_users))
            .route("/posts", web::get().to(handlers::search_posts))
            .route("/suggested", web::get().to(handlers::suggested_users)),
    );
}

fn settings_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/settings")
            .service(
                web::resource("")
                    .route(web::get().to(handlers::get_settings))
                    .route(web::patch().to(handlers::update_settings)),
            )
            .route("/password", web::put().to(handlers::change_password))
            .route("/account", web::delete().to(handlers::delete_account)),
    );
}

/// Fallback for unknown routes, registered as the app's default service.
pub async fn not_found() -> Result<HttpResponse> {
    Err(AppError::NotFound("Route not found".to_string()))
}

// Extractor failures use the same envelope as every other error.

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT_BYTES)
        .error_handler(|err, _req: &HttpRequest| {
            let message = match &err {
                error::JsonPayloadError::OverflowKnownLength { .. }
                | error::JsonPayloadError::Overflow { .. } => {
                    return AppError::PayloadTooLarge("Request body is too large".to_string())
                        .into()
                }
                error::JsonPayloadError::ContentType => {
                    "Content-Type must be application/json".to_string()
                }
                other => format!("Invalid JSON body: {other}"),
            };
            AppError::BadRequest(message).into()
        })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req: &HttpRequest| {
        AppError::BadRequest(format!("Invalid query parameters: {err}")).into()
    })
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req: &HttpRequest| {
        AppError::BadRequest(format!("Invalid path parameter: {err}")).into()
    })
}
