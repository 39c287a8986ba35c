//! HTTP tests for authentication, validation and routing paths that are
//! decided before any query runs. The database pool is lazy and never
//! reachable, so no container is needed.

mod common;

use actix_web::{test, web, App};
use serde_json::json;
use uuid::Uuid;

use common::{access_token, bearer, envelope, lazy_pool, refresh_token, state_with};
use strak_api::routes;

macro_rules! app {
    () => {{
        crypto_core::testing::init_test_keys();
        let pool = lazy_pool();
        test::init_service(
            App::new()
                .app_data(web::Data::new(state_with(pool.clone())))
                .configure(routes::configure(pool))
                .default_service(web::route().to(routes::not_found)),
        )
        .await
    }};
}

#[actix_web::test]
async fn liveness_probe_is_public() {
    let app = app!();
    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/v1/health/live").to_request(),
    )
    .await;
    let (status, body) = envelope(resp).await;
    assert_eq!(status, 200);
    assert_eq!(body["alive"], true);
}

#[actix_web::test]
async fn metrics_are_exposed_in_text_format() {
    let app = app!();
    let resp = test::call_service(&app, test::TestRequest::get().uri("/metrics").to_request()).await;
    assert_eq!(resp.status().as_u16(), 200);
}

#[actix_web::test]
async fn protected_endpoint_without_token_returns_401() {
    let app = app!();
    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/v1/feed").to_request())
        .await;
    let (status, body) = envelope(resp).await;
    assert_eq!(status, 401);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Authentication required");
}

#[actix_web::test]
async fn garbage_token_returns_401_even_on_public_endpoint() {
    let app = app!();
    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/explore")
            .insert_header(bearer("not-a-jwt"))
            .to_request(),
    )
    .await;
    let (status, body) = envelope(resp).await;
    assert_eq!(status, 401);
    assert_eq!(body["message"], "Invalid or expired token");
}

#[actix_web::test]
async fn refresh_token_cannot_be_used_as_access_token() {
    let app = app!();
    let token = refresh_token(Uuid::new_v4());
    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/settings")
            .insert_header(bearer(&token))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status().as_u16(), 401);
}

#[actix_web::test]
async fn non_bearer_scheme_returns_401() {
    let app = app!();
    let token = access_token(Uuid::new_v4());
    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/feed")
            .insert_header(("Authorization", format!("Token {token}")))
            .to_request(),
    )
    .await;
    let (status, body) = envelope(resp).await;
    assert_eq!(status, 401);
    assert_eq!(body["message"], "Invalid Authorization scheme");
}

#[actix_web::test]
async fn register_invalid_email_returns_400() {
    let app = app!();
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(json!({
                "username": "valid_user",
                "email": "invalid",
                "password": "SecurePass123"
            }))
            .to_request(),
    )
    .await;
    let (status, body) = envelope(resp).await;
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn register_weak_password_returns_400() {
    let app = app!();
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(json!({
                "username": "valid_user",
                "email": "user@example.com",
                "password": "weakpass"
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status().as_u16(), 400);
}

#[actix_web::test]
async fn register_invalid_username_returns_400() {
    let app = app!();
    for username in ["ab", "has space", "dash-name", &"x".repeat(31)] {
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/auth/register")
                .set_json(json!({
                    "username": username,
                    "email": "user@example.com",
                    "password": "SecurePass123"
                }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status().as_u16(), 400, "username {username:?}");
    }
}

#[actix_web::test]
async fn login_with_empty_identifier_returns_400() {
    let app = app!();
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(json!({ "identifier": "", "password": "whatever" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status().as_u16(), 400);
}

#[actix_web::test]
async fn refresh_with_access_token_returns_401() {
    let app = app!();
    let token = access_token(Uuid::new_v4());
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/auth/refresh")
            .set_json(json!({ "refresh_token": token }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status().as_u16(), 401);
}

#[actix_web::test]
async fn malformed_json_uses_error_envelope() {
    let app = app!();
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .insert_header(("Content-Type", "application/json"))
            .set_payload("{not json")
            .to_request(),
    )
    .await;
    let (status, body) = envelope(resp).await;
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
    assert!(body["message"]
        .as_str()
        .unwrap_or_default()
        .starts_with("Invalid JSON body"));
}

#[actix_web::test]
async fn invalid_path_id_returns_400() {
    let app = app!();
    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/v1/posts/not-a-uuid").to_request(),
    )
    .await;
    let (status, body) = envelope(resp).await;
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn blank_search_query_returns_400() {
    let app = app!();
    for uri in ["/api/v1/search/users?q=%20%20", "/api/v1/search/posts", "/api/v1/search/users?q="] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status().as_u16(), 400, "{uri}");
    }
}

#[actix_web::test]
async fn overlong_search_query_returns_400() {
    let app = app!();
    let uri = format!("/api/v1/search/posts?q={}", "a".repeat(101));
    let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(resp.status().as_u16(), 400);
}

#[actix_web::test]
async fn suggestions_require_authentication() {
    let app = app!();
    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/v1/search/suggested").to_request(),
    )
    .await;
    assert_eq!(resp.status().as_u16(), 401);
}

#[actix_web::test]
async fn uploads_require_authentication() {
    let app = app!();
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/media")
            .insert_header(("Content-Type", "multipart/form-data; boundary=x"))
            .set_payload("--x--\r\n")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status().as_u16(), 401);
}

#[actix_web::test]
async fn unknown_route_returns_404_envelope() {
    let app = app!();
    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/v1/nope").to_request(),
    )
    .await;
    let (status, body) = envelope(resp).await;
    assert_eq!(status, 404);
    assert_eq!(body["message"], "Route not found");
}
