/// Authentication handlers
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::Result;
use crate::middleware::UserId;
use crate::response::{created, ok};
use crate::services::{AuthService, UserService};
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    pub username: String,
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,
    pub password: String,
    #[validate(length(max = 50, message = "Display name must be at most 50 characters"))]
    pub display_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email or username is required"))]
    pub identifier: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1, message = "refresh_token is required"))]
    pub refresh_token: String,
}

/// POST /api/v1/auth/register
pub async fn register(
    state: web::Data<AppState>,
    payload: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    payload.validate()?;

    let auth = AuthService::new(&state)
        .register(
            &payload.username,
            &payload.email,
            &payload.password,
            payload.display_name.as_deref(),
        )
        .await?;

    Ok(created("Account created", auth))
}

/// POST /api/v1/auth/login
pub async fn login(
    state: web::Data<AppState>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    payload.validate()?;

    let auth = AuthService::new(&state)
        .login(&payload.identifier, &payload.password)
        .await?;

    Ok(ok("Logged in", auth))
}

/// POST /api/v1/auth/refresh
pub async fn refresh(
    state: web::Data<AppState>,
    payload: web::Json<RefreshTokenRequest>,
) -> Result<HttpResponse> {
    payload.validate()?;

    let tokens = AuthService::new(&state)
        .refresh(&payload.refresh_token)
        .await?;

    Ok(ok("Token refreshed", tokens))
}

/// GET /api/v1/auth/me
pub async fn me(state: web::Data<AppState>, user_id: UserId) -> Result<HttpResponse> {
    let account = UserService::new(&state).account(user_id.0).await?;
    Ok(ok("Current user", account))
}
