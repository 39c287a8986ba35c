/// Authentication service - registration, login and token refresh
use crypto_core::jwt::{self, TokenPair, TokenType};
use crypto_core::{check_password_policy, hash_password, verify_password};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::user_repo;
use crate::error::{AppError, Result};
use crate::models::AuthPayload;
use crate::services::users::UserService;
use crate::state::AppState;
use crate::validators::{normalize_optional, validate_username};

const INVALID_CREDENTIALS: &str = "Invalid email/username or password";

pub struct AuthService {
    pool: PgPool,
    users: UserService,
}

impl AuthService {
    pub fn new(state: &AppState) -> Self {
        Self {
            pool: state.db.clone(),
            users: UserService::new(state),
        }
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<AuthPayload> {
        let username = username.trim();
        validate_username(username)?;
        let email = email.trim().to_lowercase();
        let display_name = normalize_optional(display_name);
        check_password_policy(password)?;

        if user_repo::username_taken(&self.pool, username).await? {
            return Err(AppError::Conflict("Username is already taken".to_string()));
        }
        if user_repo::email_taken(&self.pool, &email).await? {
            return Err(AppError::Conflict(
                "Email address is already registered".to_string(),
            ));
        }

        let password_hash = hash_password(password)?;

        let mut tx = self.pool.begin().await?;
        // concurrent registrations still hit the unique indexes -> 409
        let user = user_repo::create_user(
            &mut tx,
            username,
            &email,
            &password_hash,
            display_name.as_deref(),
        )
        .await?;
        tx.commit().await?;

        let tokens = issue_tokens(user.id, &user.username)?;
        info!(user_id = %user.id, username = %user.username, "user registered");

        Ok(AuthPayload {
            user: self.users.account(user.id).await?,
            tokens,
        })
    }

    pub async fn login(&self, identifier: &str, password: &str) -> Result<AuthPayload> {
        let identifier = identifier.trim();
        let user = user_repo::find_active_by_identifier(&self.pool, identifier)
            .await?
            .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        if !verify_password(password, &user.password_hash)? {
            warn!(user_id = %user.id, "failed login attempt");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let tokens = issue_tokens(user.id, &user.username)?;
        info!(user_id = %user.id, "user logged in");

        Ok(AuthPayload {
            user: self.users.account(user.id).await?,
            tokens,
        })
    }

    /// Exchange a refresh token for a new pair. Access tokens are rejected.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        let claims = jwt::validate_token_of_type(refresh_token, TokenType::Refresh)
            .map_err(|_| AppError::Unauthorized("Invalid or expired refresh token".to_string()))?;
        let user_id = claims
            .user_id()
            .map_err(|_| AppError::Unauthorized("Invalid or expired refresh token".to_string()))?;

        let user = user_repo::find_active_by_id(&self.pool, user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))?;

        issue_tokens(user.id, &user.username)
    }
}

fn issue_tokens(user_id: Uuid, username: &str) -> Result<TokenPair> {
    jwt::generate_token_pair(user_id, username)
        .map_err(|e| AppError::Internal(format!("Failed to issue tokens: {e}")))
}
