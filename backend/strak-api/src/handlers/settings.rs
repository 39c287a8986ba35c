/// Settings handlers - preferences, password and account deletion
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::settings_repo::SettingsChanges;
use crate::error::Result;
use crate::middleware::UserId;
use crate::response::{done, ok};
use crate::services::SettingsService;
use crate::state::AppState;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateSettingsRequest {
    pub is_private: Option<bool>,
    pub email_notifications: Option<bool>,
    pub push_notifications: Option<bool>,
    pub show_activity_status: Option<bool>,
    pub language: Option<String>,
}

impl UpdateSettingsRequest {
    fn into_parts(self) -> (Option<bool>, SettingsChanges) {
        let changes = SettingsChanges {
            email_notifications: self.email_notifications,
            push_notifications: self.push_notifications,
            show_activity_status: self.show_activity_status,
            language: self.language.map(|l| l.trim().to_string()),
        };
        (self.is_private, changes)
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct DeleteAccountRequest {
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// GET /api/v1/settings
pub async fn get_settings(state: web::Data<AppState>, user_id: UserId) -> Result<HttpResponse> {
    let settings = SettingsService::new(&state).get_settings(user_id.0).await?;
    Ok(ok("Settings retrieved", settings))
}

/// PATCH /api/v1/settings
pub async fn update_settings(
    state: web::Data<AppState>,
    user_id: UserId,
    payload: web::Json<UpdateSettingsRequest>,
) -> Result<HttpResponse> {
    let (is_private, changes) = payload.into_inner().into_parts();
    let settings = SettingsService::new(&state)
        .update_settings(user_id.0, is_private, changes)
        .await?;
    Ok(ok("Settings updated", settings))
}

/// PUT /api/v1/settings/password
pub async fn change_password(
    state: web::Data<AppState>,
    user_id: UserId,
    payload: web::Json<ChangePasswordRequest>,
) -> Result<HttpResponse> {
    payload.validate()?;

    SettingsService::new(&state)
        .change_password(user_id.0, &payload.current_password, &payload.new_password)
        .await?;
    Ok(done("Password changed"))
}

/// DELETE /api/v1/settings/account
pub async fn delete_account(
    state: web::Data<AppState>,
    user_id: UserId,
    payload: web::Json<DeleteAccountRequest>,
) -> Result<HttpResponse> {
    payload.validate()?;

    SettingsService::new(&state)
        .delete_account(user_id.0, &payload.password)
        .await?;
    Ok(done("Account deleted"))
}
