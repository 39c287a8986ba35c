/// Settings service - preferences, privacy, password change and account deletion
use crypto_core::{check_password_policy, hash_password, verify_password};
use sqlx::PgPool;
use uuid::Uuid;

use crate::cache::ContentCache;
use crate::db::settings_repo::{self, SettingsChanges};
use crate::db::user_repo;
use crate::error::{AppError, Result};
use crate::models::{Settings, User};
use crate::state::AppState;
use crate::validators::validate_language;

pub struct SettingsService {
    pool: PgPool,
    cache: ContentCache,
}

impl SettingsService {
    pub fn new(state: &AppState) -> Self {
        Self {
            pool: state.db.clone(),
            cache: state.cache.clone(),
        }
    }

    /// The row is created lazily for accounts that predate it.
    pub async fn get_settings(&self, user_id: Uuid) -> Result<Settings> {
        if let Some(settings) = settings_repo::get(&self.pool, user_id).await? {
            return Ok(settings);
        }
        settings_repo::ensure_defaults(&self.pool, user_id).await?;
        settings_repo::get(&self.pool, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn update_settings(
        &self,
        user_id: Uuid,
        is_private: Option<bool>,
        changes: SettingsChanges,
    ) -> Result<Settings> {
        if let Some(language) = changes.language.as_deref() {
            validate_language(language)?;
        }

        let current = self.get_settings(user_id).await?;
        let privacy_changed = is_private.is_some_and(|p| p != current.is_private);

        if !privacy_changed && changes.is_empty() {
            return Ok(current);
        }

        let mut tx = self.pool.begin().await?;
        if let Some(is_private) = is_private.filter(|_| privacy_changed) {
            user_repo::set_private(&mut tx, user_id, is_private).await?;
        }
        if !changes.is_empty() {
            settings_repo::update(&mut tx, user_id, &changes).await?;
        }
        tx.commit().await?;

        if privacy_changed {
            self.cache.invalidate_profiles(&[user_id]).await;
            tracing::info!(%user_id, ?is_private, "account privacy changed");
        }

        self.get_settings(user_id).await
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<()> {
        check_password_policy(new_password)?;
        let user = self.verified_user(user_id, current_password).await?;
        if current_password == new_password {
            return Err(AppError::Validation(
                "New password must differ from the current one".to_string(),
            ));
        }

        let password_hash = hash_password(new_password)?;
        user_repo::update_password(&self.pool, user.id, &password_hash).await?;
        tracing::info!(%user_id, "password changed");
        Ok(())
    }

    /// Soft delete: the account disappears from profiles, search, follows
    /// and feeds, and its tokens are refused by the auth middleware.
    pub async fn delete_account(&self, user_id: Uuid, password: &str) -> Result<()> {
        let user = self.verified_user(user_id, password).await?;

        let mut tx = self.pool.begin().await?;
        let (touched_posts, affected_users) = user_repo::soft_delete_account(&mut tx, user.id).await?;
        tx.commit().await?;

        let mut profiles = affected_users;
        profiles.push(user.id);
        self.cache.invalidate_profiles(&profiles).await;
        self.cache.invalidate_posts(&touched_posts).await;

        tracing::info!(%user_id, posts = touched_posts.len(), "account deleted");
        Ok(())
    }

    async fn verified_user(&self, user_id: Uuid, password: &str) -> Result<User> {
        let user = user_repo::find_active_by_id(&self.pool, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if verify_password(password, &user.password_hash)? {
            Ok(user)
        } else {
            Err(AppError::Unauthorized(
                "Current password is incorrect".to_string(),
            ))
        }
    }
}
