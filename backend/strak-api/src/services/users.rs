/// Profile service - public profiles, the caller's own account and edits
use sqlx::PgPool;
use uuid::Uuid;

use crate::cache::ContentCache;
use crate::db::user_repo::{self, ProfileChanges};
use crate::db::post_repo;
use crate::error::{AppError, Result};
use crate::models::{AccountProfile, Profile, ProfileView};
use crate::state::AppState;

pub struct UserService {
    pool: PgPool,
    cache: ContentCache,
}

impl UserService {
    pub fn new(state: &AppState) -> Self {
        Self {
            pool: state.db.clone(),
            cache: state.cache.clone(),
        }
    }

    /// Cached profile without viewer-specific fields.
    pub async fn profile(&self, user_id: Uuid) -> Result<Profile> {
        if let Some(profile) = self.cache.get_profile(user_id).await {
            return Ok(profile);
        }

        let ticket = self.cache.profile_ticket(user_id).await;
        let profile = user_repo::get_profile(&self.pool, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        if let Some(ticket) = ticket {
            self.cache.set_profile(&profile, ticket).await;
        }
        Ok(profile)
    }

    pub async fn profile_by_username(
        &self,
        viewer: Option<Uuid>,
        username: &str,
    ) -> Result<ProfileView> {
        let user_id = user_repo::find_active_id_by_username(&self.pool, username)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let profile = self.profile(user_id).await?;
        let (is_following, follows_you) = match viewer {
            Some(viewer) if viewer != user_id => {
                user_repo::relationship(&self.pool, viewer, user_id).await?
            }
            _ => (false, false),
        };

        Ok(ProfileView {
            profile,
            is_following,
            follows_you,
        })
    }

    pub async fn account(&self, user_id: Uuid) -> Result<AccountProfile> {
        let user = user_repo::find_active_by_id(&self.pool, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        let profile = self.profile(user_id).await?;
        Ok(AccountProfile {
            profile,
            email: user.email,
        })
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        changes: ProfileChanges,
    ) -> Result<AccountProfile> {
        if !changes.is_empty() {
            if !user_repo::update_profile(&self.pool, user_id, &changes).await? {
                return Err(AppError::NotFound("User not found".to_string()));
            }
            self.cache.invalidate_profiles(&[user_id]).await;

            // cached posts embed the author summary
            if changes.display_name.is_some() || changes.avatar_url.is_some() {
                let post_ids = post_repo::ids_by_author(&self.pool, user_id).await?;
                self.cache.invalidate_posts(&post_ids).await;
            }
            tracing::info!(%user_id, "profile updated");
        }

        self.account(user_id).await
    }
}
