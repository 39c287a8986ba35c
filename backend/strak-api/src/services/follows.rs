/// Follow service - follow/unfollow and relationship listings
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::cache::ContentCache;
use crate::db::{follow_repo, user_repo};
use crate::error::{AppError, Result};
use crate::models::UserCard;
use crate::response::{Page, PageRequest};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct FollowState {
    pub following: bool,
    pub followers_count: i64,
}

pub struct FollowService {
    pool: PgPool,
    cache: ContentCache,
}

impl FollowService {
    pub fn new(state: &AppState) -> Self {
        Self {
            pool: state.db.clone(),
            cache: state.cache.clone(),
        }
    }

    /// Idempotent.
    pub async fn follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<FollowState> {
        if follower_id == followee_id {
            return Err(AppError::BadRequest("You cannot follow yourself".to_string()));
        }
        self.ensure_user(followee_id).await?;

        if follow_repo::follow(&self.pool, follower_id, followee_id).await? {
            tracing::info!(%follower_id, %followee_id, "user followed");
            self.cache
                .invalidate_profiles(&[follower_id, followee_id])
                .await;
        }

        Ok(FollowState {
            following: true,
            followers_count: follow_repo::followers_count(&self.pool, followee_id).await?,
        })
    }

    /// Idempotent. Also drops the account from the caller's "users" lists,
    /// which may only hold followed accounts.
    pub async fn unfollow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<FollowState> {
        if follower_id == followee_id {
            return Err(AppError::BadRequest(
                "You cannot unfollow yourself".to_string(),
            ));
        }
        self.ensure_user(followee_id).await?;

        let mut tx = self.pool.begin().await?;
        let removed = follow_repo::unfollow(&mut tx, follower_id, followee_id).await?;
        let pruned = follow_repo::remove_from_owner_lists(&mut tx, follower_id, followee_id).await?;
        tx.commit().await?;

        if removed {
            tracing::info!(%follower_id, %followee_id, pruned_list_entries = pruned, "user unfollowed");
            self.cache
                .invalidate_profiles(&[follower_id, followee_id])
                .await;
        }

        Ok(FollowState {
            following: false,
            followers_count: follow_repo::followers_count(&self.pool, followee_id).await?,
        })
    }

    pub async fn followers(
        &self,
        viewer: Option<Uuid>,
        user_id: Uuid,
        request: PageRequest,
    ) -> Result<Page<UserCard>> {
        self.ensure_user(user_id).await?;
        let (users, total) = follow_repo::list_followers(
            &self.pool,
            viewer,
            user_id,
            request.limit(),
            request.offset(),
        )
        .await?;
        Ok(Page::new(users, request, total))
    }

    pub async fn following(
        &self,
        viewer: Option<Uuid>,
        user_id: Uuid,
        request: PageRequest,
    ) -> Result<Page<UserCard>> {
        self.ensure_user(user_id).await?;
        let (users, total) = follow_repo::list_following(
            &self.pool,
            viewer,
            user_id,
            request.limit(),
            request.offset(),
        )
        .await?;
        Ok(Page::new(users, request, total))
    }

    async fn ensure_user(&self, user_id: Uuid) -> Result<()> {
        if user_repo::exists_active(&self.pool, user_id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("User not found".to_string()))
        }
    }
}
