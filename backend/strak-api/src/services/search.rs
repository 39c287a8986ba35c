/// Search service - user and post search plus follow suggestions
use uuid::Uuid;

use crate::db::{post_repo, user_repo};
use crate::error::Result;
use crate::models::{Post, UserCard};
use crate::response::{Page, PageRequest};
use crate::services::posts::PostService;
use crate::state::AppState;
use crate::validators::{escape_like, normalize_search_query};

pub struct SearchService {
    state: AppState,
}

impl SearchService {
    pub fn new(state: &AppState) -> Self {
        Self {
            state: state.clone(),
        }
    }

    pub async fn search_users(
        &self,
        viewer: Option<Uuid>,
        raw_query: &str,
        request: PageRequest,
    ) -> Result<Page<UserCard>> {
        let query = normalize_search_query(raw_query)?;
        let pattern = escape_like(&query);

        let (users, total) = user_repo::search_users(
            &self.state.db,
            viewer,
            &query,
            &pattern,
            request.limit(),
            request.offset(),
        )
        .await?;
        Ok(Page::new(users, request, total))
    }

    pub async fn search_posts(
        &self,
        viewer: Option<Uuid>,
        raw_query: &str,
        request: PageRequest,
    ) -> Result<Page<Post>> {
        let query = normalize_search_query(raw_query)?;
        let pattern = escape_like(&query);

        let (rows, total) = post_repo::search(
            &self.state.db,
            viewer,
            &pattern,
            request.limit(),
            request.offset(),
        )
        .await?;
        PostService::new(&self.state)
            .hydrate_page(rows, request, total)
            .await
    }

    /// Friends-of-friends first, topped up with the most-followed accounts.
    pub async fn suggested(&self, user_id: Uuid, limit: u32) -> Result<Vec<UserCard>> {
        let limit = i64::from(limit);
        let mut users = user_repo::suggested_users(&self.state.db, user_id, limit).await?;

        let missing = limit - users.len() as i64;
        if missing > 0 {
            let exclude: Vec<Uuid> = users.iter().map(|u| u.id).collect();
            let popular =
                user_repo::popular_users(&self.state.db, user_id, &exclude, missing).await?;
            users.extend(popular);
        }

        tracing::debug!(%user_id, returned = users.len(), "suggestions served");
        Ok(users)
    }
}
