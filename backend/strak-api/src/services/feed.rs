/// Feed service - chronological home feed and public discovery feed
use uuid::Uuid;

use crate::db::post_repo;
use crate::error::Result;
use crate::models::Post;
use crate::response::{Page, PageRequest};
use crate::services::posts::PostService;
use crate::state::AppState;

pub struct FeedService {
    state: AppState,
}

impl FeedService {
    pub fn new(state: &AppState) -> Self {
        Self {
            state: state.clone(),
        }
    }

    /// Posts by followed accounts plus the viewer's own, newest first.
    pub async fn home(&self, user_id: Uuid, request: PageRequest) -> Result<Page<Post>> {
        let (rows, total) =
            post_repo::home_feed(&self.state.db, user_id, request.limit(), request.offset())
                .await?;
        tracing::debug!(%user_id, page = request.page, returned = rows.len(), total, "home feed served");
        PostService::new(&self.state)
            .hydrate_page(rows, request, total)
            .await
    }

    /// Recent posts from public accounts.
    pub async fn explore(&self, viewer: Option<Uuid>, request: PageRequest) -> Result<Page<Post>> {
        let (rows, total) =
            post_repo::explore(&self.state.db, viewer, request.limit(), request.offset()).await?;
        PostService::new(&self.state)
            .hydrate_page(rows, request, total)
            .await
    }
}
