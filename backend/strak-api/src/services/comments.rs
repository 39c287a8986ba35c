/// Comment service - threaded comments on posts
use sqlx::PgPool;
use uuid::Uuid;

use crate::cache::ContentCache;
use crate::db::{comment_repo, post_repo};
use crate::error::{AppError, Result};
use crate::middleware::{check_comment_deletion, check_comment_edit};
use crate::models::{Comment, MAX_COMMENT_CHARS};
use crate::response::{Page, PageRequest};
use crate::state::AppState;

pub struct CommentService {
    pool: PgPool,
    cache: ContentCache,
}

impl CommentService {
    pub fn new(state: &AppState) -> Self {
        Self {
            pool: state.db.clone(),
            cache: state.cache.clone(),
        }
    }

    pub async fn list_comments(
        &self,
        viewer: Option<Uuid>,
        post_id: Uuid,
        request: PageRequest,
    ) -> Result<Page<Comment>> {
        self.ensure_post_visible(viewer, post_id).await?;
        let (rows, total) =
            comment_repo::list_top_level(&self.pool, post_id, request.limit(), request.offset())
                .await?;
        Ok(Page::new(rows.into_iter().map(Comment::from).collect(), request, total))
    }

    pub async fn list_replies(
        &self,
        viewer: Option<Uuid>,
        comment_id: Uuid,
        request: PageRequest,
    ) -> Result<Page<Comment>> {
        let post_id = comment_repo::find_live_post_id(&self.pool, comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;
        self.ensure_post_visible(viewer, post_id).await?;

        let (rows, total) =
            comment_repo::list_replies(&self.pool, comment_id, request.limit(), request.offset())
                .await?;
        Ok(Page::new(rows.into_iter().map(Comment::from).collect(), request, total))
    }

    pub async fn create_comment(
        &self,
        author_id: Uuid,
        post_id: Uuid,
        parent_id: Option<Uuid>,
        content: &str,
    ) -> Result<Comment> {
        let content = validate_content(content)?;
        self.ensure_post_visible(Some(author_id), post_id).await?;

        if let Some(parent_id) = parent_id {
            match comment_repo::find_reply_target(&self.pool, parent_id).await? {
                Some(parent_post) if parent_post == post_id => {}
                _ => {
                    return Err(AppError::BadRequest(
                        "Parent comment does not exist on this post".to_string(),
                    ))
                }
            }
        }

        let comment_id =
            comment_repo::create_comment(&self.pool, post_id, author_id, parent_id, content)
                .await?;
        self.cache.invalidate_post(post_id).await;
        tracing::info!(%author_id, %post_id, %comment_id, reply = parent_id.is_some(), "comment created");

        self.load(comment_id).await
    }

    pub async fn update_comment(
        &self,
        user_id: Uuid,
        comment_id: Uuid,
        content: &str,
    ) -> Result<Comment> {
        let content = validate_content(content)?;
        let ownership = comment_repo::find_ownership(&self.pool, comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;
        check_comment_edit(user_id, &ownership)?;

        comment_repo::update_content(&self.pool, comment_id, content).await?;
        self.load(comment_id).await
    }

    pub async fn delete_comment(&self, user_id: Uuid, comment_id: Uuid) -> Result<()> {
        let ownership = comment_repo::find_ownership(&self.pool, comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;
        check_comment_deletion(user_id, &ownership)?;

        if comment_repo::soft_delete(&self.pool, comment_id).await? {
            self.cache.invalidate_post(ownership.post_id).await;
            tracing::info!(%user_id, %comment_id, post_id = %ownership.post_id, "comment deleted");
        }
        Ok(())
    }

    async fn ensure_post_visible(&self, viewer: Option<Uuid>, post_id: Uuid) -> Result<()> {
        post_repo::find_visible_owner(&self.pool, viewer, post_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))
    }

    async fn load(&self, comment_id: Uuid) -> Result<Comment> {
        comment_repo::find_comment(&self.pool, comment_id)
            .await?
            .map(Comment::from)
            .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))
    }
}

fn validate_content(content: &str) -> Result<&str> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::Validation(
            "Comment must not be empty".to_string(),
        ));
    }
    if content.chars().count() > MAX_COMMENT_CHARS {
        return Err(AppError::Validation(format!(
            "Comment must be at most {MAX_COMMENT_CHARS} characters"
        )));
    }
    Ok(content)
}
