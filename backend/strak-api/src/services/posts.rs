/// Post service - creation, retrieval, editing, media ordering and likes
use sqlx::PgPool;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::cache::ContentCache;
use crate::db::{like_repo, media_repo, post_repo, user_repo};
use crate::error::{AppError, Result};
use crate::middleware::check_post_ownership;
use crate::models::{LikeState, MediaItem, Post, PostOwner, PostRow, MAX_POST_CHARS, MAX_POST_MEDIA};
use crate::response::{Page, PageRequest};
use crate::state::AppState;

pub struct PostService {
    pool: PgPool,
    cache: ContentCache,
    media_base_url: String,
}

impl PostService {
    pub fn new(state: &AppState) -> Self {
        Self {
            pool: state.db.clone(),
            cache: state.cache.clone(),
            media_base_url: state.media.public_base_url().to_string(),
        }
    }

    /// Attach ordered media to post rows.
    pub async fn hydrate(&self, rows: Vec<PostRow>) -> Result<Vec<Post>> {
        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let records = media_repo::list_for_posts(&self.pool, &ids).await?;

        let mut by_post: HashMap<Uuid, Vec<MediaItem>> = HashMap::new();
        for record in &records {
            if let Some(post_id) = record.post_id {
                by_post
                    .entry(post_id)
                    .or_default()
                    .push(MediaItem::from_record(record, &self.media_base_url));
            }
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let media = by_post.remove(&row.id).unwrap_or_default();
                Post::from_row(row, media)
            })
            .collect())
    }

    pub async fn hydrate_page(
        &self,
        rows: Vec<PostRow>,
        request: PageRequest,
        total: i64,
    ) -> Result<Page<Post>> {
        Ok(Page::new(self.hydrate(rows).await?, request, total))
    }

    /// Read-through: the cached copy is viewer independent, so visibility
    /// and `liked_by_me` are always resolved for the current viewer.
    pub async fn get_post(&self, viewer: Option<Uuid>, post_id: Uuid) -> Result<Post> {
        let not_found = || AppError::NotFound("Post not found".to_string());

        let mut post = match self.cache.get_post(post_id).await {
            Some(post) => post,
            None => {
                let ticket = self.cache.post_ticket(post_id).await;
                let row = post_repo::find_post(&self.pool, None, post_id)
                    .await?
                    .ok_or_else(not_found)?;
                let post = self
                    .hydrate(vec![row])
                    .await?
                    .pop()
                    .ok_or_else(not_found)?;
                if let Some(ticket) = ticket {
                    self.cache.set_post(&post, ticket).await;
                }
                post
            }
        };

        match user_repo::can_view_content(&self.pool, viewer, post.author.id).await? {
            Some(true) => {}
            _ => return Err(not_found()),
        }

        post.liked_by_me = match viewer {
            Some(viewer) => like_repo::is_liked(&self.pool, viewer, post_id).await?,
            None => false,
        };
        Ok(post)
    }

    pub async fn create_post(
        &self,
        author_id: Uuid,
        content: Option<&str>,
        media_ids: &[Uuid],
    ) -> Result<Post> {
        let content = content.map(str::trim).unwrap_or_default();
        validate_content(content, media_ids.len())?;
        if media_ids.len() > MAX_POST_MEDIA {
            return Err(AppError::Validation(format!(
                "A post can have at most {MAX_POST_MEDIA} media items"
            )));
        }
        ensure_unique(media_ids)?;

        let mut tx = self.pool.begin().await?;
        let post_id = post_repo::create_post(&mut tx, author_id, content).await?;

        if !media_ids.is_empty() {
            let records = media_repo::lock_many(&mut tx, media_ids).await?;
            let usable = records.len() == media_ids.len()
                && records
                    .iter()
                    .all(|m| m.owner_id == author_id && m.post_id.is_none());
            if !usable {
                return Err(AppError::BadRequest(
                    "Media must be your own uploads and not attached to another post".to_string(),
                ));
            }
            media_repo::attach(&mut tx, post_id, media_ids).await?;
        }
        tx.commit().await?;

        tracing::info!(%author_id, %post_id, media = media_ids.len(), "post created");
        self.cache.invalidate_profiles(&[author_id]).await;

        self.fetch(author_id, post_id).await
    }

    pub async fn update_post(&self, user_id: Uuid, post_id: Uuid, content: &str) -> Result<Post> {
        let owner = self.owned_post(user_id, post_id, "edit").await?;

        let content = content.trim();
        let media = media_repo::list_for_posts(&self.pool, &[owner.id]).await?;
        validate_content(content, media.len())?;

        if !post_repo::update_content(&self.pool, post_id, content).await? {
            return Err(AppError::NotFound("Post not found".to_string()));
        }
        self.cache.invalidate_post(post_id).await;
        tracing::info!(%user_id, %post_id, "post edited");

        self.fetch(user_id, post_id).await
    }

    pub async fn delete_post(&self, user_id: Uuid, post_id: Uuid) -> Result<()> {
        self.owned_post(user_id, post_id, "delete").await?;

        let mut tx = self.pool.begin().await?;
        let deleted = post_repo::soft_delete_post(&mut tx, post_id).await?;
        tx.commit().await?;

        if !deleted {
            return Err(AppError::NotFound("Post not found".to_string()));
        }

        self.cache.invalidate_post(post_id).await;
        self.cache.invalidate_profiles(&[user_id]).await;
        tracing::info!(%user_id, %post_id, "post deleted");
        Ok(())
    }

    /// `media_ids` must be a permutation of the currently attached media.
    pub async fn reorder_media(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        media_ids: &[Uuid],
    ) -> Result<Post> {
        self.owned_post(user_id, post_id, "edit").await?;
        ensure_unique(media_ids)?;

        let mut tx = self.pool.begin().await?;
        let current = media_repo::ids_for_post(&mut tx, post_id).await?;
        if !is_permutation(&current, media_ids) {
            return Err(AppError::BadRequest(
                "media_ids must list exactly the post's current media".to_string(),
            ));
        }
        media_repo::attach(&mut tx, post_id, media_ids).await?;
        tx.commit().await?;

        self.cache.invalidate_post(post_id).await;
        self.fetch(user_id, post_id).await
    }

    pub async fn like(&self, user_id: Uuid, post_id: Uuid) -> Result<LikeState> {
        self.visible_post(user_id, post_id).await?;
        if like_repo::like(&self.pool, user_id, post_id).await? {
            self.cache.invalidate_post(post_id).await;
        }
        Ok(LikeState {
            liked: true,
            like_count: like_repo::count(&self.pool, post_id).await?,
        })
    }

    pub async fn unlike(&self, user_id: Uuid, post_id: Uuid) -> Result<LikeState> {
        self.visible_post(user_id, post_id).await?;
        if like_repo::unlike(&self.pool, user_id, post_id).await? {
            self.cache.invalidate_post(post_id).await;
        }
        Ok(LikeState {
            liked: false,
            like_count: like_repo::count(&self.pool, post_id).await?,
        })
    }

    /// Posts of one account. Private accounts are readable by followers only.
    pub async fn list_user_posts(
        &self,
        viewer: Option<Uuid>,
        user_id: Uuid,
        request: PageRequest,
    ) -> Result<Page<Post>> {
        match user_repo::can_view_content(&self.pool, viewer, user_id).await? {
            None => return Err(AppError::NotFound("User not found".to_string())),
            Some(false) => {
                return Err(AppError::Forbidden("This account is private".to_string()))
            }
            Some(true) => {}
        }

        let (rows, total) =
            post_repo::list_by_author(&self.pool, viewer, user_id, request.limit(), request.offset())
                .await?;
        self.hydrate_page(rows, request, total).await
    }

    pub(crate) async fn visible_post(&self, viewer: Uuid, post_id: Uuid) -> Result<PostOwner> {
        post_repo::find_visible_owner(&self.pool, Some(viewer), post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))
    }

    async fn owned_post(&self, user_id: Uuid, post_id: Uuid, action: &str) -> Result<PostOwner> {
        let owner = post_repo::find_owner(&self.pool, post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;
        check_post_ownership(user_id, &owner, action)?;
        Ok(owner)
    }

    /// Fresh read for the author right after a write.
    async fn fetch(&self, viewer: Uuid, post_id: Uuid) -> Result<Post> {
        let row = post_repo::find_post(&self.pool, Some(viewer), post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;
        self.hydrate(vec![row])
            .await?
            .pop()
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))
    }
}

fn validate_content(content: &str, media_count: usize) -> Result<()> {
    if content.chars().count() > MAX_POST_CHARS {
        return Err(AppError::Validation(format!(
            "Post content must be at most {MAX_POST_CHARS} characters"
        )));
    }
    if content.is_empty() && media_count == 0 {
        return Err(AppError::Validation(
            "A post needs text or at least one image".to_string(),
        ));
    }
    Ok(())
}

fn ensure_unique(ids: &[Uuid]) -> Result<()> {
    let unique: HashSet<&Uuid> = ids.iter().collect();
    if unique.len() == ids.len() {
        Ok(())
    } else {
        Err(AppError::Validation(
            "media_ids must not contain duplicates".to_string(),
        ))
    }
}

fn is_permutation(current: &[Uuid], proposed: &[Uuid]) -> bool {
    if current.len() != proposed.len() {
        return false;
    }
    let current: HashSet<&Uuid> = current.iter().collect();
    proposed.iter().all(|id| current.contains(id))
}
