use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::media::MediaItem;
use super::user::UserSummary;

pub const MAX_POST_CHARS: usize = 2000;
pub const MAX_POST_MEDIA: usize = 10;

/// Post joined with its author and aggregate counts.
#[derive(Debug, Clone, FromRow)]
pub struct PostRow {
    pub id: Uuid,
    pub author_id: Uuid,
    pub author_username: String,
    pub author_display_name: Option<String>,
    pub author_avatar_url: Option<String>,
    pub content: String,
    pub like_count: i64,
    pub comment_count: i64,
    pub liked_by_me: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author: UserSummary,
    pub content: String,
    pub media: Vec<MediaItem>,
    pub like_count: i64,
    pub comment_count: i64,
    pub liked_by_me: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub edited: bool,
}

impl Post {
    pub fn from_row(row: PostRow, media: Vec<MediaItem>) -> Self {
        Self {
            id: row.id,
            author: UserSummary {
                id: row.author_id,
                username: row.author_username,
                display_name: row.author_display_name,
                avatar_url: row.author_avatar_url,
            },
            content: row.content,
            media,
            like_count: row.like_count,
            comment_count: row.comment_count,
            liked_by_me: row.liked_by_me,
            created_at: row.created_at,
            updated_at: row.updated_at,
            edited: row.edited_at.is_some(),
        }
    }
}

/// Minimal post identity used for ownership checks.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct PostOwner {
    pub id: Uuid,
    pub author_id: Uuid,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct LikeState {
    pub liked: bool,
    pub like_count: i64,
}
