use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::user::UserSummary;

pub const MAX_COMMENT_CHARS: usize = 1000;
pub const DELETED_PLACEHOLDER: &str = "[deleted]";

#[derive(Debug, Clone, FromRow)]
pub struct CommentRow {
    pub id: Uuid,
    pub post_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub author_id: Uuid,
    pub author_username: String,
    pub author_display_name: Option<String>,
    pub author_avatar_url: Option<String>,
    pub content: String,
    pub reply_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub parent_id: Option<Uuid>,
    /// Hidden once the comment is deleted
    pub author: Option<UserSummary>,
    pub content: String,
    pub reply_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted: bool,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        let deleted = row.deleted_at.is_some();
        let author = (!deleted).then(|| UserSummary {
            id: row.author_id,
            username: row.author_username,
            display_name: row.author_display_name,
            avatar_url: row.author_avatar_url,
        });

        Self {
            id: row.id,
            post_id: row.post_id,
            parent_id: row.parent_id,
            author,
            content: if deleted {
                DELETED_PLACEHOLDER.to_string()
            } else {
                row.content
            },
            reply_count: row.reply_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted,
        }
    }
}

/// Fields needed to authorize comment edits and deletes.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct CommentOwnership {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub post_author_id: Uuid,
}
