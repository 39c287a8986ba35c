use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{CommentOwnership, CommentRow};

const COMMENT_COLUMNS: &str = r#"
    c.id, c.post_id, c.parent_id, c.author_id,
    u.username AS author_username,
    u.display_name AS author_display_name,
    u.avatar_url AS author_avatar_url,
    c.content, c.created_at, c.updated_at, c.deleted_at,
    (SELECT COUNT(*) FROM comments r WHERE r.parent_id = c.id AND r.deleted_at IS NULL) AS reply_count
"#;

/// Live comments, plus deleted ones with a live comment somewhere below them.
/// Deleted chains are walked so a live reply keeps every ancestor visible.
const SHOWN: &str = r#"
    (c.deleted_at IS NULL OR EXISTS (
        WITH RECURSIVE descendants AS (
            SELECT r.id, r.deleted_at FROM comments r WHERE r.parent_id = c.id
            UNION ALL
            SELECT r.id, r.deleted_at
            FROM comments r
            JOIN descendants d ON r.parent_id = d.id
        )
        SELECT 1 FROM descendants WHERE deleted_at IS NULL
    ))
"#;

pub async fn create_comment(
    pool: &PgPool,
    post_id: Uuid,
    author_id: Uuid,
    parent_id: Option<Uuid>,
    content: &str,
) -> Result<Uuid, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        INSERT INTO comments (post_id, author_id, parent_id, content)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(post_id)
    .bind(author_id)
    .bind(parent_id)
    .bind(content)
    .fetch_one(pool)
    .await
}

pub async fn find_comment(pool: &PgPool, comment_id: Uuid) -> Result<Option<CommentRow>, sqlx::Error> {
    let sql = format!(
        "SELECT {COMMENT_COLUMNS} FROM comments c JOIN users u ON u.id = c.author_id WHERE c.id = $1"
    );
    sqlx::query_as::<_, CommentRow>(&sql)
        .bind(comment_id)
        .fetch_optional(pool)
        .await
}

/// Post a live comment belongs to, if any.
pub async fn find_live_post_id(pool: &PgPool, comment_id: Uuid) -> Result<Option<Uuid>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT c.post_id
        FROM comments c
        JOIN posts p ON p.id = c.post_id AND p.deleted_at IS NULL
        WHERE c.id = $1
        "#,
    )
    .bind(comment_id)
    .fetch_optional(pool)
    .await
}

/// Post id of a parent comment that can still receive replies.
pub async fn find_reply_target(pool: &PgPool, parent_id: Uuid) -> Result<Option<Uuid>, sqlx::Error> {
    sqlx::query_scalar("SELECT post_id FROM comments WHERE id = $1 AND deleted_at IS NULL")
        .bind(parent_id)
        .fetch_optional(pool)
        .await
}

pub async fn find_ownership(
    pool: &PgPool,
    comment_id: Uuid,
) -> Result<Option<CommentOwnership>, sqlx::Error> {
    sqlx::query_as::<_, CommentOwnership>(
        r#"
        SELECT c.id, c.post_id, c.author_id, p.author_id AS post_author_id
        FROM comments c
        JOIN posts p ON p.id = c.post_id AND p.deleted_at IS NULL
        WHERE c.id = $1 AND c.deleted_at IS NULL
        "#,
    )
    .bind(comment_id)
    .fetch_optional(pool)
    .await
}

/// Top-level comments of a post, oldest first.
pub async fn list_top_level(
    pool: &PgPool,
    post_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<(Vec<CommentRow>, i64), sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {COMMENT_COLUMNS}
        FROM comments c
        JOIN users u ON u.id = c.author_id
        WHERE c.post_id = $1 AND c.parent_id IS NULL AND {SHOWN}
        ORDER BY c.created_at ASC, c.id ASC
        LIMIT $2 OFFSET $3
        "#
    );
    let rows = sqlx::query_as::<_, CommentRow>(&sql)
        .bind(post_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    let count_sql = format!(
        "SELECT COUNT(*) FROM comments c WHERE c.post_id = $1 AND c.parent_id IS NULL AND {SHOWN}"
    );
    let total: i64 = sqlx::query_scalar(&count_sql)
        .bind(post_id)
        .fetch_one(pool)
        .await?;

    Ok((rows, total))
}

/// Direct replies of a comment, oldest first.
pub async fn list_replies(
    pool: &PgPool,
    parent_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<(Vec<CommentRow>, i64), sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {COMMENT_COLUMNS}
        FROM comments c
        JOIN users u ON u.id = c.author_id
        WHERE c.parent_id = $1 AND {SHOWN}
        ORDER BY c.created_at ASC, c.id ASC
        LIMIT $2 OFFSET $3
        "#
    );
    let rows = sqlx::query_as::<_, CommentRow>(&sql)
        .bind(parent_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    let count_sql = format!("SELECT COUNT(*) FROM comments c WHERE c.parent_id = $1 AND {SHOWN}");
    let total: i64 = sqlx::query_scalar(&count_sql)
        .bind(parent_id)
        .fetch_one(pool)
        .await?;

    Ok((rows, total))
}

pub async fn update_content(pool: &PgPool, comment_id: Uuid, content: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE comments
        SET content = $2, updated_at = NOW()
        WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(comment_id)
    .bind(content)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn soft_delete(pool: &PgPool, comment_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE comments
        SET deleted_at = NOW(), updated_at = NOW()
        WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(comment_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
