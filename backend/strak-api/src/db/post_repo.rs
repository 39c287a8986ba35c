use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::VISIBLE_TO_VIEWER;
use crate::models::{PostOwner, PostRow};

/// Post `p` joined with author `u`, seen by viewer `$1`.
const POST_COLUMNS: &str = r#"
    p.id, p.author_id,
    u.username AS author_username,
    u.display_name AS author_display_name,
    u.avatar_url AS author_avatar_url,
    p.content, p.created_at, p.updated_at, p.edited_at,
    (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS like_count,
    (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id AND c.deleted_at IS NULL) AS comment_count,
    EXISTS (SELECT 1 FROM likes ml WHERE ml.post_id = p.id AND ml.user_id = $1) AS liked_by_me
"#;

const POST_FROM: &str = r#"
    FROM posts p
    JOIN users u ON u.id = p.author_id AND u.deleted_at IS NULL
"#;

pub async fn create_post(
    tx: &mut Transaction<'_, Postgres>,
    author_id: Uuid,
    content: &str,
) -> Result<Uuid, sqlx::Error> {
    sqlx::query_scalar("INSERT INTO posts (author_id, content) VALUES ($1, $2) RETURNING id")
        .bind(author_id)
        .bind(content)
        .fetch_one(&mut **tx)
        .await
}

/// Post with counts, regardless of the author's privacy. Callers check
/// visibility with `user_repo::can_view_content`.
pub async fn find_post(
    pool: &PgPool,
    viewer: Option<Uuid>,
    post_id: Uuid,
) -> Result<Option<PostRow>, sqlx::Error> {
    let sql = format!("SELECT {POST_COLUMNS} {POST_FROM} WHERE p.id = $2 AND p.deleted_at IS NULL");
    sqlx::query_as::<_, PostRow>(&sql)
        .bind(viewer)
        .bind(post_id)
        .fetch_optional(pool)
        .await
}

pub async fn find_owner(pool: &PgPool, post_id: Uuid) -> Result<Option<PostOwner>, sqlx::Error> {
    sqlx::query_as::<_, PostOwner>(
        r#"
        SELECT p.id, p.author_id
        FROM posts p
        JOIN users u ON u.id = p.author_id AND u.deleted_at IS NULL
        WHERE p.id = $1 AND p.deleted_at IS NULL
        "#,
    )
    .bind(post_id)
    .fetch_optional(pool)
    .await
}

/// Owner of a post the viewer is allowed to see.
pub async fn find_visible_owner(
    pool: &PgPool,
    viewer: Option<Uuid>,
    post_id: Uuid,
) -> Result<Option<PostOwner>, sqlx::Error> {
    let sql = format!(
        "SELECT p.id, p.author_id {POST_FROM} \
         WHERE p.id = $2 AND p.deleted_at IS NULL AND {VISIBLE_TO_VIEWER}"
    );
    sqlx::query_as::<_, PostOwner>(&sql)
        .bind(viewer)
        .bind(post_id)
        .fetch_optional(pool)
        .await
}

pub async fn update_content(pool: &PgPool, post_id: Uuid, content: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE posts
        SET content = $2, edited_at = NOW(), updated_at = NOW()
        WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(post_id)
    .bind(content)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Soft delete a post, detach its media and drop it from every list.
pub async fn soft_delete_post(
    tx: &mut Transaction<'_, Postgres>,
    post_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE posts
        SET deleted_at = NOW(), updated_at = NOW()
        WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(post_id)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(false);
    }

    sqlx::query("UPDATE media SET post_id = NULL, position = 0 WHERE post_id = $1")
        .bind(post_id)
        .execute(&mut **tx)
        .await?;

    sqlx::query("DELETE FROM list_posts WHERE post_id = $1")
        .bind(post_id)
        .execute(&mut **tx)
        .await?;

    Ok(true)
}

/// Posts by one author, newest first. Callers check visibility first.
pub async fn list_by_author(
    pool: &PgPool,
    viewer: Option<Uuid>,
    author_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<(Vec<PostRow>, i64), sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {POST_COLUMNS} {POST_FROM}
        WHERE p.author_id = $2 AND p.deleted_at IS NULL
        ORDER BY p.created_at DESC, p.id DESC
        LIMIT $3 OFFSET $4
        "#
    );
    let rows = sqlx::query_as::<_, PostRow>(&sql)
        .bind(viewer)
        .bind(author_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM posts WHERE author_id = $1 AND deleted_at IS NULL",
    )
    .bind(author_id)
    .fetch_one(pool)
    .await?;

    Ok((rows, total))
}

/// Home feed: posts by accounts `$1` follows plus their own.
pub async fn home_feed(
    pool: &PgPool,
    viewer: Uuid,
    limit: i64,
    offset: i64,
) -> Result<(Vec<PostRow>, i64), sqlx::Error> {
    const FEED_FILTER: &str = r#"
        p.deleted_at IS NULL
        AND (p.author_id = $1
             OR EXISTS (SELECT 1 FROM follows f WHERE f.follower_id = $1 AND f.followee_id = p.author_id))
    "#;

    let sql = format!(
        r#"
        SELECT {POST_COLUMNS} {POST_FROM}
        WHERE {FEED_FILTER}
        ORDER BY p.created_at DESC, p.id DESC
        LIMIT $2 OFFSET $3
        "#
    );
    let rows = sqlx::query_as::<_, PostRow>(&sql)
        .bind(viewer)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    let count_sql = format!("SELECT COUNT(*) {POST_FROM} WHERE {FEED_FILTER}");
    let total: i64 = sqlx::query_scalar(&count_sql)
        .bind(viewer)
        .fetch_one(pool)
        .await?;

    Ok((rows, total))
}

/// Discovery feed: recent posts from public accounts.
pub async fn explore(
    pool: &PgPool,
    viewer: Option<Uuid>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<PostRow>, i64), sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {POST_COLUMNS} {POST_FROM}
        WHERE p.deleted_at IS NULL AND NOT u.is_private
        ORDER BY p.created_at DESC, p.id DESC
        LIMIT $2 OFFSET $3
        "#
    );
    let rows = sqlx::query_as::<_, PostRow>(&sql)
        .bind(viewer)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    let count_sql =
        format!("SELECT COUNT(*) {POST_FROM} WHERE p.deleted_at IS NULL AND NOT u.is_private");
    let total: i64 = sqlx::query_scalar(&count_sql).fetch_one(pool).await?;

    Ok((rows, total))
}

/// Posts visible to the viewer whose content contains `pattern`
/// (already LIKE-escaped), newest first.
pub async fn search(
    pool: &PgPool,
    viewer: Option<Uuid>,
    pattern: &str,
    limit: i64,
    offset: i64,
) -> Result<(Vec<PostRow>, i64), sqlx::Error> {
    let filter = format!(
        "p.deleted_at IS NULL AND p.content ILIKE '%' || $2 || '%' ESCAPE '\\' AND {VISIBLE_TO_VIEWER}"
    );

    let sql = format!(
        r#"
        SELECT {POST_COLUMNS} {POST_FROM}
        WHERE {filter}
        ORDER BY p.created_at DESC, p.id DESC
        LIMIT $3 OFFSET $4
        "#
    );
    let rows = sqlx::query_as::<_, PostRow>(&sql)
        .bind(viewer)
        .bind(pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    let count_sql = format!("SELECT COUNT(*) {POST_FROM} WHERE {filter}");
    let total: i64 = sqlx::query_scalar(&count_sql)
        .bind(viewer)
        .bind(pattern)
        .fetch_one(pool)
        .await?;

    Ok((rows, total))
}

/// Posts in a "posts" list visible to the viewer, most recently added first.
pub async fn list_in_list(
    pool: &PgPool,
    viewer: Option<Uuid>,
    list_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<(Vec<PostRow>, i64), sqlx::Error> {
    let filter = format!("lp.list_id = $2 AND p.deleted_at IS NULL AND {VISIBLE_TO_VIEWER}");

    let sql = format!(
        r#"
        SELECT {POST_COLUMNS}
        FROM list_posts lp
        JOIN posts p ON p.id = lp.post_id
        JOIN users u ON u.id = p.author_id AND u.deleted_at IS NULL
        WHERE {filter}
        ORDER BY lp.added_at DESC, p.id DESC
        LIMIT $3 OFFSET $4
        "#
    );
    let rows = sqlx::query_as::<_, PostRow>(&sql)
        .bind(viewer)
        .bind(list_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    let count_sql = format!(
        r#"
        SELECT COUNT(*)
        FROM list_posts lp
        JOIN posts p ON p.id = lp.post_id
        JOIN users u ON u.id = p.author_id AND u.deleted_at IS NULL
        WHERE {filter}
        "#
    );
    let total: i64 = sqlx::query_scalar(&count_sql)
        .bind(viewer)
        .bind(list_id)
        .fetch_one(pool)
        .await?;

    Ok((rows, total))
}

/// Ids of the author's live posts, for cache invalidation.
pub async fn ids_by_author(pool: &PgPool, author_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
    sqlx::query_scalar("SELECT id FROM posts WHERE author_id = $1 AND deleted_at IS NULL")
        .bind(author_id)
        .fetch_all(pool)
        .await
}
