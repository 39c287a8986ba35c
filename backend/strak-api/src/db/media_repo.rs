use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::models::MediaRecord;

const MEDIA_COLUMNS: &str =
    "id, owner_id, post_id, position, storage_key, content_type, size_bytes, created_at";

pub async fn insert(
    pool: &PgPool,
    id: Uuid,
    owner_id: Uuid,
    storage_key: &str,
    content_type: &str,
    size_bytes: i64,
) -> Result<MediaRecord, sqlx::Error> {
    let sql = format!(
        "INSERT INTO media (id, owner_id, storage_key, content_type, size_bytes) \
         VALUES ($1, $2, $3, $4, $5) RETURNING {MEDIA_COLUMNS}"
    );
    sqlx::query_as::<_, MediaRecord>(&sql)
        .bind(id)
        .bind(owner_id)
        .bind(storage_key)
        .bind(content_type)
        .bind(size_bytes)
        .fetch_one(pool)
        .await
}

pub async fn find(pool: &PgPool, media_id: Uuid) -> Result<Option<MediaRecord>, sqlx::Error> {
    let sql = format!("SELECT {MEDIA_COLUMNS} FROM media WHERE id = $1");
    sqlx::query_as::<_, MediaRecord>(&sql)
        .bind(media_id)
        .fetch_optional(pool)
        .await
}

/// Lock the requested media rows for attachment.
pub async fn lock_many(
    tx: &mut Transaction<'_, Postgres>,
    media_ids: &[Uuid],
) -> Result<Vec<MediaRecord>, sqlx::Error> {
    let sql = format!("SELECT {MEDIA_COLUMNS} FROM media WHERE id = ANY($1) FOR UPDATE");
    sqlx::query_as::<_, MediaRecord>(&sql)
        .bind(media_ids)
        .fetch_all(&mut **tx)
        .await
}

/// Attach media to a post; positions follow the slice order.
pub async fn attach(
    tx: &mut Transaction<'_, Postgres>,
    post_id: Uuid,
    media_ids: &[Uuid],
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE media m
        SET post_id = $1, position = o.ord - 1
        FROM UNNEST($2::uuid[]) WITH ORDINALITY AS o(id, ord)
        WHERE m.id = o.id
        "#,
    )
    .bind(post_id)
    .bind(media_ids)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn ids_for_post(
    tx: &mut Transaction<'_, Postgres>,
    post_id: Uuid,
) -> Result<Vec<Uuid>, sqlx::Error> {
    sqlx::query_scalar("SELECT id FROM media WHERE post_id = $1 ORDER BY position FOR UPDATE")
        .bind(post_id)
        .fetch_all(&mut **tx)
        .await
}

/// Media for a batch of posts, ordered by post then position.
pub async fn list_for_posts(pool: &PgPool, post_ids: &[Uuid]) -> Result<Vec<MediaRecord>, sqlx::Error> {
    if post_ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT {MEDIA_COLUMNS} FROM media WHERE post_id = ANY($1) ORDER BY post_id, position"
    );
    sqlx::query_as::<_, MediaRecord>(&sql)
        .bind(post_ids)
        .fetch_all(pool)
        .await
}

/// Whether the viewer may fetch the file. Unattached media (fresh uploads and
/// media of deleted posts) is served only to its owner; attached media
/// follows the visibility of a live post and its active author.
pub async fn is_servable(pool: &PgPool, viewer: Option<Uuid>, media_id: Uuid) -> Result<bool, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT EXISTS (
            SELECT 1
            FROM media m
            JOIN users u ON u.id = m.owner_id AND u.deleted_at IS NULL
            LEFT JOIN posts p ON p.id = m.post_id
            WHERE m.id = $2
              AND (
                  (m.post_id IS NULL AND m.owner_id = $1)
                  OR (p.id IS NOT NULL AND p.deleted_at IS NULL AND {visible})
              )
        )
        "#,
        visible = super::VISIBLE_TO_VIEWER
    );
    sqlx::query_scalar(&sql)
        .bind(viewer)
        .bind(media_id)
        .fetch_one(pool)
        .await
}
