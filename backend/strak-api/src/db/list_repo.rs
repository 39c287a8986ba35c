use sqlx::PgPool;
use uuid::Uuid;

use super::USER_CARD_COLUMNS;
use crate::models::{ListKind, ListRow, UserCard};

const LIST_COLUMNS: &str = r#"
    l.id, l.owner_id,
    u.username AS owner_username,
    u.display_name AS owner_display_name,
    u.avatar_url AS owner_avatar_url,
    l.name, l.description, l.kind, l.is_private, l.created_at, l.updated_at,
    CASE l.kind
        WHEN 'posts' THEN (SELECT COUNT(*) FROM list_posts lp
                           JOIN posts p ON p.id = lp.post_id AND p.deleted_at IS NULL
                           WHERE lp.list_id = l.id)
        ELSE (SELECT COUNT(*) FROM list_users lu
              JOIN users m ON m.id = lu.user_id AND m.deleted_at IS NULL
              WHERE lu.list_id = l.id)
    END AS member_count
"#;

const LIST_FROM: &str = r#"
    FROM lists l
    JOIN users u ON u.id = l.owner_id AND u.deleted_at IS NULL
"#;

pub async fn create_list(
    pool: &PgPool,
    owner_id: Uuid,
    name: &str,
    description: Option<&str>,
    kind: ListKind,
    is_private: bool,
) -> Result<Uuid, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        INSERT INTO lists (owner_id, name, description, kind, is_private)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(owner_id)
    .bind(name)
    .bind(description)
    .bind(kind.as_str())
    .bind(is_private)
    .fetch_one(pool)
    .await
}

pub async fn find_list(pool: &PgPool, list_id: Uuid) -> Result<Option<ListRow>, sqlx::Error> {
    let sql = format!("SELECT {LIST_COLUMNS} {LIST_FROM} WHERE l.id = $1");
    sqlx::query_as::<_, ListRow>(&sql)
        .bind(list_id)
        .fetch_optional(pool)
        .await
}

/// Lists owned by `owner_id`; private ones only when `include_private`.
pub async fn list_by_owner(
    pool: &PgPool,
    owner_id: Uuid,
    include_private: bool,
    limit: i64,
    offset: i64,
) -> Result<(Vec<ListRow>, i64), sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {LIST_COLUMNS} {LIST_FROM}
        WHERE l.owner_id = $1 AND ($2 OR NOT l.is_private)
        ORDER BY l.created_at DESC, l.id DESC
        LIMIT $3 OFFSET $4
        "#
    );
    let rows = sqlx::query_as::<_, ListRow>(&sql)
        .bind(owner_id)
        .bind(include_private)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM lists l WHERE l.owner_id = $1 AND ($2 OR NOT l.is_private)",
    )
    .bind(owner_id)
    .bind(include_private)
    .fetch_one(pool)
    .await?;

    Ok((rows, total))
}

/// `None` keeps a field; `Some(None)` clears the description.
pub async fn update_list(
    pool: &PgPool,
    list_id: Uuid,
    name: Option<&str>,
    description: Option<Option<&str>>,
    is_private: Option<bool>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE lists SET
            name        = COALESCE($2, name),
            description = CASE WHEN $3 THEN $4 ELSE description END,
            is_private  = COALESCE($5, is_private),
            updated_at  = NOW()
        WHERE id = $1
        "#,
    )
    .bind(list_id)
    .bind(name)
    .bind(description.is_some())
    .bind(description.flatten())
    .bind(is_private)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn delete_list(pool: &PgPool, list_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM lists WHERE id = $1")
        .bind(list_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn add_post(pool: &PgPool, list_id: Uuid, post_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO list_posts (list_id, post_id) VALUES ($1, $2)
        ON CONFLICT (list_id, post_id) DO NOTHING
        "#,
    )
    .bind(list_id)
    .bind(post_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn add_user(pool: &PgPool, list_id: Uuid, user_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO list_users (list_id, user_id) VALUES ($1, $2)
        ON CONFLICT (list_id, user_id) DO NOTHING
        "#,
    )
    .bind(list_id)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn remove_member(
    pool: &PgPool,
    list_id: Uuid,
    kind: ListKind,
    member_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let sql = match kind {
        ListKind::Posts => "DELETE FROM list_posts WHERE list_id = $1 AND post_id = $2",
        ListKind::Users => "DELETE FROM list_users WHERE list_id = $1 AND user_id = $2",
    };
    let result = sqlx::query(sql)
        .bind(list_id)
        .bind(member_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn touch(pool: &PgPool, list_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE lists SET updated_at = NOW() WHERE id = $1")
        .bind(list_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Members of a "users" list, most recently added first.
pub async fn list_user_members(
    pool: &PgPool,
    viewer: Option<Uuid>,
    list_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<(Vec<UserCard>, i64), sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {USER_CARD_COLUMNS}
        FROM list_users lu
        JOIN users u ON u.id = lu.user_id AND u.deleted_at IS NULL
        WHERE lu.list_id = $2
        ORDER BY lu.added_at DESC, u.id DESC
        LIMIT $3 OFFSET $4
        "#
    );
    let users = sqlx::query_as::<_, UserCard>(&sql)
        .bind(viewer)
        .bind(list_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM list_users lu
        JOIN users u ON u.id = lu.user_id AND u.deleted_at IS NULL
        WHERE lu.list_id = $1
        "#,
    )
    .bind(list_id)
    .fetch_one(pool)
    .await?;

    Ok((users, total))
}
