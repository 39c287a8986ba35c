use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::USER_CARD_COLUMNS;
use crate::models::UserCard;

/// Insert the edge; returns false when it already existed.
pub async fn follow(pool: &PgPool, follower_id: Uuid, followee_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO follows (follower_id, followee_id)
        VALUES ($1, $2)
        ON CONFLICT (follower_id, followee_id) DO NOTHING
        "#,
    )
    .bind(follower_id)
    .bind(followee_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Remove the edge; returns false when there was none.
pub async fn unfollow(
    tx: &mut Transaction<'_, Postgres>,
    follower_id: Uuid,
    followee_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND followee_id = $2")
        .bind(follower_id)
        .bind(followee_id)
        .execute(&mut **tx)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Drop `member_id` from every "users" list owned by `owner_id`.
pub async fn remove_from_owner_lists(
    tx: &mut Transaction<'_, Postgres>,
    owner_id: Uuid,
    member_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM list_users lu
        USING lists l
        WHERE lu.list_id = l.id AND l.owner_id = $1 AND lu.user_id = $2
        "#,
    )
    .bind(owner_id)
    .bind(member_id)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected())
}

pub async fn is_following(pool: &PgPool, follower_id: Uuid, followee_id: Uuid) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM follows WHERE follower_id = $1 AND followee_id = $2)",
    )
    .bind(follower_id)
    .bind(followee_id)
    .fetch_one(pool)
    .await
}

pub async fn followers_count(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE followee_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
}

/// Accounts following `user_id`, newest follow first.
pub async fn list_followers(
    pool: &PgPool,
    viewer: Option<Uuid>,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<(Vec<UserCard>, i64), sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {USER_CARD_COLUMNS}
        FROM follows f
        JOIN users u ON u.id = f.follower_id AND u.deleted_at IS NULL
        WHERE f.followee_id = $2
        ORDER BY f.created_at DESC, u.id DESC
        LIMIT $3 OFFSET $4
        "#
    );
    let users = sqlx::query_as::<_, UserCard>(&sql)
        .bind(viewer)
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    let total = followers_count(pool, user_id).await?;
    Ok((users, total))
}

/// Accounts `user_id` follows, newest follow first.
pub async fn list_following(
    pool: &PgPool,
    viewer: Option<Uuid>,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<(Vec<UserCard>, i64), sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {USER_CARD_COLUMNS}
        FROM follows f
        JOIN users u ON u.id = f.followee_id AND u.deleted_at IS NULL
        WHERE f.follower_id = $2
        ORDER BY f.created_at DESC, u.id DESC
        LIMIT $3 OFFSET $4
        "#
    );
    let users = sqlx::query_as::<_, UserCard>(&sql)
        .bind(viewer)
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE follower_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    Ok((users, total))
}
