use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{USER_CARD_COLUMNS, VISIBLE_TO_VIEWER};
use crate::models::{Profile, User, UserCard};

const USER_COLUMNS: &str = r#"
    id, username, email, password_hash, display_name, bio, avatar_url, banner_url,
    website, location, is_private, created_at, updated_at, deleted_at
"#;

const PROFILE_QUERY: &str = r#"
    SELECT u.id, u.username, u.display_name, u.bio, u.avatar_url, u.banner_url,
           u.website, u.location, u.is_private, u.created_at,
           (SELECT COUNT(*) FROM follows f WHERE f.followee_id = u.id) AS followers_count,
           (SELECT COUNT(*) FROM follows f WHERE f.follower_id = u.id) AS following_count,
           (SELECT COUNT(*) FROM posts p WHERE p.author_id = u.id AND p.deleted_at IS NULL) AS posts_count
    FROM users u
    WHERE u.id = $1 AND u.deleted_at IS NULL
"#;

/// Insert the account together with its default settings row.
pub async fn create_user(
    tx: &mut Transaction<'_, Postgres>,
    username: &str,
    email: &str,
    password_hash: &str,
    display_name: Option<&str>,
) -> Result<User, sqlx::Error> {
    let sql = format!(
        "INSERT INTO users (username, email, password_hash, display_name) \
         VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
    );
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(display_name)
        .fetch_one(&mut **tx)
        .await?;

    sqlx::query("INSERT INTO user_settings (user_id) VALUES ($1)")
        .bind(user.id)
        .execute(&mut **tx)
        .await?;

    Ok(user)
}

pub async fn find_active_by_id(pool: &PgPool, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL");
    sqlx::query_as::<_, User>(&sql)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Look up an active account by email or username, case-insensitively.
pub async fn find_active_by_identifier(
    pool: &PgPool,
    identifier: &str,
) -> Result<Option<User>, sqlx::Error> {
    let sql = format!(
        "SELECT {USER_COLUMNS} FROM users \
         WHERE (LOWER(email) = LOWER($1) OR LOWER(username) = LOWER($1)) \
           AND deleted_at IS NULL \
         LIMIT 1"
    );
    sqlx::query_as::<_, User>(&sql)
        .bind(identifier)
        .fetch_optional(pool)
        .await
}

pub async fn find_active_id_by_username(
    pool: &PgPool,
    username: &str,
) -> Result<Option<Uuid>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT id FROM users WHERE LOWER(username) = LOWER($1) AND deleted_at IS NULL",
    )
    .bind(username)
    .fetch_optional(pool)
    .await
}

pub async fn exists_active(pool: &PgPool, user_id: Uuid) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1 AND deleted_at IS NULL)")
        .bind(user_id)
        .fetch_one(pool)
        .await
}

pub async fn username_taken(pool: &PgPool, username: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM users WHERE LOWER(username) = LOWER($1) AND deleted_at IS NULL)",
    )
    .bind(username)
    .fetch_one(pool)
    .await
}

pub async fn email_taken(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM users WHERE LOWER(email) = LOWER($1) AND deleted_at IS NULL)",
    )
    .bind(email)
    .fetch_one(pool)
    .await
}

pub async fn get_profile(pool: &PgPool, user_id: Uuid) -> Result<Option<Profile>, sqlx::Error> {
    sqlx::query_as::<_, Profile>(PROFILE_QUERY)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Whether `viewer` follows `user_id` and whether `user_id` follows `viewer`.
pub async fn relationship(
    pool: &PgPool,
    viewer: Uuid,
    user_id: Uuid,
) -> Result<(bool, bool), sqlx::Error> {
    sqlx::query_as::<_, (bool, bool)>(
        r#"
        SELECT
            EXISTS (SELECT 1 FROM follows WHERE follower_id = $1 AND followee_id = $2),
            EXISTS (SELECT 1 FROM follows WHERE follower_id = $2 AND followee_id = $1)
        "#,
    )
    .bind(viewer)
    .bind(user_id)
    .fetch_one(pool)
    .await
}

/// `None` when the user does not exist (or is deleted).
pub async fn can_view_content(
    pool: &PgPool,
    viewer: Option<Uuid>,
    user_id: Uuid,
) -> Result<Option<bool>, sqlx::Error> {
    let sql = format!(
        "SELECT COALESCE({VISIBLE_TO_VIEWER}, FALSE) FROM users u \
         WHERE u.id = $2 AND u.deleted_at IS NULL"
    );
    sqlx::query_scalar(&sql)
        .bind(viewer)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Profile fields settable through `PATCH /users/me`. `None` keeps the
/// current value; `Some(None)` clears it.
#[derive(Debug, Default)]
pub struct ProfileChanges {
    pub display_name: Option<Option<String>>,
    pub bio: Option<Option<String>>,
    pub avatar_url: Option<Option<String>>,
    pub banner_url: Option<Option<String>>,
    pub website: Option<Option<String>>,
    pub location: Option<Option<String>>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none()
            && self.bio.is_none()
            && self.avatar_url.is_none()
            && self.banner_url.is_none()
            && self.website.is_none()
            && self.location.is_none()
    }
}

pub async fn update_profile(
    pool: &PgPool,
    user_id: Uuid,
    changes: &ProfileChanges,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE users SET
            display_name = CASE WHEN $2 THEN $3 ELSE display_name END,
            bio          = CASE WHEN $4 THEN $5 ELSE bio END,
            avatar_url   = CASE WHEN $6 THEN $7 ELSE avatar_url END,
            banner_url   = CASE WHEN $8 THEN $9 ELSE banner_url END,
            website      = CASE WHEN $10 THEN $11 ELSE website END,
            location     = CASE WHEN $12 THEN $13 ELSE location END,
            updated_at   = NOW()
        WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(user_id)
    .bind(changes.display_name.is_some())
    .bind(changes.display_name.clone().flatten())
    .bind(changes.bio.is_some())
    .bind(changes.bio.clone().flatten())
    .bind(changes.avatar_url.is_some())
    .bind(changes.avatar_url.clone().flatten())
    .bind(changes.banner_url.is_some())
    .bind(changes.banner_url.clone().flatten())
    .bind(changes.website.is_some())
    .bind(changes.website.clone().flatten())
    .bind(changes.location.is_some())
    .bind(changes.location.clone().flatten())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn set_private(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    is_private: bool,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET is_private = $2, updated_at = NOW() WHERE id = $1")
        .bind(user_id)
        .bind(is_private)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

pub async fn update_password(
    pool: &PgPool,
    user_id: Uuid,
    password_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
        .bind(user_id)
        .bind(password_hash)
        .execute(pool)
        .await?;
    Ok(())
}

/// Soft delete an account and detach it from the social graph.
/// Returns the ids of the posts that were hidden and of the accounts whose
/// follower/following counts changed.
pub async fn soft_delete_account(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
) -> Result<(Vec<Uuid>, Vec<Uuid>), sqlx::Error> {
    sqlx::query("UPDATE users SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1")
        .bind(user_id)
        .execute(&mut **tx)
        .await?;

    let affected_users: Vec<Uuid> = sqlx::query_scalar(
        r#"
        DELETE FROM follows
        WHERE follower_id = $1 OR followee_id = $1
        RETURNING CASE WHEN follower_id = $1 THEN followee_id ELSE follower_id END
        "#,
    )
    .bind(user_id)
    .fetch_all(&mut **tx)
    .await?;

    let mut touched_posts: Vec<Uuid> = sqlx::query_scalar(
        "DELETE FROM likes WHERE user_id = $1 RETURNING post_id",
    )
    .bind(user_id)
    .fetch_all(&mut **tx)
    .await?;

    let commented_posts: Vec<Uuid> = sqlx::query_scalar(
        r#"
        UPDATE comments SET deleted_at = NOW(), updated_at = NOW()
        WHERE author_id = $1 AND deleted_at IS NULL
        RETURNING post_id
        "#,
    )
    .bind(user_id)
    .fetch_all(&mut **tx)
    .await?;
    touched_posts.extend(commented_posts);

    let own_posts: Vec<Uuid> = sqlx::query_scalar(
        r#"
        UPDATE posts SET deleted_at = NOW(), updated_at = NOW()
        WHERE author_id = $1 AND deleted_at IS NULL
        RETURNING id
        "#,
    )
    .bind(user_id)
    .fetch_all(&mut **tx)
    .await?;
    touched_posts.extend(own_posts);

    sqlx::query("DELETE FROM list_users WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut **tx)
        .await?;

    touched_posts.sort_unstable();
    touched_posts.dedup();
    Ok((touched_posts, affected_users))
}

/// Users whose username or display name contains `pattern` (already
/// LIKE-escaped). Exact username first, then prefix matches, then by
/// follower count.
pub async fn search_users(
    pool: &PgPool,
    viewer: Option<Uuid>,
    query: &str,
    pattern: &str,
    limit: i64,
    offset: i64,
) -> Result<(Vec<UserCard>, i64), sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {USER_CARD_COLUMNS}
        FROM users u
        WHERE u.deleted_at IS NULL
          AND (u.username ILIKE '%' || $3 || '%' ESCAPE '\'
               OR u.display_name ILIKE '%' || $3 || '%' ESCAPE '\')
        ORDER BY
            (LOWER(u.username) = LOWER($2)) DESC,
            (u.username ILIKE $3 || '%' ESCAPE '\') DESC,
            followers_count DESC,
            u.username ASC
        LIMIT $4 OFFSET $5
        "#
    );
    let users = sqlx::query_as::<_, UserCard>(&sql)
        .bind(viewer)
        .bind(query)
        .bind(pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM users u
        WHERE u.deleted_at IS NULL
          AND (u.username ILIKE '%' || $1 || '%' ESCAPE '\'
               OR u.display_name ILIKE '%' || $1 || '%' ESCAPE '\')
        "#,
    )
    .bind(pattern)
    .fetch_one(pool)
    .await?;

    Ok((users, total))
}

/// Accounts followed by people `viewer` follows, excluding the viewer and
/// accounts they already follow, ranked by how many of those people follow them.
pub async fn suggested_users(
    pool: &PgPool,
    viewer: Uuid,
    limit: i64,
) -> Result<Vec<UserCard>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {USER_CARD_COLUMNS}
        FROM users u
        JOIN (
            SELECT f2.followee_id AS id, COUNT(*) AS mutuals
            FROM follows f1
            JOIN follows f2 ON f2.follower_id = f1.followee_id
            WHERE f1.follower_id = $1
              AND f2.followee_id <> $1
              AND NOT EXISTS (
                  SELECT 1 FROM follows mine
                  WHERE mine.follower_id = $1 AND mine.followee_id = f2.followee_id
              )
            GROUP BY f2.followee_id
        ) s ON s.id = u.id
        WHERE u.deleted_at IS NULL
        ORDER BY s.mutuals DESC, followers_count DESC, u.username ASC
        LIMIT $2
        "#
    );
    sqlx::query_as::<_, UserCard>(&sql)
        .bind(viewer)
        .bind(limit)
        .fetch_all(pool)
        .await
}

/// Most-followed accounts the viewer does not follow yet.
pub async fn popular_users(
    pool: &PgPool,
    viewer: Uuid,
    exclude: &[Uuid],
    limit: i64,
) -> Result<Vec<UserCard>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {USER_CARD_COLUMNS}
        FROM users u
        WHERE u.deleted_at IS NULL
          AND u.id <> $1
          AND u.id <> ALL($2)
          AND NOT EXISTS (SELECT 1 FROM follows mine WHERE mine.follower_id = $1 AND mine.followee_id = u.id)
        ORDER BY followers_count DESC, u.created_at DESC
        LIMIT $3
        "#
    );
    sqlx::query_as::<_, UserCard>(&sql)
        .bind(viewer)
        .bind(exclude)
        .bind(limit)
        .fetch_all(pool)
        .await
}
