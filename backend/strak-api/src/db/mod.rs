/// Database access layer
///
/// Repositories are plain async functions over `&PgPool` (or an open
/// transaction) returning `sqlx::Error`; services translate failures into
/// `AppError`. Queries that depend on who is looking take the viewer as
/// `$1` (`NULL` for anonymous callers).
pub mod comment_repo;
pub mod follow_repo;
pub mod like_repo;
pub mod list_repo;
pub mod media_repo;
pub mod post_repo;
pub mod settings_repo;
pub mod user_repo;

/// True when the viewer (`$1`) may see content authored by `u`:
/// the account is public, is the viewer, or is followed by the viewer.
pub(crate) const VISIBLE_TO_VIEWER: &str = r#"
    (NOT u.is_private
     OR u.id = $1
     OR EXISTS (SELECT 1 FROM follows vf WHERE vf.follower_id = $1 AND vf.followee_id = u.id))
"#;

/// Columns of a [`UserCard`](crate::models::UserCard) for user `u` seen by viewer `$1`.
pub(crate) const USER_CARD_COLUMNS: &str = r#"
    u.id, u.username, u.display_name, u.avatar_url, u.bio, u.is_private,
    (SELECT COUNT(*) FROM follows fc WHERE fc.followee_id = u.id) AS followers_count,
    EXISTS (SELECT 1 FROM follows fv WHERE fv.follower_id = $1 AND fv.followee_id = u.id) AS is_following
"#;
