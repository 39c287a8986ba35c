/// HTTP handlers
///
/// Handlers stay thin: they extract the caller and the request body, call a
/// service and wrap the result in the response envelope.
pub mod auth;
pub mod comments;
pub mod feed;
pub mod follows;
pub mod health;
pub mod lists;
pub mod media;
pub mod posts;
pub mod search;
pub mod settings;
pub mod users;

pub use auth::{login, me, refresh, register};
pub use comments::{create_comment, delete_comment, get_comments, get_replies, update_comment};
pub use feed::{get_explore, get_feed};
pub use follows::{follow_user, get_followers, get_following, unfollow_user};
pub use health::{health_check, liveness_check, readiness_check};
pub use lists::{
    add_member, create_list, delete_list, get_list, get_members, get_my_lists, remove_member,
    update_list,
};
pub use media::{get_media, upload_media};
pub use posts::{create_post, delete_post, get_post, like_post, reorder_media, unlike_post, update_post};
pub use search::{search_posts, search_users, suggested_users};
pub use settings::{change_password, delete_account, get_settings, update_settings};
pub use users::{get_profile, get_user_lists, get_user_posts, update_profile};
