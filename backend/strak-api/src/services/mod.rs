/// Business logic layer
///
/// Services are cheap to construct per request from the shared `AppState`
/// and own every rule that is not a pure SQL constraint: visibility,
/// ownership, cache invalidation and input bounds.
pub mod auth;
pub mod comments;
pub mod feed;
pub mod follows;
pub mod lists;
pub mod media;
pub mod posts;
pub mod search;
pub mod settings;
pub mod users;

pub use auth::AuthService;
pub use comments::CommentService;
pub use feed::FeedService;
pub use follows::{FollowService, FollowState};
pub use lists::{ListChanges, ListService};
pub use media::{MediaService, MediaStore};
pub use posts::PostService;
pub use search::SearchService;
pub use settings::SettingsService;
pub use users::UserService;
