/// Data models for the Strak API
///
/// Row types (`*Row`, `*Record`) mirror SQL result sets; the types without a
/// suffix are what handlers serialize into the response envelope.
pub mod comment;
pub mod list;
pub mod media;
pub mod post;
pub mod settings;
pub mod user;

pub use comment::{Comment, CommentOwnership, CommentRow, DELETED_PLACEHOLDER, MAX_COMMENT_CHARS};
pub use list::{List, ListKind, ListMembers, ListRow};
pub use media::{ImageKind, MediaItem, MediaRecord};
pub use post::{LikeState, Post, PostOwner, PostRow, MAX_POST_CHARS, MAX_POST_MEDIA};
pub use settings::Settings;
pub use user::{AccountProfile, AuthPayload, Profile, ProfileView, User, UserCard, UserSummary};
