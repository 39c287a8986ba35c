/// Profile handlers
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::db::user_repo::ProfileChanges;
use crate::error::Result;
use crate::middleware::{UserId, Viewer};
use crate::response::{ok, PageParams};
use crate::services::{ListService, PostService, UserService};
use crate::state::AppState;
use crate::validators::normalize_optional;

/// Omitted fields are left alone; an empty string clears the field.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(max = 50, message = "Display name must be at most 50 characters"))]
    pub display_name: Option<String>,
    #[validate(length(max = 160, message = "Bio must be at most 160 characters"))]
    pub bio: Option<String>,
    #[validate(length(max = 500, message = "Avatar URL is too long"))]
    pub avatar_url: Option<String>,
    #[validate(length(max = 500, message = "Banner URL is too long"))]
    pub banner_url: Option<String>,
    #[validate(length(max = 200, message = "Website must be at most 200 characters"))]
    pub website: Option<String>,
    #[validate(length(max = 60, message = "Location must be at most 60 characters"))]
    pub location: Option<String>,
}

impl From<&UpdateProfileRequest> for ProfileChanges {
    fn from(req: &UpdateProfileRequest) -> Self {
        let change = |value: &Option<String>| value.as_deref().map(|v| normalize_optional(Some(v)));
        ProfileChanges {
            display_name: change(&req.display_name),
            bio: change(&req.bio),
            avatar_url: change(&req.avatar_url),
            banner_url: change(&req.banner_url),
            website: change(&req.website),
            location: change(&req.location),
        }
    }
}

/// GET /api/v1/users/{username}
pub async fn get_profile(
    state: web::Data<AppState>,
    viewer: Viewer,
    username: web::Path<String>,
) -> Result<HttpResponse> {
    let profile = UserService::new(&state)
        .profile_by_username(viewer.0, &username)
        .await?;
    Ok(ok("Profile retrieved", profile))
}

/// PATCH /api/v1/users/me
pub async fn update_profile(
    state: web::Data<AppState>,
    user_id: UserId,
    payload: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse> {
    payload.validate()?;

    let account = UserService::new(&state)
        .update_profile(user_id.0, ProfileChanges::from(&*payload))
        .await?;
    Ok(ok("Profile updated", account))
}

/// GET /api/v1/users/{id}/posts
pub async fn get_user_posts(
    state: web::Data<AppState>,
    viewer: Viewer,
    user_id: web::Path<Uuid>,
    query: web::Query<PageParams>,
) -> Result<HttpResponse> {
    let page = PostService::new(&state)
        .list_user_posts(viewer.0, *user_id, query.resolve())
        .await?;
    Ok(ok("Posts retrieved", page))
}

/// GET /api/v1/users/{id}/lists
pub async fn get_user_lists(
    state: web::Data<AppState>,
    viewer: Viewer,
    user_id: web::Path<Uuid>,
    query: web::Query<PageParams>,
) -> Result<HttpResponse> {
    let page = ListService::new(&state)
        .user_lists(viewer.0, *user_id, query.resolve())
        .await?;
    Ok(ok("Lists retrieved", page))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_strings_clear_and_missing_fields_are_kept() {
        let req = UpdateProfileRequest {
            display_name: Some("  Ada  ".into()),
            bio: Some("   ".into()),
            ..Default::default()
        };
        let changes = ProfileChanges::from(&req);
        assert_eq!(changes.display_name, Some(Some("Ada".to_string())));
        assert_eq!(changes.bio, Some(None));
        assert_eq!(changes.website, None);
        assert!(!changes.is_empty());
        assert!(ProfileChanges::from(&UpdateProfileRequest::default()).is_empty());
    }
}
