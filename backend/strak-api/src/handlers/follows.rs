/// Follow handlers
use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::error::Result;
use crate::middleware::{UserId, Viewer};
use crate::response::{ok, PageParams};
use crate::services::FollowService;
use crate::state::AppState;

/// POST /api/v1/users/{id}/follow
pub async fn follow_user(
    state: web::Data<AppState>,
    user_id: UserId,
    target: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let follow = FollowService::new(&state).follow(user_id.0, *target).await?;
    Ok(ok("Following", follow))
}

/// DELETE /api/v1/users/{id}/follow
pub async fn unfollow_user(
    state: web::Data<AppState>,
    user_id: UserId,
    target: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let follow = FollowService::new(&state)
        .unfollow(user_id.0, *target)
        .await?;
    Ok(ok("Unfollowed", follow))
}

/// GET /api/v1/users/{id}/followers
pub async fn get_followers(
    state: web::Data<AppState>,
    viewer: Viewer,
    target: web::Path<Uuid>,
    query: web::Query<PageParams>,
) -> Result<HttpResponse> {
    let page = FollowService::new(&state)
        .followers(viewer.0, *target, query.resolve())
        .await?;
    Ok(ok("Followers retrieved", page))
}

/// GET /api/v1/users/{id}/following
pub async fn get_following(
    state: web::Data<AppState>,
    viewer: Viewer,
    target: web::Path<Uuid>,
    query: web::Query<PageParams>,
) -> Result<HttpResponse> {
    let page = FollowService::new(&state)
        .following(viewer.0, *target, query.resolve())
        .await?;
    Ok(ok("Following retrieved", page))
}
