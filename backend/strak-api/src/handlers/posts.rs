/// Post handlers - create, read, edit, delete, media order and likes
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::middleware::{UserId, Viewer};
use crate::response::{created, done, ok};
use crate::services::PostService;
use crate::state::AppState;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CreatePostRequest {
    pub content: Option<String>,
    #[serde(default)]
    pub media_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdatePostRequest {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReorderMediaRequest {
    pub media_ids: Vec<Uuid>,
}

/// POST /api/v1/posts
pub async fn create_post(
    state: web::Data<AppState>,
    user_id: UserId,
    payload: web::Json<CreatePostRequest>,
) -> Result<HttpResponse> {
    let post = PostService::new(&state)
        .create_post(user_id.0, payload.content.as_deref(), &payload.media_ids)
        .await?;
    Ok(created("Post created", post))
}

/// GET /api/v1/posts/{id}
pub async fn get_post(
    state: web::Data<AppState>,
    viewer: Viewer,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let post = PostService::new(&state).get_post(viewer.0, *post_id).await?;
    Ok(ok("Post retrieved", post))
}

/// PATCH /api/v1/posts/{id}
pub async fn update_post(
    state: web::Data<AppState>,
    user_id: UserId,
    post_id: web::Path<Uuid>,
    payload: web::Json<UpdatePostRequest>,
) -> Result<HttpResponse> {
    let post = PostService::new(&state)
        .update_post(user_id.0, *post_id, &payload.content)
        .await?;
    Ok(ok("Post updated", post))
}

/// DELETE /api/v1/posts/{id}
pub async fn delete_post(
    state: web::Data<AppState>,
    user_id: UserId,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    PostService::new(&state)
        .delete_post(user_id.0, *post_id)
        .await?;
    Ok(done("Post deleted"))
}

/// PUT /api/v1/posts/{id}/media/order
pub async fn reorder_media(
    state: web::Data<AppState>,
    user_id: UserId,
    post_id: web::Path<Uuid>,
    payload: web::Json<ReorderMediaRequest>,
) -> Result<HttpResponse> {
    let post = PostService::new(&state)
        .reorder_media(user_id.0, *post_id, &payload.media_ids)
        .await?;
    Ok(ok("Media reordered", post))
}

/// POST /api/v1/posts/{id}/like
pub async fn like_post(
    state: web::Data<AppState>,
    user_id: UserId,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let like = PostService::new(&state).like(user_id.0, *post_id).await?;
    Ok(ok("Post liked", like))
}

/// DELETE /api/v1/posts/{id}/like
pub async fn unlike_post(
    state: web::Data<AppState>,
    user_id: UserId,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let like = PostService::new(&state).unlike(user_id.0, *post_id).await?;
    Ok(ok("Post unliked", like))
}
