/// Comment handlers - threads, replies, edit and delete
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::middleware::{UserId, Viewer};
use crate::response::{created, done, ok, PageParams};
use crate::services::CommentService;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateCommentRequest {
    pub content: String,
}

/// GET /api/v1/posts/{id}/comments
pub async fn get_comments(
    state: web::Data<AppState>,
    viewer: Viewer,
    post_id: web::Path<Uuid>,
    query: web::Query<PageParams>,
) -> Result<HttpResponse> {
    let page = CommentService::new(&state)
        .list_comments(viewer.0, *post_id, query.resolve())
        .await?;
    Ok(ok("Comments retrieved", page))
}

/// POST /api/v1/posts/{id}/comments
pub async fn create_comment(
    state: web::Data<AppState>,
    user_id: UserId,
    post_id: web::Path<Uuid>,
    payload: web::Json<CreateCommentRequest>,
) -> Result<HttpResponse> {
    let comment = CommentService::new(&state)
        .create_comment(user_id.0, *post_id, payload.parent_id, &payload.content)
        .await?;
    Ok(created("Comment created", comment))
}

/// GET /api/v1/comments/{id}/replies
pub async fn get_replies(
    state: web::Data<AppState>,
    viewer: Viewer,
    comment_id: web::Path<Uuid>,
    query: web::Query<PageParams>,
) -> Result<HttpResponse> {
    let page = CommentService::new(&state)
        .list_replies(viewer.0, *comment_id, query.resolve())
        .await?;
    Ok(ok("Replies retrieved", page))
}

/// PATCH /api/v1/comments/{id}
pub async fn update_comment(
    state: web::Data<AppState>,
    user_id: UserId,
    comment_id: web::Path<Uuid>,
    payload: web::Json<UpdateCommentRequest>,
) -> Result<HttpResponse> {
    let comment = CommentService::new(&state)
        .update_comment(user_id.0, *comment_id, &payload.content)
        .await?;
    Ok(ok("Comment updated", comment))
}

/// DELETE /api/v1/comments/{id}
pub async fn delete_comment(
    state: web::Data<AppState>,
    user_id: UserId,
    comment_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    CommentService::new(&state)
        .delete_comment(user_id.0, *comment_id)
        .await?;
    Ok(done("Comment deleted"))
}
