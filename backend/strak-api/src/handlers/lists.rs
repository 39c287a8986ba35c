/// List handlers - curated collections of posts or accounts
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::middleware::{UserId, Viewer};
use crate::models::ListKind;
use crate::response::{created, done, ok, PageParams};
use crate::services::{ListChanges, ListService};
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateListRequest {
    pub name: String,
    pub description: Option<String>,
    pub kind: ListKind,
    #[serde(default)]
    pub is_private: bool,
}

/// An empty `description` clears it.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateListRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_private: Option<bool>,
    pub kind: Option<ListKind>,
}

impl From<UpdateListRequest> for ListChanges {
    fn from(req: UpdateListRequest) -> Self {
        ListChanges {
            name: req.name,
            description: req.description.map(Some),
            is_private: req.is_private,
            kind: req.kind,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddMemberRequest {
    pub member_id: Uuid,
}

/// GET /api/v1/lists
pub async fn get_my_lists(
    state: web::Data<AppState>,
    user_id: UserId,
    query: web::Query<PageParams>,
) -> Result<HttpResponse> {
    let page = ListService::new(&state)
        .my_lists(user_id.0, query.resolve())
        .await?;
    Ok(ok("Lists retrieved", page))
}

/// POST /api/v1/lists
pub async fn create_list(
    state: web::Data<AppState>,
    user_id: UserId,
    payload: web::Json<CreateListRequest>,
) -> Result<HttpResponse> {
    let list = ListService::new(&state)
        .create_list(
            user_id.0,
            &payload.name,
            payload.description.as_deref(),
            payload.kind,
            payload.is_private,
        )
        .await?;
    Ok(created("List created", list))
}

/// GET /api/v1/lists/{id}
pub async fn get_list(
    state: web::Data<AppState>,
    viewer: Viewer,
    list_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let list = ListService::new(&state).get_list(viewer.0, *list_id).await?;
    Ok(ok("List retrieved", list))
}

/// PATCH /api/v1/lists/{id}
pub async fn update_list(
    state: web::Data<AppState>,
    user_id: UserId,
    list_id: web::Path<Uuid>,
    payload: web::Json<UpdateListRequest>,
) -> Result<HttpResponse> {
    let list = ListService::new(&state)
        .update_list(user_id.0, *list_id, payload.into_inner().into())
        .await?;
    Ok(ok("List updated", list))
}

/// DELETE /api/v1/lists/{id}
pub async fn delete_list(
    state: web::Data<AppState>,
    user_id: UserId,
    list_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    ListService::new(&state)
        .delete_list(user_id.0, *list_id)
        .await?;
    Ok(done("List deleted"))
}

/// GET /api/v1/lists/{id}/members
pub async fn get_members(
    state: web::Data<AppState>,
    viewer: Viewer,
    list_id: web::Path<Uuid>,
    query: web::Query<PageParams>,
) -> Result<HttpResponse> {
    let members = ListService::new(&state)
        .members(viewer.0, *list_id, query.resolve())
        .await?;
    Ok(ok("List members retrieved", members))
}

/// POST /api/v1/lists/{id}/members
pub async fn add_member(
    state: web::Data<AppState>,
    user_id: UserId,
    list_id: web::Path<Uuid>,
    payload: web::Json<AddMemberRequest>,
) -> Result<HttpResponse> {
    let list = ListService::new(&state)
        .add_member(user_id.0, *list_id, payload.member_id)
        .await?;
    Ok(ok("Member added", list))
}

/// DELETE /api/v1/lists/{id}/members/{member_id}
pub async fn remove_member(
    state: web::Data<AppState>,
    user_id: UserId,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse> {
    let (list_id, member_id) = path.into_inner();
    let list = ListService::new(&state)
        .remove_member(user_id.0, list_id, member_id)
        .await?;
    Ok(ok("Member removed", list))
}
