/// Feed handlers
use actix_web::{web, HttpResponse};

use crate::error::Result;
use crate::middleware::{UserId, Viewer};
use crate::response::{ok, PageParams};
use crate::services::FeedService;
use crate::state::AppState;

/// GET /api/v1/feed
pub async fn get_feed(
    state: web::Data<AppState>,
    user_id: UserId,
    query: web::Query<PageParams>,
) -> Result<HttpResponse> {
    let page = FeedService::new(&state)
        .home(user_id.0, query.resolve())
        .await?;
    Ok(ok("Feed retrieved", page))
}

/// GET /api/v1/explore
pub async fn get_explore(
    state: web::Data<AppState>,
    viewer: Viewer,
    query: web::Query<PageParams>,
) -> Result<HttpResponse> {
    let page = FeedService::new(&state)
        .explore(viewer.0, query.resolve())
        .await?;
    Ok(ok("Explore feed retrieved", page))
}
