/// Search handlers
use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::error::Result;
use crate::middleware::{UserId, Viewer};
use crate::response::{ok, PageRequest};
use crate::services::SearchService;
use crate::state::AppState;

const DEFAULT_SUGGESTIONS: u32 = 10;
const MAX_SUGGESTIONS: u32 = 50;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl SearchParams {
    fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

#[derive(Debug, Deserialize)]
pub struct SuggestedParams {
    pub limit: Option<u32>,
}

impl SuggestedParams {
    fn resolve_limit(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_SUGGESTIONS)
            .clamp(1, MAX_SUGGESTIONS)
    }
}

/// GET /api/v1/search/users?q=
pub async fn search_users(
    state: web::Data<AppState>,
    viewer: Viewer,
    query: web::Query<SearchParams>,
) -> Result<HttpResponse> {
    let page = SearchService::new(&state)
        .search_users(viewer.0, &query.q, query.page_request())
        .await?;
    Ok(ok("Users found", page))
}

/// GET /api/v1/search/posts?q=
pub async fn search_posts(
    state: web::Data<AppState>,
    viewer: Viewer,
    query: web::Query<SearchParams>,
) -> Result<HttpResponse> {
    let page = SearchService::new(&state)
        .search_posts(viewer.0, &query.q, query.page_request())
        .await?;
    Ok(ok("Posts found", page))
}

/// GET /api/v1/search/suggested
pub async fn suggested_users(
    state: web::Data<AppState>,
    user_id: UserId,
    query: web::Query<SuggestedParams>,
) -> Result<HttpResponse> {
    let users = SearchService::new(&state)
        .suggested(user_id.0, query.resolve_limit())
        .await?;
    Ok(ok("Suggestions retrieved", users))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggestion_limit_is_clamped() {
        let limit = |limit| SuggestedParams { limit }.resolve_limit();
        assert_eq!(limit(None), DEFAULT_SUGGESTIONS);
        assert_eq!(limit(Some(0)), 1);
        assert_eq!(limit(Some(500)), MAX_SUGGESTIONS);
    }
}
