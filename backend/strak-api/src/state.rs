//! Shared application state handed to every handler.

use sqlx::PgPool;

use crate::cache::ContentCache;
use crate::services::media::MediaStore;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub cache: ContentCache,
    pub media: MediaStore,
}

impl AppState {
    pub fn new(db: PgPool, cache: ContentCache, media: MediaStore) -> Self {
        Self { db, cache, media }
    }
}
