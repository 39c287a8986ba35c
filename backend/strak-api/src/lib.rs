/// Strak API Library
///
/// REST backend for the Strak social platform: accounts and profiles,
/// follows, home and explore feeds, posts with image media, threaded
/// comments, curated lists, search and per-user settings.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and request payloads
/// - `routes`: route table and extractor configuration
/// - `services`: business rules (visibility, ownership, invalidation)
/// - `db`: PostgreSQL repositories
/// - `models`: rows and API representations
/// - `cache`: optional Redis read-through cache for posts and profiles
/// - `middleware`: JWT authentication, permission checks and HTTP metrics
/// - `error` / `response`: error type and response envelope
/// - `config`: environment configuration
/// - `metrics`: Prometheus collectors
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
pub mod validators;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;
