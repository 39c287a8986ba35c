use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Account settings; `is_private` lives on the user row and is joined in.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Settings {
    pub is_private: bool,
    pub email_notifications: bool,
    pub push_notifications: bool,
    pub show_activity_status: bool,
    pub language: String,
    pub updated_at: DateTime<Utc>,
}
