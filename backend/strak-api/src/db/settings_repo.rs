use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::models::Settings;

const SETTINGS_QUERY: &str = r#"
    SELECT u.is_private, s.email_notifications, s.push_notifications,
           s.show_activity_status, s.language, GREATEST(s.updated_at, u.updated_at) AS updated_at
    FROM user_settings s
    JOIN users u ON u.id = s.user_id
    WHERE s.user_id = $1
"#;

/// Create the default row if it does not exist yet.
pub async fn ensure_defaults(pool: &PgPool, user_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO user_settings (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn get(pool: &PgPool, user_id: Uuid) -> Result<Option<Settings>, sqlx::Error> {
    sqlx::query_as::<_, Settings>(SETTINGS_QUERY)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

#[derive(Debug, Default)]
pub struct SettingsChanges {
    pub email_notifications: Option<bool>,
    pub push_notifications: Option<bool>,
    pub show_activity_status: Option<bool>,
    pub language: Option<String>,
}

impl SettingsChanges {
    pub fn is_empty(&self) -> bool {
        self.email_notifications.is_none()
            && self.push_notifications.is_none()
            && self.show_activity_status.is_none()
            && self.language.is_none()
    }
}

pub async fn update(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    changes: &SettingsChanges,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO user_settings (user_id, email_notifications, push_notifications,
                                   show_activity_status, language)
        VALUES ($1, COALESCE($2, TRUE), COALESCE($3, TRUE), COALESCE($4, TRUE), COALESCE($5, 'en'))
        ON CONFLICT (user_id) DO UPDATE SET
            email_notifications  = COALESCE($2, user_settings.email_notifications),
            push_notifications   = COALESCE($3, user_settings.push_notifications),
            show_activity_status = COALESCE($4, user_settings.show_activity_status),
            language             = COALESCE($5, user_settings.language),
            updated_at           = NOW()
        "#,
    )
    .bind(user_id)
    .bind(changes.email_notifications)
    .bind(changes.push_notifications)
    .bind(changes.show_activity_status)
    .bind(changes.language.as_deref())
    .execute(&mut **tx)
    .await?;

    Ok(())
}
