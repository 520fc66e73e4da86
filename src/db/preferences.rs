use async_trait::async_trait;
use uuid::Uuid;

use super::{DbResult, PgStore, PreferencesRepository};
use crate::models::preferences::{DEFAULT_LANGUAGE, DEFAULT_PAGE_SIZE, DEFAULT_THEME};
use crate::models::{PreferencesPatch, UserPreferences};

#[async_trait]
impl PreferencesRepository for PgStore {
    async fn find_by_user(&self, user_id: Uuid) -> DbResult<Option<UserPreferences>> {
        let prefs = sqlx::query_as::<_, UserPreferences>(
            "SELECT * FROM user_preferences WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(prefs)
    }

    async fn upsert(&self, user_id: Uuid, patch: &PreferencesPatch) -> DbResult<UserPreferences> {
        let prefs = sqlx::query_as::<_, UserPreferences>(
            "INSERT INTO user_preferences (user_id, language, theme, page_size)
             VALUES ($1, COALESCE($2, $5), COALESCE($3, $6), COALESCE($4, $7))
             ON CONFLICT (user_id) DO UPDATE SET
                 language = COALESCE($2, user_preferences.language),
                 theme = COALESCE($3, user_preferences.theme),
                 page_size = COALESCE($4, user_preferences.page_size),
                 updated_at = now()
             RETURNING *",
        )
        .bind(user_id)
        .bind(&patch.language)
        .bind(&patch.theme)
        .bind(patch.page_size)
        .bind(DEFAULT_LANGUAGE)
        .bind(DEFAULT_THEME)
        .bind(DEFAULT_PAGE_SIZE)
        .fetch_one(&self.pool)
        .await?;
        Ok(prefs)
    }
}
