use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_LANGUAGE: &str = "es";
pub const DEFAULT_THEME: &str = "light";
pub const DEFAULT_PAGE_SIZE: i32 = 10;

#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    pub user_id: Uuid,
    pub language: String,
    pub theme: String,
    pub page_size: i32,
    pub updated_at: DateTime<Utc>,
}

impl UserPreferences {
    pub fn defaults(user_id: Uuid) -> Self {
        Self {
            user_id,
            language: DEFAULT_LANGUAGE.to_string(),
            theme: DEFAULT_THEME.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            updated_at: Utc::now(),
        }
    }

    pub fn apply(&mut self, patch: &PreferencesPatch) {
        if let Some(ref language) = patch.language {
            self.language = language.clone();
        }
        if let Some(ref theme) = patch.theme {
            self.theme = theme.clone();
        }
        if let Some(page_size) = patch.page_size {
            self.page_size = page_size;
        }
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesPatch {
    pub language: Option<String>,
    pub theme: Option<String>,
    pub page_size: Option<i32>,
}
