use std::sync::LazyLock;

use axum::Json;
use axum::extract::State;
use regex::Regex;

use crate::auth::extractor::AuthUser;
use crate::error::AppError;
use crate::models::{PreferencesPatch, UserPreferences};
use crate::registration::directory;
use crate::state::SharedState;

static LANGUAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2}(-[A-Z]{2})?$").expect("valid regex"));

const THEMES: &[&str] = &["light", "dark", "system"];
const MAX_PAGE_SIZE: i32 = 100;

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<UserPreferences>, AppError> {
    let user = directory::require_user(&state.store, &auth.subject_id).await?;
    let preferences = state
        .store
        .preferences
        .find_by_user(user.id)
        .await?
        .unwrap_or_else(|| UserPreferences::defaults(user.id));
    Ok(Json(preferences))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(patch): Json<PreferencesPatch>,
) -> Result<Json<UserPreferences>, AppError> {
    validate(&patch)?;
    let user = directory::require_user(&state.store, &auth.subject_id).await?;
    let preferences = state.store.preferences.upsert(user.id, &patch).await?;
    Ok(Json(preferences))
}

fn validate(patch: &PreferencesPatch) -> Result<(), AppError> {
    if let Some(ref language) = patch.language {
        if !LANGUAGE_RE.is_match(language) {
            return Err(AppError::BadRequest(format!(
                "Invalid language tag: {language}"
            )));
        }
    }
    if let Some(ref theme) = patch.theme {
        if !THEMES.contains(&theme.as_str()) {
            return Err(AppError::BadRequest(format!(
                "Theme must be one of: {}",
                THEMES.join(", ")
            )));
        }
    }
    if let Some(page_size) = patch.page_size {
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(AppError::BadRequest(format!(
                "Page size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
    }
    Ok(())
}
