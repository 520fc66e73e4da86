use axum::Json;
use axum::extract::State;

use crate::auth::extractor::AuthUser;
use crate::error::AppError;
use crate::navigation::{self, MenuItem};
use crate::registration::{directory, memberships};
use crate::state::SharedState;

pub async fn menu(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<MenuItem>>, AppError> {
    let user = directory::require_user(&state.store, &auth.subject_id).await?;
    let role = memberships::get_selected(&state.store, user.id)
        .await?
        .map(|m| m.role);
    Ok(Json(navigation::menu_for(role)))
}
