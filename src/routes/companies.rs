use axum::Json;
use axum::extract::{Path, State};
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::error::AppError;
use crate::models::{CompanyMembership, UserCompany};
use crate::registration::memberships;
use crate::state::SharedState;

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<CompanyMembership>>, AppError> {
    let companies = memberships::list_companies(&state.store, &auth.subject_id).await?;
    Ok(Json(companies))
}

pub async fn select(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(company_id): Path<Uuid>,
) -> Result<Json<UserCompany>, AppError> {
    let membership =
        memberships::set_selected_company(&state.store, &auth.subject_id, company_id).await?;
    Ok(Json(membership))
}
