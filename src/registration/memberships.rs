use uuid::Uuid;

use crate::db::Store;
use crate::error::AppError;
use crate::models::{CompanyMembership, Role, UserCompany};

use super::directory;

pub async fn exists(store: &Store, user_id: Uuid, company_id: Uuid) -> Result<bool, AppError> {
    Ok(store
        .memberships
        .find_by_user_and_company(user_id, company_id)
        .await?
        .is_some())
}

/// Insert the association. Callers check [`exists`] first; the
/// store's unique constraint still turns a lost race into a Conflict.
pub async fn create(
    store: &Store,
    user_id: Uuid,
    company_id: Uuid,
    role: Role,
) -> Result<UserCompany, AppError> {
    let membership = store.memberships.create(user_id, company_id, role).await?;
    tracing::info!(
        user_id = %user_id,
        company_id = %company_id,
        role = ?role,
        selected = membership.is_selected,
        "Association created"
    );
    Ok(membership)
}

pub async fn set_selected(
    store: &Store,
    user_id: Uuid,
    company_id: Uuid,
) -> Result<UserCompany, AppError> {
    store
        .memberships
        .update_selection(user_id, company_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User is not associated with this company".to_string()))
}

pub async fn list_for_user(store: &Store, user_id: Uuid) -> Result<Vec<UserCompany>, AppError> {
    Ok(store.memberships.list_for_user(user_id).await?)
}

pub async fn get_selected(store: &Store, user_id: Uuid) -> Result<Option<UserCompany>, AppError> {
    Ok(store.memberships.find_selected(user_id).await?)
}

/// Every company the user belongs to, with role and selection.
pub async fn companies_for_user(
    store: &Store,
    user_id: Uuid,
) -> Result<Vec<CompanyMembership>, AppError> {
    let memberships = list_for_user(store, user_id).await?;
    let ids: Vec<Uuid> = memberships.iter().map(|m| m.company_id).collect();
    let companies = store.companies.find_by_ids(&ids).await?;

    Ok(companies
        .into_iter()
        .filter_map(|company| {
            memberships
                .iter()
                .find(|m| m.company_id == company.id)
                .map(|m| CompanyMembership::new(m.clone(), company))
        })
        .collect())
}

pub async fn list_companies(
    store: &Store,
    subject_id: &str,
) -> Result<Vec<CompanyMembership>, AppError> {
    let user = directory::require_user(store, subject_id).await?;
    companies_for_user(store, user.id).await
}

pub async fn set_selected_company(
    store: &Store,
    subject_id: &str,
    company_id: Uuid,
) -> Result<UserCompany, AppError> {
    let user = directory::require_user(store, subject_id).await?;
    let membership = set_selected(store, user.id, company_id).await?;
    tracing::info!(user_id = %user.id, company_id = %company_id, "Selected company changed");
    Ok(membership)
}

/// The caller's selected association, or Forbidden when there is none.
pub async fn require_selected(store: &Store, user_id: Uuid) -> Result<UserCompany, AppError> {
    get_selected(store, user_id)
        .await?
        .ok_or_else(|| AppError::Forbidden("No company selected".to_string()))
}
