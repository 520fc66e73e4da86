use crate::db::{Store, USER_SUBJECT_KEY};
use crate::error::AppError;
use crate::models::{NewUser, User};

/// Return the local user for `subject_id`, creating it from `profile` when
/// none exists. An existing user is never updated from `profile`.
///
/// The boolean is true only when this call inserted the row.
pub async fn find_or_create(
    store: &Store,
    subject_id: &str,
    profile: &NewUser,
) -> Result<(User, bool), AppError> {
    if let Some(user) = store.users.find_by_subject_id(subject_id).await? {
        return Ok((user, false));
    }

    match store.users.create(subject_id, profile).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "User created");
            Ok((user, true))
        }
        Err(err) if err.is_unique_violation_on(USER_SUBJECT_KEY) => {
            let user = store
                .users
                .find_by_subject_id(subject_id)
                .await?
                .ok_or_else(|| AppError::Internal("User vanished after conflict".to_string()))?;
            Ok((user, false))
        }
        Err(err) => Err(err.into()),
    }
}

/// The local user behind an authenticated subject.
pub async fn require_user(store: &Store, subject_id: &str) -> Result<User, AppError> {
    store
        .users
        .find_by_subject_id(subject_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}
