use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};

use crate::auth::extractor::{ACCESS_TOKEN_COOKIE, AuthUser};
use crate::error::AppError;
use crate::identity::{IdentityError, IdentitySession};
use crate::models::{CompanyMembership, NewUser, User};
use crate::registration::{self, RegistrationOutcome, RegistrationRequest, directory, memberships};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub session: IdentitySession,
    pub user: User,
    pub selected_company: Option<CompanyMembership>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user: User,
    pub companies: Vec<CompanyMembership>,
    pub selected_company: Option<CompanyMembership>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn access_cookie(token: &str, max_age_secs: i64) -> CookieJar {
    let access = Cookie::build((ACCESS_TOKEN_COOKIE, token.to_string()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(max_age_secs))
        .build();

    CookieJar::new().add(access)
}

fn clear_access_cookie() -> CookieJar {
    let access = Cookie::build((ACCESS_TOKEN_COOKIE, ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build();
    CookieJar::new().add(access)
}

pub async fn register(
    State(state): State<SharedState>,
    Json(req): Json<RegistrationRequest>,
) -> Result<(StatusCode, Json<RegistrationOutcome>), AppError> {
    let outcome = registration::register(&state.store, state.identity.as_ref(), req).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let email = req.email.trim().to_lowercase();
    if email.is_empty() || req.password.is_empty() {
        return Err(AppError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }

    if state.login_limiter.check(&email).is_err() {
        return Err(AppError::RateLimited(
            "Too many login attempts. Please try again later.".to_string(),
        ));
    }

    let session = match state.identity.sign_in(&email, &req.password).await {
        Ok(session) => session,
        Err(IdentityError::Unavailable(msg)) => return Err(AppError::Upstream(msg)),
        Err(IdentityError::EmailNotConfirmed) => {
            return Err(IdentityError::EmailNotConfirmed.into());
        }
        Err(_) => {
            state.login_limiter.record_failure(&email);
            return Err(AppError::Unauthorized("Invalid credentials".to_string()));
        }
    };
    state.login_limiter.reset(&email);

    // First login for a subject created outside this service.
    let (user, created) =
        directory::find_or_create(&state.store, &session.subject_id, &bridged_profile(&email))
            .await?;
    if created {
        tracing::info!(user_id = %user.id, "Local user bridged on first login");
    }

    let selected_company = selected_company(&state, &user).await?;

    let jar = match session.access_token.as_deref() {
        Some(token) => access_cookie(token, session.expires_in.unwrap_or(3600)),
        None => CookieJar::new(),
    };

    Ok((
        jar,
        Json(LoginResponse {
            session,
            user,
            selected_company,
        }),
    ))
}

pub async fn logout() -> (CookieJar, Json<MessageResponse>) {
    (
        clear_access_cookie(),
        Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    )
}

pub async fn me(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<MeResponse>, AppError> {
    let user = directory::require_user(&state.store, &auth.subject_id).await?;
    let companies = memberships::companies_for_user(&state.store, user.id).await?;
    let selected_company = companies.iter().find(|c| c.is_selected).cloned();

    Ok(Json(MeResponse {
        user,
        companies,
        selected_company,
    }))
}

async fn selected_company(
    state: &SharedState,
    user: &User,
) -> Result<Option<CompanyMembership>, AppError> {
    let Some(membership) = memberships::get_selected(&state.store, user.id).await? else {
        return Ok(None);
    };
    let company = state.store.companies.find_by_id(membership.company_id).await?;
    Ok(company.map(|company| CompanyMembership::new(membership, company)))
}

/// Profile for a subject that signed in without registering here.
fn bridged_profile(email: &str) -> NewUser {
    let local_part = email.split('@').next().unwrap_or(email);
    NewUser {
        email: email.to_string(),
        first_name: local_part.to_string(),
        last_name: String::new(),
        ..Default::default()
    }
}
