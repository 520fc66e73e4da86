use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::Store;
use crate::error::AppError;
use crate::identity::bridge;
use crate::identity::{IdentityProvider, IdentitySession};
use crate::models::{Company, NewCompany, NewUser, Role, User, UserCompany};

use super::{companies, directory, memberships};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub role: Role,
    pub phone: Option<String>,
    pub document_type: Option<String>,
    pub document_number: Option<String>,
    pub company: Option<NewCompany>,
    pub company_id: Option<Uuid>,
}

impl RegistrationRequest {
    fn profile(&self, email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            phone: self.phone.clone(),
            document_type: self.document_type.clone(),
            document_number: self.document_number.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Scenario {
    NewUserNewCompany,
    NewUserExistingCompany,
    ExistingUserNewCompany,
    ExistingUserExistingCompany,
}

impl Scenario {
    pub fn classify(is_new_user: bool, is_new_company: bool) -> Self {
        match (is_new_user, is_new_company) {
            (true, true) => Scenario::NewUserNewCompany,
            (true, false) => Scenario::NewUserExistingCompany,
            (false, true) => Scenario::ExistingUserNewCompany,
            (false, false) => Scenario::ExistingUserExistingCompany,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Scenario::NewUserNewCompany => "User and company registered",
            Scenario::NewUserExistingCompany => "User registered and joined an existing company",
            Scenario::ExistingUserNewCompany => "Company registered for an existing user",
            Scenario::ExistingUserExistingCompany => "Existing user joined an existing company",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationOutcome {
    pub message: &'static str,
    pub scenario: Scenario,
    pub user: User,
    pub company: Company,
    pub user_company: UserCompany,
    pub total_companies: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<IdentitySession>,
}

/// Register `req.email` into a company, creating whichever of the provider
/// subject, local user and company does not exist yet.
///
/// Re-entrant: a provider account left behind by an earlier failed attempt
/// is found by sign-in and only the missing local rows are created.
pub async fn register(
    store: &Store,
    identity: &dyn IdentityProvider,
    req: RegistrationRequest,
) -> Result<RegistrationOutcome, AppError> {
    let email = req.email.trim().to_lowercase();
    validate_fields(&req, &email)?;

    let profile = req.profile(&email);
    let outcome =
        bridge::sign_in_or_sign_up(identity, &email, &req.password, &profile.display_name())
            .await?;

    if req.company_id.is_some() == req.company.is_some() {
        return Err(AppError::BadRequest(
            "Provide either companyId or company data".to_string(),
        ));
    }

    let resolved = companies::resolve(store, req.company_id, req.company.as_ref()).await?;
    let (user, is_new_user) =
        directory::find_or_create(store, &outcome.subject_id, &profile).await?;
    let company = resolved.company;

    if memberships::exists(store, user.id, company.id).await? {
        return Err(AppError::Conflict(
            "User is already registered in this company".to_string(),
        ));
    }

    let user_company = memberships::create(store, user.id, company.id, req.role).await?;
    let total_companies = store.memberships.count_for_user(user.id).await?;
    let scenario = Scenario::classify(is_new_user, resolved.is_new);

    tracing::info!(
        user_id = %user.id,
        company_id = %company.id,
        scenario = ?scenario,
        new_subject = outcome.is_new_subject,
        total_companies,
        "Registration completed"
    );

    let session = Some(outcome.session).filter(|s| s.access_token.is_some());

    Ok(RegistrationOutcome {
        message: scenario.message(),
        scenario,
        user,
        company,
        user_company,
        total_companies,
        session,
    })
}

fn validate_fields(req: &RegistrationRequest, email: &str) -> Result<(), AppError> {
    if email.is_empty() || req.password.is_empty() {
        return Err(AppError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }
    if req.first_name.trim().is_empty() || req.last_name.trim().is_empty() {
        return Err(AppError::BadRequest(
            "First and last name are required".to_string(),
        ));
    }
    Ok(())
}
