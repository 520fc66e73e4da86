//! External identity provider integration.
//!
//! The provider owns credentials and issues subject ids and access tokens;
//! this crate never stores passwords outside `LocalIdentityProvider`.

pub mod bridge;
pub mod gotrue;
pub mod local;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::AppError;

/// Result of a successful sign-in or sign-up.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentitySession {
    pub subject_id: String,
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// Unknown subject or wrong password.
    InvalidCredentials,
    /// The subject exists but has not confirmed its email address.
    EmailNotConfirmed,
    WeakPassword(String),
    InvalidEmail(String),
    SignupDisabled,
    /// Any other rejection by the provider.
    Rejected(String),
    /// Provider unreachable or failing; safe to retry later.
    Unavailable(String),
}

impl std::fmt::Display for IdentityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentityError::InvalidCredentials => write!(f, "Invalid credentials"),
            IdentityError::EmailNotConfirmed => write!(f, "Email not confirmed"),
            IdentityError::WeakPassword(msg) => write!(f, "Weak password: {msg}"),
            IdentityError::InvalidEmail(msg) => write!(f, "Invalid email: {msg}"),
            IdentityError::SignupDisabled => write!(f, "Sign-ups are disabled"),
            IdentityError::Rejected(msg) => write!(f, "Rejected: {msg}"),
            IdentityError::Unavailable(msg) => write!(f, "Unavailable: {msg}"),
        }
    }
}

impl std::error::Error for IdentityError {}

impl From<IdentityError> for AppError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidCredentials => {
                AppError::Unauthorized("Invalid credentials".to_string())
            }
            IdentityError::EmailNotConfirmed => AppError::Unauthorized(
                "Email address has not been confirmed yet".to_string(),
            ),
            IdentityError::WeakPassword(msg) => AppError::BadRequest(msg),
            IdentityError::InvalidEmail(msg) => AppError::BadRequest(msg),
            IdentityError::SignupDisabled => {
                AppError::BadRequest("Sign-ups are currently disabled".to_string())
            }
            IdentityError::Rejected(msg) => AppError::Unauthorized(msg),
            IdentityError::Unavailable(msg) => AppError::Upstream(msg),
        }
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<IdentitySession, IdentityError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<IdentitySession, IdentityError>;
}
