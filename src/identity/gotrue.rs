use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

use super::{IdentityError, IdentityProvider, IdentitySession};

/// Client for a GoTrue-compatible auth server (e.g. Supabase Auth).
pub struct GoTrueProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GoTrueProvider {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .map_err(|e| format!("Failed to build identity client: {e}"))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    async fn post(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<AuthResponse, IdentityError> {
        let resp = self
            .client
            .post(format!("{}{path}", self.base_url))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(format!("Request failed: {e}")))?;

        let status = resp.status();
        if status.is_success() {
            return resp
                .json::<AuthResponse>()
                .await
                .map_err(|e| IdentityError::Unavailable(format!("Malformed response: {e}")));
        }

        let error = resp.json::<ErrorBody>().await.unwrap_or_default();
        Err(classify_error(status, &error))
    }
}

#[async_trait]
impl IdentityProvider for GoTrueProvider {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<IdentitySession, IdentityError> {
        let body = json!({
            "email": email,
            "password": password,
            "data": { "display_name": display_name },
        });
        self.post("/auth/v1/signup", body).await?.into_session()
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<IdentitySession, IdentityError> {
        let body = json!({ "email": email, "password": password });
        self.post("/auth/v1/token?grant_type=password", body)
            .await?
            .into_session()
    }
}

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: String,
    email: Option<String>,
}

/// Sign-in always returns a session. Sign-up returns a session when
/// auto-confirm is on, otherwise the bare user object.
#[derive(Debug, Deserialize)]
struct AuthResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    user: Option<GoTrueUser>,
    id: Option<String>,
    email: Option<String>,
}

impl AuthResponse {
    fn into_session(self) -> Result<IdentitySession, IdentityError> {
        let (subject_id, email) = match (self.user, self.id) {
            (Some(user), _) => (user.id, user.email),
            (None, Some(id)) => (id, self.email),
            (None, None) => {
                return Err(IdentityError::Unavailable(
                    "Response carries no user id".to_string(),
                ));
            }
        };

        Ok(IdentitySession {
            subject_id,
            email,
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_in: self.expires_in,
        })
    }
}

/// Covers both the current (`error_code`/`msg`) and the legacy
/// (`error`/`error_description`) error shapes.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error_code: Option<String>,
    error: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
}

fn classify_error(status: StatusCode, body: &ErrorBody) -> IdentityError {
    let code = body
        .error_code
        .as_deref()
        .or(body.error.as_deref())
        .unwrap_or_default();
    let message = body
        .msg
        .clone()
        .or_else(|| body.error_description.clone())
        .or_else(|| body.message.clone())
        .unwrap_or_else(|| "Identity provider rejected the request".to_string());
    let lowered = message.to_lowercase();

    // Throttling is transient, never a rejection.
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        return IdentityError::Unavailable(format!("{status}: {message}"));
    }

    match code {
        "weak_password" => IdentityError::WeakPassword(message),
        "email_address_invalid" => IdentityError::InvalidEmail(message),
        "signup_disabled" | "email_provider_disabled" => IdentityError::SignupDisabled,
        "invalid_credentials" | "invalid_grant" | "user_not_found" => {
            IdentityError::InvalidCredentials
        }
        "email_not_confirmed" => IdentityError::EmailNotConfirmed,
        "validation_failed" if lowered.contains("email") => IdentityError::InvalidEmail(message),
        "validation_failed" if lowered.contains("password") => {
            IdentityError::WeakPassword(message)
        }
        _ if lowered.contains("signups not allowed") => IdentityError::SignupDisabled,
        _ if lowered.contains("password should be") => IdentityError::WeakPassword(message),
        _ if lowered.contains("unable to validate email") => IdentityError::InvalidEmail(message),
        _ if lowered.contains("invalid login credentials") => IdentityError::InvalidCredentials,
        _ => IdentityError::Rejected(message),
    }
}
