//! In-process identity provider for development and tests.
//!
//! Issues the same HS256 access tokens a GoTrue server would, so request
//! authentication does not care which provider is configured.

use std::sync::LazyLock;

use argon2::Argon2;
use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
};
use async_trait::async_trait;
use chrono::Duration;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use regex::Regex;
use uuid::Uuid;

use super::{IdentityError, IdentityProvider, IdentitySession};
use crate::auth::jwt::{Claims, encode_token};

pub const MIN_PASSWORD_LEN: usize = 8;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
});

struct Account {
    subject_id: String,
    email: String,
    password_hash: String,
}

pub struct LocalIdentityProvider {
    /// Keyed by lowercased email.
    accounts: DashMap<String, Account>,
    jwt_secret: String,
    audience: String,
    signups_enabled: bool,
    token_ttl: Duration,
}

impl LocalIdentityProvider {
    pub fn new(jwt_secret: &str, audience: &str, signups_enabled: bool) -> Self {
        Self {
            accounts: DashMap::new(),
            jwt_secret: jwt_secret.to_string(),
            audience: audience.to_string(),
            signups_enabled,
            token_ttl: Duration::hours(1),
        }
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    fn issue_session(&self, subject_id: &str, email: &str) -> Result<IdentitySession, IdentityError> {
        let claims = Claims::new(subject_id, email, &self.audience, self.token_ttl);
        let access_token = encode_token(&claims, &self.jwt_secret).map_err(IdentityError::Unavailable)?;
        let refresh: [u8; 32] = rand::random();

        Ok(IdentitySession {
            subject_id: subject_id.to_string(),
            email: Some(email.to_string()),
            access_token: Some(access_token),
            refresh_token: Some(hex::encode(refresh)),
            expires_in: Some(self.token_ttl.num_seconds()),
        })
    }
}

async fn hash_password(password: &str) -> Result<String, IdentityError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
    })
    .await
    .map_err(|e| IdentityError::Unavailable(format!("Hashing task failed: {e}")))?
    .map_err(|e| IdentityError::Unavailable(format!("Hashing failed: {e}")))
}

async fn verify_password(password: &str, hash: &str) -> Result<bool, IdentityError> {
    let (password, hash) = (password.to_string(), hash.to_string());
    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&hash).map_err(|e| format!("Invalid hash: {e}"))?;
        Ok::<_, String>(
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
        )
    })
    .await
    .map_err(|e| IdentityError::Unavailable(format!("Verify task failed: {e}")))?
    .map_err(IdentityError::Unavailable)
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        _display_name: &str,
    ) -> Result<IdentitySession, IdentityError> {
        if !self.signups_enabled {
            return Err(IdentityError::SignupDisabled);
        }
        if !EMAIL_RE.is_match(email) {
            return Err(IdentityError::InvalidEmail(format!(
                "Unable to validate email address: {email}"
            )));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(IdentityError::WeakPassword(format!(
                "Password should be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let password_hash = hash_password(password).await?;
        let key = email.to_lowercase();
        let subject_id = Uuid::now_v7().to_string();

        match self.accounts.entry(key) {
            Entry::Occupied(_) => {
                return Err(IdentityError::Rejected("User already registered".to_string()));
            }
            Entry::Vacant(slot) => {
                slot.insert(Account {
                    subject_id: subject_id.clone(),
                    email: email.to_string(),
                    password_hash,
                });
            }
        }

        tracing::debug!(subject_id = %subject_id, "Local identity created");
        self.issue_session(&subject_id, email)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<IdentitySession, IdentityError> {
        let (subject_id, stored_email, hash) = {
            let Some(account) = self.accounts.get(&email.to_lowercase()) else {
                return Err(IdentityError::InvalidCredentials);
            };
            (
                account.subject_id.clone(),
                account.email.clone(),
                account.password_hash.clone(),
            )
        };

        if !verify_password(password, &hash).await? {
            return Err(IdentityError::InvalidCredentials);
        }

        self.issue_session(&subject_id, &stored_email)
    }
}
