use super::{IdentityError, IdentityProvider, IdentitySession};
use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct BridgeOutcome {
    pub subject_id: String,
    pub is_new_subject: bool,
    pub session: IdentitySession,
}

/// Resolve credentials to a provider subject, creating the subject when
/// sign-in does not find it.
///
/// Sign-in is tried first. A provider outage or an unconfirmed account
/// aborts before sign-up is tried.
pub async fn sign_in_or_sign_up(
    provider: &dyn IdentityProvider,
    email: &str,
    password: &str,
    display_name: &str,
) -> Result<BridgeOutcome, AppError> {
    match provider.sign_in(email, password).await {
        Ok(session) => {
            return Ok(BridgeOutcome {
                subject_id: session.subject_id.clone(),
                is_new_subject: false,
                session,
            });
        }
        Err(IdentityError::Unavailable(msg)) => return Err(AppError::Upstream(msg)),
        // The subject exists; sign-up would only report a duplicate.
        Err(IdentityError::EmailNotConfirmed) => {
            return Err(IdentityError::EmailNotConfirmed.into());
        }
        Err(err) => {
            tracing::debug!("Sign-in failed ({err}), attempting sign-up");
        }
    }

    let session = provider
        .sign_up(email, password, display_name)
        .await
        .map_err(|err| {
            tracing::info!("Sign-up rejected by identity provider: {err}");
            AppError::from(err)
        })?;

    Ok(BridgeOutcome {
        subject_id: session.subject_id.clone(),
        is_new_subject: true,
        session,
    })
}
