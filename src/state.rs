use std::sync::Arc;

use crate::config::{Config, IdentityBackend, SignupMode};
use crate::db::Store;
use crate::identity::IdentityProvider;
use crate::identity::gotrue::GoTrueProvider;
use crate::identity::local::LocalIdentityProvider;
use crate::rate_limit::LoginRateLimiter;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub store: Store,
    pub identity: Arc<dyn IdentityProvider>,
    pub config: Config,
    pub login_limiter: LoginRateLimiter,
}

impl AppState {
    pub fn new(store: Store, identity: Arc<dyn IdentityProvider>, config: Config) -> Self {
        Self {
            store,
            identity,
            config,
            login_limiter: LoginRateLimiter::new(),
        }
    }
}

/// Build the identity provider selected by configuration.
pub fn identity_provider(config: &Config) -> Result<Arc<dyn IdentityProvider>, String> {
    let identity = &config.identity;
    match identity.provider {
        IdentityBackend::GoTrue {
            ref url,
            ref api_key,
        } => Ok(Arc::new(GoTrueProvider::new(url, api_key)?)),
        IdentityBackend::Local { signups } => {
            tracing::warn!("Using in-process identity provider; accounts are not persisted");
            Ok(Arc::new(LocalIdentityProvider::new(
                &identity.jwt_secret,
                &identity.jwt_audience,
                signups == SignupMode::Open,
            )))
        }
    }
}
