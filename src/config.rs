use std::net::IpAddr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: IpAddr,
    pub port: u16,
    pub max_body_size: usize,
    pub log_level: String,
    pub identity: IdentityConfig,
}

#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub provider: IdentityBackend,
    /// Secret the provider signs access tokens with.
    pub jwt_secret: String,
    pub jwt_audience: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IdentityBackend {
    GoTrue { url: String, api_key: String },
    Local { signups: SignupMode },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SignupMode {
    Open,
    Closed,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;

        let host: IpAddr = env_or("TENANTPRESS_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid TENANTPRESS_HOST: {e}"))?;

        let port: u16 = env_or("TENANTPRESS_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid TENANTPRESS_PORT: {e}"))?;

        let max_body_size: usize = env_or("TENANTPRESS_MAX_BODY_SIZE", "1048576")
            .parse()
            .map_err(|e| format!("Invalid TENANTPRESS_MAX_BODY_SIZE: {e}"))?;

        let log_level = env_or("TENANTPRESS_LOG_LEVEL", "info");

        Ok(Config {
            database_url,
            host,
            port,
            max_body_size,
            log_level,
            identity: IdentityConfig::from_env()?,
        })
    }
}

impl IdentityConfig {
    pub fn from_env() -> Result<Self, String> {
        let jwt_secret = env_required("IDENTITY_JWT_SECRET")?;
        if jwt_secret.len() < 32 {
            return Err("IDENTITY_JWT_SECRET must be at least 32 characters".to_string());
        }
        let jwt_audience = env_or("IDENTITY_JWT_AUDIENCE", "authenticated");

        let provider = match env_or("IDENTITY_PROVIDER", "gotrue").as_str() {
            "gotrue" => IdentityBackend::GoTrue {
                url: env_required("IDENTITY_URL")?,
                api_key: env_required("IDENTITY_API_KEY")?,
            },
            "local" => IdentityBackend::Local {
                signups: match env_or("IDENTITY_SIGNUPS", "open").as_str() {
                    "closed" => SignupMode::Closed,
                    _ => SignupMode::Open,
                },
            },
            other => return Err(format!("Invalid IDENTITY_PROVIDER: {other}")),
        };

        Ok(IdentityConfig {
            provider,
            jwt_secret,
            jwt_audience,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
