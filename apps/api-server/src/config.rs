//! Application configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use forum_core::services::ResetPolicy;
use forum_infra::{DatabaseConfig, JwtConfig};

/// Session cookie settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub cookie_name: String,
    /// Set the `Secure` attribute. Enable behind HTTPS.
    pub secure: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "forum_sid".to_string(),
            secure: false,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    pub jwt: JwtConfig,
    pub session: SessionConfig,
    pub reset: ResetPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database: None,
            jwt: JwtConfig::default(),
            session: SessionConfig::default(),
            reset: ResetPolicy::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let is_production = env::var("RUST_ENV")
            .map(|v| v == "production" || v == "prod")
            .unwrap_or(false);

        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            database: DatabaseConfig::from_env(),
            jwt: JwtConfig::from_env(),
            session: SessionConfig {
                cookie_name: env::var("COOKIE_NAME").unwrap_or(defaults.session.cookie_name),
                secure: env::var("COOKIE_SECURE")
                    .map(|v| v == "true" || v == "1")
                    .unwrap_or(is_production),
            },
            reset: ResetPolicy {
                link_base_url: env::var("RESET_LINK_BASE_URL")
                    .unwrap_or(defaults.reset.link_base_url),
                token_ttl: env::var("RESET_TOKEN_TTL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.reset.token_ttl),
            },
        }
    }
}
