//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STRIPE_SECRET_KEY` - Stripe API secret key (high entropy, no placeholders)
//!
//! ## Optional
//! - `DARKROOM_HOST` - Bind address (default: 127.0.0.1)
//! - `DARKROOM_PORT` - Listen port (default: 8080)
//! - `DARKROOM_DATABASE_URL` - `PostgreSQL` connection string, falls back to
//!   `DATABASE_URL`. Without either the server keeps everything in memory.
//! - `DARKROOM_ADMIN_TOKEN` - Bearer token for `/admin/*` (min 32 chars).
//!   Without it the admin routes are open.
//! - `STRIPE_WEBHOOK_SECRET` - Webhook signing secret (`whsec_...`). Without
//!   it every webhook delivery is rejected.
//! - `STRIPE_API_BASE` - Stripe API base URL (default: <https://api.stripe.com>)
//! - `STRIPE_WEBHOOK_TOLERANCE_SECS` - Max webhook timestamp age (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `DARKROOM_LOG_FORMAT` - `json` for structured logs, anything else for text

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_ADMIN_TOKEN_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";
const DEFAULT_WEBHOOK_TOLERANCE_SECS: u64 = 300;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// `PostgreSQL` connection URL; `None` selects the in-memory store
    pub database_url: Option<SecretString>,
    /// Bearer token guarding the admin routes
    pub admin_token: Option<SecretString>,
    /// Stripe configuration
    pub stripe: StripeConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production")
    pub sentry_environment: Option<String>,
    /// Emit JSON log lines instead of text
    pub json_logs: bool,
}

/// Stripe API and webhook configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct StripeConfig {
    /// API secret key (`sk_...`)
    pub secret_key: SecretString,
    /// Webhook endpoint signing secret (`whsec_...`)
    pub webhook_secret: Option<SecretString>,
    /// API base URL
    pub api_base: Url,
    /// Maximum accepted age of a signed webhook
    pub webhook_tolerance: Duration,
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("secret_key", &"[REDACTED]")
            .field(
                "webhook_secret",
                &self.webhook_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("api_base", &self.api_base.as_str())
            .field("webhook_tolerance", &self.webhook_tolerance)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("DARKROOM_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("DARKROOM_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("DARKROOM_PORT", "8080")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("DARKROOM_PORT".to_string(), e.to_string()))?;

        let database_url = get_database_url("DARKROOM_DATABASE_URL");

        let admin_token = match get_optional_env("DARKROOM_ADMIN_TOKEN") {
            Some(value) => {
                let token = SecretString::from(value);
                validate_admin_token(&token, "DARKROOM_ADMIN_TOKEN")?;
                validate_secret_strength(token.expose_secret(), "DARKROOM_ADMIN_TOKEN")?;
                Some(token)
            }
            None => None,
        };

        let stripe = StripeConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let json_logs = get_optional_env("DARKROOM_LOG_FORMAT")
            .is_some_and(|format| format.eq_ignore_ascii_case("json"));

        Ok(Self {
            host,
            port,
            database_url,
            admin_token,
            stripe,
            sentry_dsn,
            sentry_environment,
            json_logs,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl StripeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let secret_key = get_validated_secret("STRIPE_SECRET_KEY")?;

        let webhook_secret = match get_optional_env("STRIPE_WEBHOOK_SECRET") {
            Some(value) => {
                validate_secret_strength(&value, "STRIPE_WEBHOOK_SECRET")?;
                Some(SecretString::from(value))
            }
            None => None,
        };

        let api_base = Url::parse(&get_env_or_default("STRIPE_API_BASE", DEFAULT_STRIPE_API_BASE))
            .map_err(|e| ConfigError::InvalidEnvVar("STRIPE_API_BASE".to_string(), e.to_string()))?;

        let tolerance_secs = get_env_or_default(
            "STRIPE_WEBHOOK_TOLERANCE_SECS",
            &DEFAULT_WEBHOOK_TOLERANCE_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("STRIPE_WEBHOOK_TOLERANCE_SECS".to_string(), e.to_string())
        })?;

        Ok(Self {
            secret_key,
            webhook_secret,
            api_base,
            webhook_tolerance: Duration::from_secs(tolerance_secs),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Option<SecretString> {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .map(SecretString::from)
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate that the admin token meets minimum length requirements.
fn validate_admin_token(token: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = token.expose_secret();
    if value.len() < MIN_ADMIN_TOKEN_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_ADMIN_TOKEN_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
