//! Service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SNAPDISH_BACKEND_URL` - Base URL of the hosted backend project
//! - `SNAPDISH_BACKEND_ANON_KEY` - Public anon key for the project
//!
//! ## Optional
//! - `SNAPDISH_STORAGE_BUCKET` - Bucket for uploaded images (default: submissions)
//! - `SNAPDISH_FREE_PACKAGE_NAME` - Package assigned to new clients (default: Tasting Package)
//! - `SNAPDISH_WEBHOOK_URL` - Endpoint notified after each submission
//! - `SNAPDISH_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: none)
//! - `SNAPDISH_REQUEST_MAX_ATTEMPTS` - Attempts per backend request (default: 1)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::collections::HashMap;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use crate::backend::RequestPolicy;
use crate::services::identity::DEFAULT_FREE_PACKAGE_NAME;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.0;
const DEFAULT_STORAGE_BUCKET: &str = "submissions";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "xxx",
    "todo",
    "insert",
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

/// Full service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Hosted backend connection
    pub backend: BackendConfig,
    /// Name of the package seeded onto every new client
    pub free_package_name: String,
    /// Endpoint notified after each submission
    pub webhook_url: Option<String>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Hosted backend connection settings.
///
/// Implements `Debug` manually to redact the anon key.
#[derive(Clone)]
pub struct BackendConfig {
    /// Project base URL (e.g., <https://abc.backend.example>)
    pub url: String,
    /// Public anon key sent as `apikey` on every request
    pub anon_key: SecretString,
    /// Storage bucket for uploaded images
    pub storage_bucket: String,
    /// Timeout and retry policy applied to every request
    pub request_policy: RequestPolicy,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url)
            .field("anon_key", &"[REDACTED]")
            .field("storage_bucket", &self.storage_bucket)
            .field("request_policy", &self.request_policy)
            .finish()
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, or
    /// if the anon key looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`ServiceConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(&lookup);

        let url = env.required("SNAPDISH_BACKEND_URL")?;
        Url::parse(&url).map_err(|e| {
            ConfigError::InvalidEnvVar("SNAPDISH_BACKEND_URL".to_string(), e.to_string())
        })?;
        let anon_key = env.validated_secret("SNAPDISH_BACKEND_ANON_KEY")?;

        let timeout = env
            .parsed::<u64>("SNAPDISH_REQUEST_TIMEOUT_SECS")?
            .map(Duration::from_secs);
        let max_attempts = env
            .parsed::<u32>("SNAPDISH_REQUEST_MAX_ATTEMPTS")?
            .unwrap_or(1);
        if max_attempts == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "SNAPDISH_REQUEST_MAX_ATTEMPTS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let backend = BackendConfig {
            url,
            anon_key,
            storage_bucket: env.or_default("SNAPDISH_STORAGE_BUCKET", DEFAULT_STORAGE_BUCKET),
            request_policy: RequestPolicy {
                timeout,
                max_attempts,
                ..RequestPolicy::default()
            },
        };

        Ok(Self {
            backend,
            free_package_name: env.or_default("SNAPDISH_FREE_PACKAGE_NAME", DEFAULT_FREE_PACKAGE_NAME),
            webhook_url: env.optional("SNAPDISH_WEBHOOK_URL"),
            sentry_dsn: env.optional("SENTRY_DSN"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable lookup with the typed accessors used above.
struct Env<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    /// Get an optional variable, treating blank values as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn parsed<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key)
            .map(|raw| {
                raw.trim()
                    .parse::<T>()
                    .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
            })
            .transpose()
    }

    /// Load and validate a secret.
    fn validated_secret(&self, key: &str) -> Result<SecretString, ConfigError> {
        let value = SecretString::from(self.required(key)?);
        validate_secret_strength(value.expose_secret(), key)?;
        Ok(value)
    }
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

    #[allow(clippy::cast_precision_loss)] // Key length will never exceed f64 precision
    let len = s.chars().count() as f64;
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

    // Real anon keys are signed JWTs with high entropy
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Copy the key from the project settings."
            ),
        ));
    }

    Ok(())
}
