//! Configuration management for the gate and the demo server.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use recaptcha_common::constants::{
    DEFAULT_BODY_LIMIT_BYTES, DEFAULT_LISTEN_ADDR, DEFAULT_TIMEOUT_SECS, DEFAULT_TOKEN_LOCATION,
    DEFAULT_VERIFICATION_URL,
};
use recaptcha_common::{GateError, QueriedUser, RoleThreshold};

/// Process-wide gate configuration, set once at startup
static GLOBAL: OnceLock<Arc<GateConfig>> = OnceLock::new();

/// Gate configuration. Read-only once constructed.
#[derive(Debug, Clone, Deserialize)]
pub struct GateConfig {
    /// Secret shared with the verification service
    #[serde(default)]
    pub secret_key: Option<String>,

    /// Verification endpoint (Google siteverify when unset)
    #[serde(default)]
    pub verification_url: Option<String>,

    /// Property path of the token inside the request
    #[serde(default)]
    pub token_location: Option<String>,

    /// When false every token verifies without a remote call
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Timeout for the verification call in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Role indices for role-aware gates
    #[serde(default)]
    pub role_threshold: RoleThreshold,

    /// Largest request body the adapter will buffer
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_enabled() -> bool { true }
fn default_timeout() -> u64 { DEFAULT_TIMEOUT_SECS }
fn default_body_limit() -> usize { DEFAULT_BODY_LIMIT_BYTES }
fn default_listen_addr() -> String { DEFAULT_LISTEN_ADDR.to_string() }

impl GateConfig {
    pub fn with_secret(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: Some(secret_key.into()),
            ..Default::default()
        }
    }

    /// Secret key, if present and non-empty
    pub fn secret(&self) -> Option<&str> {
        self.secret_key.as_deref().filter(|s| !s.is_empty())
    }

    pub fn verification_url(&self) -> &str {
        self.verification_url.as_deref().unwrap_or(DEFAULT_VERIFICATION_URL)
    }

    pub fn token_location(&self) -> &str {
        self.token_location.as_deref().unwrap_or(DEFAULT_TOKEN_LOCATION)
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            verification_url: None,
            token_location: None,
            enabled: default_enabled(),
            timeout_secs: default_timeout(),
            role_threshold: RoleThreshold::default(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

/// Install the process-wide configuration used by gates built without one.
pub fn install_global(config: GateConfig) -> Result<Arc<GateConfig>, GateError> {
    let config = Arc::new(config);
    GLOBAL
        .set(config.clone())
        .map_err(|_| GateError::Config("global configuration already installed".into()))?;
    Ok(config)
}

/// Pick the explicit configuration, else the global one.
pub fn resolve(explicit: Option<&Arc<GateConfig>>) -> Result<Arc<GateConfig>, GateError> {
    resolve_from(explicit, GLOBAL.get())
}

fn resolve_from(
    explicit: Option<&Arc<GateConfig>>,
    global: Option<&Arc<GateConfig>>,
) -> Result<Arc<GateConfig>, GateError> {
    explicit
        .or(global)
        .cloned()
        .ok_or_else(|| GateError::Config("no reCAPTCHA configuration available".into()))
}

/// Demo server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Gate settings
    #[serde(default)]
    pub gate: GateConfig,

    /// Users addressable by the account-flag route
    #[serde(default)]
    pub directory: Vec<QueriedUser>,
}

/// Values supplied on the command line, applied over file and environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub secret_key: Option<String>,
    pub listen_addr: Option<String>,
    pub disable_verification: bool,
}

impl AppConfig {
    /// Load configuration from file and `RECAPTCHA_*` environment, with CLI overrides
    pub fn load(config_path: &str, overrides: &ConfigOverrides) -> Result<Self> {
        let mut builder = config::Config::builder();

        if Path::new(config_path).exists() {
            builder = builder.add_source(config::File::with_name(config_path));
        } else {
            tracing::warn!(path = %config_path, "Config file not found, using defaults");
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix("RECAPTCHA")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to load configuration")?;

        let mut config: AppConfig = settings
            .try_deserialize()
            .context("Failed to parse configuration")?;

        if let Some(ref secret) = overrides.secret_key {
            config.gate.secret_key = Some(secret.clone());
        }
        if let Some(ref listen) = overrides.listen_addr {
            config.listen_addr = listen.clone();
        }
        if overrides.disable_verification {
            config.gate.enabled = false;
        }

        Ok(config)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            gate: GateConfig::default(),
            directory: Vec::new(),
        }
    }
}
