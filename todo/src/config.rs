//! Backend configuration.
//!
//! The GraphQL endpoint and its credentials are configured once per process,
//! before the view is mounted. [`install`] stores the configuration and hands
//! back a `'static` reference that callers pass on explicitly; nothing in the
//! crate reads the installed value behind the caller's back.
//!
//! Configuration comes either from environment variables or from a backend
//! exports file (the JSON document the hosting service generates):
//!
//! | Variable | Exports key | Meaning |
//! |---|---|---|
//! | `TODO_GRAPHQL_ENDPOINT` | `aws_appsync_graphqlEndpoint` | GraphQL URL |
//! | `TODO_REGION` | `aws_appsync_region` | Backend region |
//! | `TODO_AUTH_MODE` | `aws_appsync_authenticationType` | `API_KEY` or `AMAZON_COGNITO_USER_POOLS` |
//! | `TODO_API_KEY` | `aws_appsync_apiKey` | API key (API key mode) |
//!
//! `TODO_EXPORTS_PATH` selects an exports file instead of the variables.

use serde::Deserialize;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

/// Environment variable naming an exports file
pub const EXPORTS_PATH_VAR: &str = "TODO_EXPORTS_PATH";
/// Environment variable for the GraphQL endpoint
pub const ENDPOINT_VAR: &str = "TODO_GRAPHQL_ENDPOINT";
/// Environment variable for the backend region
pub const REGION_VAR: &str = "TODO_REGION";
/// Environment variable for the authorization mode
pub const AUTH_MODE_VAR: &str = "TODO_AUTH_MODE";
/// Environment variable for the API key
pub const API_KEY_VAR: &str = "TODO_API_KEY";

/// Default timeout for a single GraphQL request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

static INSTALLED: OnceLock<AppConfig> = OnceLock::new();

/// Configuration errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required setting is absent.
    #[error("missing configuration: {0}")]
    Missing(&'static str),

    /// A setting is present but unusable.
    #[error("invalid configuration for {key}: {reason}")]
    Invalid {
        /// Offending setting
        key: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// [`install`] was called a second time.
    #[error("configuration already initialized")]
    AlreadyInitialized,

    /// The exports file could not be read.
    #[error("failed to read exports file: {0}")]
    Io(String),

    /// The exports file is not valid JSON of the expected shape.
    #[error("failed to parse exports file: {0}")]
    Parse(String),
}

/// How requests to the GraphQL API are authorized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Static API key sent in `x-api-key`
    ApiKey,
    /// The signed-in user's id token sent in `Authorization`
    UserPool,
}

impl std::str::FromStr for AuthMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "API_KEY" => Ok(Self::ApiKey),
            "AMAZON_COGNITO_USER_POOLS" => Ok(Self::UserPool),
            other => Err(ConfigError::Invalid {
                key: AUTH_MODE_VAR,
                reason: format!("unsupported authorization mode `{other}`"),
            }),
        }
    }
}

/// Backend configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// GraphQL endpoint URL
    pub endpoint: String,
    /// Backend region
    pub region: String,
    /// Authorization mode
    pub auth_mode: AuthMode,
    /// API key, required in [`AuthMode::ApiKey`]
    pub api_key: Option<String>,
    /// Timeout for a single request
    pub request_timeout: Duration,
}

/// Shape of the exports file
#[derive(Deserialize)]
struct Exports {
    #[serde(rename = "aws_appsync_graphqlEndpoint")]
    endpoint: Option<String>,
    #[serde(rename = "aws_appsync_region")]
    region: Option<String>,
    #[serde(rename = "aws_appsync_authenticationType")]
    auth_mode: Option<String>,
    #[serde(rename = "aws_appsync_apiKey")]
    api_key: Option<String>,
}

impl AppConfig {
    /// Create a configuration using an API key
    #[must_use]
    pub fn with_api_key(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            region: String::new(),
            auth_mode: AuthMode::ApiKey,
            api_key: Some(api_key.into()),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Create a configuration using user pool tokens
    #[must_use]
    pub fn with_user_pool(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            region: String::new(),
            auth_mode: AuthMode::UserPool,
            api_key: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Set the region
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Set the request timeout
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Load configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a setting is missing or invalid, or if the
    /// exports file cannot be read.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through a variable lookup function
    ///
    /// # Errors
    ///
    /// See [`AppConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(EXPORTS_PATH_VAR) {
            let json = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::Io(format!("{path}: {e}")))?;
            return Self::from_exports_json(&json);
        }

        Self::build(
            lookup(ENDPOINT_VAR),
            lookup(REGION_VAR),
            lookup(AUTH_MODE_VAR),
            lookup(API_KEY_VAR),
        )
    }

    /// Parse a backend exports document
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON, otherwise the
    /// validation errors of [`AppConfig::validate`].
    pub fn from_exports_json(json: &str) -> Result<Self, ConfigError> {
        let exports: Exports =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;

        Self::build(
            exports.endpoint,
            exports.region,
            exports.auth_mode,
            exports.api_key,
        )
    }

    fn build(
        endpoint: Option<String>,
        region: Option<String>,
        auth_mode: Option<String>,
        api_key: Option<String>,
    ) -> Result<Self, ConfigError> {
        let endpoint = endpoint
            .filter(|e| !e.is_empty())
            .ok_or(ConfigError::Missing(ENDPOINT_VAR))?;

        // Without an explicit mode, a present key implies API key mode.
        let auth_mode = match auth_mode {
            Some(mode) => mode.parse()?,
            None if api_key.is_some() => AuthMode::ApiKey,
            None => AuthMode::UserPool,
        };

        let config = Self {
            endpoint,
            region: region.unwrap_or_default(),
            auth_mode,
            api_key: api_key.filter(|k| !k.is_empty()),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration is usable
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Invalid`] if the endpoint is not an http(s) URL
    /// - [`ConfigError::Missing`] if API key mode has no key
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.endpoint.starts_with("https://") || self.endpoint.starts_with("http://")) {
            return Err(ConfigError::Invalid {
                key: ENDPOINT_VAR,
                reason: format!("`{}` is not an http(s) URL", self.endpoint),
            });
        }

        if self.auth_mode == AuthMode::ApiKey && self.api_key.is_none() {
            return Err(ConfigError::Missing(API_KEY_VAR));
        }

        Ok(())
    }
}

/// Install the process-wide configuration
///
/// Must be called exactly once, before the view is mounted. The returned
/// reference is what the rest of the program receives.
///
/// # Errors
///
/// - [`ConfigError::AlreadyInitialized`] on a second call
/// - validation errors from [`AppConfig::validate`]
pub fn install(config: AppConfig) -> Result<&'static AppConfig, ConfigError> {
    config.validate()?;

    let mut fresh = false;
    let installed = INSTALLED.get_or_init(|| {
        fresh = true;
        config
    });

    if fresh {
        tracing::info!(
            endpoint = %installed.endpoint,
            region = %installed.region,
            auth_mode = ?installed.auth_mode,
            "Backend configuration installed"
        );
        Ok(installed)
    } else {
        Err(ConfigError::AlreadyInitialized)
    }
}
