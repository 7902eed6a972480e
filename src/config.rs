//! Configuration management

use std::{env, fmt, path::Path, time::Duration};

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::translate::ApplicationType;
use crate::{Error, Result};

/// Environment variable prefix for structured overrides (`DCR_BRIDGE_IDP__BASE_URL`).
pub const ENV_PREFIX: &str = "DCR_BRIDGE_";

/// Legacy variable: comma-separated accepted `x-api-key` values.
pub const LEGACY_API_KEYS: &str = "KONG_API_TOKENS";
/// Legacy variable: IdP service token.
pub const LEGACY_API_TOKEN: &str = "OKTA_API_TOKEN";
/// Legacy variable: IdP base URL.
pub const LEGACY_BASE_URL: &str = "OKTA_DOMAIN";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Environment files to load before resolving `env:` references.
    /// Paths support ~ expansion. Loaded in order; variables already set win.
    pub env_files: Vec<String>,
    /// Server configuration
    pub server: ServerConfig,
    /// API-key gate configuration
    pub auth: AuthConfig,
    /// Upstream identity provider
    pub idp: IdpConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Largest accepted request body, in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            max_body_size: 1024 * 1024,
        }
    }
}

/// API-key gate configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Accepted keys (each may be `env:VAR_NAME`). Several keys allow rotation.
    pub api_keys: Vec<String>,
    /// Header carrying the key
    pub header: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_keys: Vec::new(),
            header: "x-api-key".to_string(),
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("api_keys", &format_args!("[{} redacted]", self.api_keys.len()))
            .field("header", &self.header)
            .finish()
    }
}

/// Upstream identity provider configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdpConfig {
    /// Org URL, e.g. `https://example.okta.com` (supports `env:VAR_NAME`)
    pub base_url: String,
    /// Static service token (supports `env:VAR_NAME`)
    pub api_token: String,
    /// `Authorization` scheme placed before the token
    pub auth_scheme: String,
    /// `application_type` registered for every client
    pub application_type: ApplicationType,
    /// Per-request timeout; unset leaves the HTTP client default
    #[serde(with = "humantime_serde::option", skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
}

impl Default for IdpConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_token: String::new(),
            auth_scheme: "SSWS".to_string(),
            application_type: ApplicationType::default(),
            timeout: None,
        }
    }
}

impl fmt::Debug for IdpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdpConfig")
            .field("base_url", &self.base_url)
            .field("api_token", &"[redacted]")
            .field("auth_scheme", &self.auth_scheme)
            .field("application_type", &self.application_type)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl IdpConfig {
    /// Parse the base URL. A bare host name is taken as `https://<host>`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` when the URL is empty or unparseable.
    pub fn parsed_base_url(&self) -> Result<Url> {
        let raw = self.base_url.trim();
        if raw.is_empty() {
            return Err(Error::Config(format!(
                "idp.base_url is required (or set {LEGACY_BASE_URL})"
            )));
        }
        let candidate = if raw.contains("://") {
            raw.to_string()
        } else {
            format!("https://{raw}")
        };
        let url = Url::parse(&candidate)
            .map_err(|e| Error::Config(format!("idp.base_url '{raw}' is invalid: {e}")))?;
        if url.cannot_be_a_base() {
            return Err(Error::Config(format!("idp.base_url '{raw}' cannot be a base URL")));
        }
        Ok(url)
    }
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// # Errors
    ///
    /// Returns an error if the config file does not exist or cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();

        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            figment = figment.merge(Yaml::file(p));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let mut config: Self = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;

        // Env files first so legacy names and env: references can come from them
        config.load_env_files();

        let lookup = |name: &str| env::var(name).ok();
        config.apply_legacy_env(lookup);
        config.resolve_env_refs(lookup);

        Ok(config)
    }

    /// Load environment files into the process environment.
    /// Supports ~ expansion. Files that don't exist are silently skipped.
    fn load_env_files(&self) {
        for path_str in &self.env_files {
            let expanded = match (path_str.strip_prefix('~'), dirs::home_dir()) {
                (Some(rest), Some(home)) => format!("{}{rest}", home.display()),
                _ => path_str.clone(),
            };

            let path = Path::new(&expanded);
            if !path.exists() {
                tracing::debug!("Env file not found (skipped): {expanded}");
                continue;
            }
            match dotenvy::from_path(path) {
                Ok(()) => tracing::info!("Loaded env file: {expanded}"),
                Err(e) => tracing::warn!("Failed to load env file {expanded}: {e}"),
            }
        }
    }

    /// Fill values still unset from the variable names of older deployments
    /// (`KONG_API_TOKENS`, `OKTA_API_TOKEN`, `OKTA_DOMAIN`).
    pub fn apply_legacy_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.auth.api_keys.is_empty() {
            if let Some(keys) = lookup(LEGACY_API_KEYS) {
                self.auth.api_keys = keys
                    .split(',')
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .map(str::to_string)
                    .collect();
            }
        }
        if self.idp.api_token.is_empty() {
            if let Some(token) = lookup(LEGACY_API_TOKEN) {
                self.idp.api_token = token;
            }
        }
        if self.idp.base_url.is_empty() {
            if let Some(url) = lookup(LEGACY_BASE_URL) {
                self.idp.base_url = url;
            }
        }
    }

    /// Replace `env:VAR_NAME` values with the variable's content.
    /// Unset variables leave the reference in place, which `validate` rejects.
    pub fn resolve_env_refs(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let resolve = |value: &mut String| {
            if let Some(resolved) = value.strip_prefix("env:").and_then(&lookup) {
                *value = resolved;
            }
        };

        for key in &mut self.auth.api_keys {
            resolve(key);
        }
        resolve(&mut self.idp.api_token);
        resolve(&mut self.idp.base_url);
    }

    /// Check the configuration is complete enough to serve.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` naming the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.auth.api_keys.is_empty() {
            return Err(Error::Config(format!(
                "auth.api_keys must contain at least one key (or set {LEGACY_API_KEYS})"
            )));
        }
        if self.auth.api_keys.iter().any(|k| k.trim().is_empty()) {
            return Err(Error::Config("auth.api_keys contains a blank key".to_string()));
        }
        if let Some(unresolved) = self
            .auth
            .api_keys
            .iter()
            .chain([&self.idp.api_token, &self.idp.base_url])
            .find_map(|v| v.strip_prefix("env:"))
        {
            return Err(Error::Config(format!(
                "environment variable {unresolved} is not set"
            )));
        }
        if axum::http::HeaderName::try_from(self.auth.header.as_str()).is_err() {
            return Err(Error::Config(format!(
                "auth.header '{}' is not a valid header name",
                self.auth.header
            )));
        }
        if self.idp.api_token.trim().is_empty() {
            return Err(Error::Config(format!(
                "idp.api_token is required (or set {LEGACY_API_TOKEN})"
            )));
        }
        self.idp.parsed_base_url()?;
        Ok(())
    }
}

/// Human-readable `Duration` fields (`"30s"`, `"5m"`, `"100ms"`)
pub mod humantime_serde {
    use std::time::Duration;

    use serde::{self, Deserialize, Deserializer, Serializer};

    /// Serialize Duration to human-readable string (e.g., "30s")
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the serializer fails.
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_millis() == 0 {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        } else {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        }
    }

    /// Deserialize human-readable duration string (e.g., "30s", "5m", "100ms")
    ///
    /// # Errors
    ///
    /// Returns a deserialization error if the string cannot be parsed as a duration.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse(&s).map_err(serde::de::Error::custom)
    }

    /// Parse `"30s"`, `"5m"`, `"100ms"` or bare seconds.
    ///
    /// # Errors
    ///
    /// Returns the parse error text.
    pub fn parse(s: &str) -> Result<Duration, String> {
        let s = s.trim();
        let invalid = |e: std::num::ParseIntError| format!("invalid duration '{s}': {e}");
        // "ms" before "s", or "100ms" would parse as "100m" seconds
        if let Some(ms) = s.strip_suffix("ms") {
            ms.parse::<u64>().map(Duration::from_millis).map_err(invalid)
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.parse::<u64>().map(Duration::from_secs).map_err(invalid)
        } else if let Some(mins) = s.strip_suffix('m') {
            let mins = mins.parse::<u64>().map_err(invalid)?;
            mins.checked_mul(60)
                .map(Duration::from_secs)
                .ok_or_else(|| format!("invalid duration '{s}': too large"))
        } else {
            s.parse::<u64>().map(Duration::from_secs).map_err(invalid)
        }
    }

    /// `Option<Duration>` variant; absent or `null` is `None`.
    pub mod option {
        use std::time::Duration;

        use serde::{Deserialize, Deserializer, Serializer};

        /// Serialize `Some` as a duration string, `None` as unit.
        ///
        /// # Errors
        ///
        /// Returns a serialization error if the serializer fails.
        pub fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(duration) => super::serialize(duration, serializer),
                None => serializer.serialize_none(),
            }
        }

        /// Deserialize an optional duration string.
        ///
        /// # Errors
        ///
        /// Returns a deserialization error if the string cannot be parsed as a duration.
        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Option::<String>::deserialize(deserializer)?
                .map(|s| super::parse(&s).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}
