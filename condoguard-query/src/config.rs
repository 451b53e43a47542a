//! Tenancy configuration.
//!
//! Loaded from a TOML document, from `CONDOGUARD_*` environment variables,
//! or assembled with [`TenancyConfig::builder`]. Every loader validates.
//!
//! ```toml
//! mode = "development"
//! root_hosts = ["localhost", "127.0.0.1", "condo.app"]
//! allow_override = true
//! override_param = "tenant"
//! max_per_page = 50
//!
//! [cache]
//! ttl_secs = 300
//! negative_ttl_secs = 30
//! max_entries = 5000
//! ```

use std::env;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryResult};
use crate::tenant::cache::CacheConfig;
use crate::tenant::host::{is_ip_literal, normalize_host};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "CONDOGUARD_";

/// Deployment mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentMode {
    /// Live deployment; tenant overrides are never honoured.
    #[default]
    Production,
    /// Local or staging deployment.
    Development,
}

impl DeploymentMode {
    /// The lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Development => "development",
        }
    }
}

impl fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeploymentMode {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "development" | "dev" => Ok(Self::Development),
            other => Err(QueryError::configuration(format!(
                "unknown deployment mode '{}'",
                other
            ))),
        }
    }
}

/// Directory cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryCacheSettings {
    /// TTL for found tenants, in seconds.
    pub ttl_secs: u64,
    /// TTL for unknown subdomains, in seconds.
    pub negative_ttl_secs: u64,
    /// Maximum cached subdomains.
    pub max_entries: usize,
}

impl Default for DirectoryCacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            negative_ttl_secs: 60,
            max_entries: 10_000,
        }
    }
}

impl DirectoryCacheSettings {
    /// Convert to a [`CacheConfig`].
    pub fn to_cache_config(&self) -> CacheConfig {
        CacheConfig::new(self.max_entries)
            .with_ttl(Duration::from_secs(self.ttl_secs))
            .with_negative_ttl(Duration::from_secs(self.negative_ttl_secs))
    }
}

/// Configuration for tenant resolution and scoped queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TenancyConfig {
    /// Deployment mode.
    pub mode: DeploymentMode,
    /// Shared hosts that never name a tenant by themselves.
    pub root_hosts: Vec<String>,
    /// Whether the override parameter is honoured outside production.
    pub allow_override: bool,
    /// Query parameter carrying the override.
    pub override_param: String,
    /// Upper bound for `per_page` in paginated reads.
    pub max_per_page: u64,
    /// Directory cache settings.
    pub cache: DirectoryCacheSettings,
}

impl Default for TenancyConfig {
    fn default() -> Self {
        Self {
            mode: DeploymentMode::Production,
            root_hosts: vec!["localhost".to_string(), "127.0.0.1".to_string()],
            allow_override: true,
            override_param: "tenant".to_string(),
            max_per_page: 100,
            cache: DirectoryCacheSettings::default(),
        }
    }
}

impl TenancyConfig {
    /// Create a builder.
    pub fn builder() -> TenancyConfigBuilder {
        TenancyConfigBuilder::new()
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> QueryResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| {
            QueryError::configuration(format!("invalid tenancy config: {}", e)).with_source(e)
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> QueryResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            QueryError::configuration(format!("cannot read {}: {}", path.display(), e))
                .with_source(e)
        })?;
        Self::from_toml_str(&content)
    }

    /// Build from the process environment.
    ///
    /// Environment variables:
    /// - `CONDOGUARD_ENV` - `production` or `development`
    /// - `CONDOGUARD_ROOT_HOSTS` - comma-separated shared hosts
    /// - `CONDOGUARD_ALLOW_OVERRIDE` - `1`/`true` or `0`/`false`
    /// - `CONDOGUARD_OVERRIDE_PARAM` - override query parameter name
    /// - `CONDOGUARD_MAX_PER_PAGE` - pagination upper bound
    /// - `CONDOGUARD_CACHE_TTL_SECS`, `CONDOGUARD_CACHE_NEGATIVE_TTL_SECS`,
    ///   `CONDOGUARD_CACHE_MAX_ENTRIES` - directory cache
    pub fn from_env() -> QueryResult<Self> {
        Self::from_vars(env::vars())
    }

    /// Build from `(name, value)` pairs, using only `CONDOGUARD_*` names.
    pub fn from_vars<K, V>(vars: impl IntoIterator<Item = (K, V)>) -> QueryResult<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Self::default();
        for (key, value) in vars {
            let Some(name) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value = value.as_ref().trim();
            match name {
                "ENV" => config.mode = value.parse()?,
                "ROOT_HOSTS" => {
                    config.root_hosts = value
                        .split(',')
                        .map(|h| h.trim().to_ascii_lowercase())
                        .filter(|h| !h.is_empty())
                        .collect();
                }
                "ALLOW_OVERRIDE" => config.allow_override = parse_bool(name, value)?,
                "OVERRIDE_PARAM" => config.override_param = value.to_string(),
                "MAX_PER_PAGE" => config.max_per_page = parse_num(name, value)?,
                "CACHE_TTL_SECS" => config.cache.ttl_secs = parse_num(name, value)?,
                "CACHE_NEGATIVE_TTL_SECS" => {
                    config.cache.negative_ttl_secs = parse_num(name, value)?
                }
                "CACHE_MAX_ENTRIES" => config.cache.max_entries = parse_num(name, value)?,
                _ => {}
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values that cannot work.
    pub fn validate(&self) -> QueryResult<()> {
        if self.max_per_page == 0 {
            return Err(QueryError::configuration("max_per_page must be at least 1"));
        }
        if self.override_param.trim().is_empty() {
            return Err(QueryError::configuration("override_param must not be empty"));
        }
        if self.root_hosts.iter().any(|h| h.trim().is_empty()) {
            return Err(QueryError::configuration("root_hosts must not contain empty hosts"));
        }
        Ok(())
    }

    /// Whether this is a production deployment.
    pub fn is_production(&self) -> bool {
        self.mode == DeploymentMode::Production
    }

    /// Whether an explicit tenant override may be honoured.
    pub fn allows_override(&self) -> bool {
        self.allow_override && !self.is_production()
    }

    /// Whether `host` is a shared host: configured, or an IP literal.
    pub fn is_root_host(&self, host: &str) -> bool {
        let Some(host) = normalize_host(host) else {
            return false;
        };
        is_ip_literal(&host)
            || self
                .root_hosts
                .iter()
                .any(|root| root.eq_ignore_ascii_case(&host))
    }
}

fn parse_bool(name: &str, value: &str) -> QueryResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(QueryError::configuration(format!(
            "{}{} expects a boolean, got '{}'",
            ENV_PREFIX, name, value
        ))),
    }
}

fn parse_num<T: FromStr>(name: &str, value: &str) -> QueryResult<T> {
    value.parse().map_err(|_| {
        QueryError::configuration(format!(
            "{}{} expects a number, got '{}'",
            ENV_PREFIX, name, value
        ))
    })
}

/// Builder for [`TenancyConfig`].
#[derive(Debug, Default)]
pub struct TenancyConfigBuilder {
    config: TenancyConfig,
}

impl TenancyConfigBuilder {
    /// Create a builder seeded with the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the deployment mode.
    pub fn mode(mut self, mode: DeploymentMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Shorthand for development mode.
    pub fn development(self) -> Self {
        self.mode(DeploymentMode::Development)
    }

    /// Add a shared host.
    pub fn root_host(mut self, host: impl Into<String>) -> Self {
        self.config.root_hosts.push(host.into().to_ascii_lowercase());
        self
    }

    /// Replace the shared hosts.
    pub fn root_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.root_hosts = hosts
            .into_iter()
            .map(|h| h.into().to_ascii_lowercase())
            .collect();
        self
    }

    /// Enable or disable the override parameter.
    pub fn allow_override(mut self, allow: bool) -> Self {
        self.config.allow_override = allow;
        self
    }

    /// Set the override parameter name.
    pub fn override_param(mut self, name: impl Into<String>) -> Self {
        self.config.override_param = name.into();
        self
    }

    /// Set the pagination upper bound.
    pub fn max_per_page(mut self, max: u64) -> Self {
        self.config.max_per_page = max;
        self
    }

    /// Set the directory cache settings.
    pub fn cache(mut self, cache: DirectoryCacheSettings) -> Self {
        self.config.cache = cache;
        self
    }

    /// Validate and build.
    pub fn build(self) -> QueryResult<TenancyConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
