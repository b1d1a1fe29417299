//! # Catalog Configuration
//!
//! ## Load Order (later overrides earlier)
//! 1. Default values
//! 2. Config file (`catalog.toml`, path from `SHOPFRONT_CONFIG` or the caller)
//! 3. Environment variables
//!
//! ```toml
//! # catalog.toml
//! title_min_len = 10
//! title_max_len = 100
//! min_price = "1.00"
//! max_variant_spread = 5
//! database_path = "shopfront.db"
//! log_format = "json"
//! log_level = "info,shopfront_catalog=debug"
//! media_types = ["image/png", "image/jpeg"]
//! media_max_size = 5242880
//! ```
//!
//! | Variable                       | Default            |
//! |--------------------------------|--------------------|
//! | `SHOPFRONT_TITLE_MIN_LEN`      | `10`               |
//! | `SHOPFRONT_TITLE_MAX_LEN`      | `100`              |
//! | `SHOPFRONT_MIN_PRICE`          | `1.00`             |
//! | `SHOPFRONT_MAX_VARIANT_SPREAD` | `5`                |
//! | `SHOPFRONT_DATABASE_PATH`      | `shopfront.db`     |
//! | `SHOPFRONT_JWT_SECRET`         | dev secret         |
//! | `SHOPFRONT_JWT_LIFETIME_SECS`  | `3600`             |
//! | `SHOPFRONT_LOG_FORMAT`         | `pretty`           |
//! | `SHOPFRONT_LOG_LEVEL`          | `info`             |
//! | `SHOPFRONT_MEDIA_TYPES`        | png,jpeg,webp,gif  |
//! | `SHOPFRONT_MEDIA_MAX_SIZE`     | `5242880` (bytes)  |
//!
//! `SHOPFRONT_MEDIA_TYPES` is a comma-separated list of MIME types.

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use shopfront_core::money::Money;
use shopfront_core::validation::ValidationRules;
use tracing::{debug, info};

use crate::media::MediaLimits;

/// Environment variable naming the optional config file.
pub const CONFIG_PATH_ENV: &str = "SHOPFRONT_CONFIG";

const DEV_JWT_SECRET: &str = "shopfront-dev-secret-change-in-production";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(ConfigError::InvalidValue("SHOPFRONT_LOG_FORMAT".to_string())),
        }
    }
}

/// Catalog configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Minimum title length in characters
    pub title_min_len: usize,

    /// Maximum title length in characters
    pub title_max_len: usize,

    /// Prices must be strictly above this
    pub min_price: Money,

    /// Largest allowed max/min variant price ratio
    pub max_variant_spread: i64,

    /// SQLite database file
    pub database_path: PathBuf,

    /// HS256 secret for bearer tokens
    pub jwt_secret: String,

    /// Lifetime of issued tokens in seconds
    pub jwt_lifetime_secs: i64,

    pub log_format: LogFormat,

    /// `EnvFilter` directive string
    pub log_level: String,

    /// MIME types accepted for upload
    pub media_types: Vec<String>,

    /// Largest accepted upload in bytes
    pub media_max_size: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig {
            title_min_len: ValidationRules::DEFAULT_TITLE_MIN_LEN,
            title_max_len: ValidationRules::DEFAULT_TITLE_MAX_LEN,
            min_price: ValidationRules::DEFAULT_MIN_PRICE,
            max_variant_spread: ValidationRules::DEFAULT_MAX_VARIANT_SPREAD,
            database_path: PathBuf::from("shopfront.db"),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_lifetime_secs: 3600,
            log_format: LogFormat::Pretty,
            log_level: "info".to_string(),
            media_types: MediaLimits::default_types(),
            media_max_size: MediaLimits::DEFAULT_MAX_SIZE,
        }
    }
}

impl CatalogConfig {
    /// Loads configuration from file (if any), then the process environment.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = config_path.or_else(|| env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));
        Self::load_with(path.as_deref(), |name| env::var(name).ok())
    }

    /// Loads configuration with an explicit variable lookup.
    pub fn load_with<F>(config_path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match config_path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        config.apply_env_overrides(lookup)?;
        config.validate()?;

        Ok(config)
    }

    /// Parses a TOML file; missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        info!(?path, "Loading catalog config from file");
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::File {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::File {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        override_parsed(&lookup, "SHOPFRONT_TITLE_MIN_LEN", &mut self.title_min_len)?;
        override_parsed(&lookup, "SHOPFRONT_TITLE_MAX_LEN", &mut self.title_max_len)?;
        override_parsed(&lookup, "SHOPFRONT_MIN_PRICE", &mut self.min_price)?;
        override_parsed(&lookup, "SHOPFRONT_MAX_VARIANT_SPREAD", &mut self.max_variant_spread)?;
        override_parsed(&lookup, "SHOPFRONT_JWT_LIFETIME_SECS", &mut self.jwt_lifetime_secs)?;
        override_parsed(&lookup, "SHOPFRONT_LOG_FORMAT", &mut self.log_format)?;
        override_parsed(&lookup, "SHOPFRONT_MEDIA_MAX_SIZE", &mut self.media_max_size)?;

        if let Some(path) = lookup("SHOPFRONT_DATABASE_PATH") {
            self.database_path = PathBuf::from(path);
        }
        if let Some(secret) = lookup("SHOPFRONT_JWT_SECRET") {
            self.jwt_secret = secret;
        }
        if let Some(level) = lookup("SHOPFRONT_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(types) = lookup("SHOPFRONT_MEDIA_TYPES") {
            self.media_types = types
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect();
        }

        Ok(())
    }

    /// Rejects combinations no product could satisfy.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.title_max_len == 0 || self.title_min_len > self.title_max_len {
            return Err(ConfigError::InvalidValue("SHOPFRONT_TITLE_MAX_LEN".to_string()));
        }
        if self.max_variant_spread < 1 {
            return Err(ConfigError::InvalidValue("SHOPFRONT_MAX_VARIANT_SPREAD".to_string()));
        }
        if self.min_price.is_negative() {
            return Err(ConfigError::InvalidValue("SHOPFRONT_MIN_PRICE".to_string()));
        }
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::MissingRequired("SHOPFRONT_JWT_SECRET".to_string()));
        }
        if self.jwt_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("SHOPFRONT_JWT_LIFETIME_SECS".to_string()));
        }
        if self.media_types.is_empty() {
            return Err(ConfigError::MissingRequired("SHOPFRONT_MEDIA_TYPES".to_string()));
        }
        if self.media_max_size == 0 {
            return Err(ConfigError::InvalidValue("SHOPFRONT_MEDIA_MAX_SIZE".to_string()));
        }
        Ok(())
    }

    pub fn validation_rules(&self) -> ValidationRules {
        ValidationRules {
            title_min_len: self.title_min_len,
            title_max_len: self.title_max_len,
            min_price: self.min_price,
            max_variant_spread: self.max_variant_spread,
        }
    }

    pub fn media_limits(&self) -> MediaLimits {
        MediaLimits {
            allowed_types: self.media_types.clone(),
            max_size: self.media_max_size,
        }
    }
}

fn override_parsed<F, T>(lookup: &F, name: &str, slot: &mut T) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(raw) = lookup(name) {
        debug!(variable = name, "Overriding catalog config from environment");
        *slot = raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name.to_string()))?;
    }
    Ok(())
}

/// Configuration error types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Cannot read config file {path:?}: {reason}")]
    File { path: PathBuf, reason: String },
}
