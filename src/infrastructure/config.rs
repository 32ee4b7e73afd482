//! Configuration infrastructure
//!
//! Settings are layered with the `config` crate:
//! 1. Built-in defaults (see [`defaults`])
//! 2. Optional config file (`shopify_tag_sync.toml` / `.json`, or `--config PATH`)
//! 3. Environment variables prefixed with `SHOPIFY_`
//!
//! `SHOPIFY_SHOP_URL` and `SHOPIFY_ACCESS_TOKEN` map onto the top-level keys;
//! nested keys use a double underscore, e.g. `SHOPIFY_SYNC__PAGE_SIZE=100`.

#![allow(clippy::uninlined_format_args)]

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::pagination::MAX_PAGE_SIZE;
use crate::domain::product::TAG_SEPARATOR;
use crate::domain::tag_rules::{AugmentationRule, ExclusionRule};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {source}")]
    Load {
        #[from]
        source: config::ConfigError,
    },

    #[error("Configuration validation failed: {message}")]
    Validation { message: String },
}

impl ConfigError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// Complete application configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Shop base URL, e.g. `https://my-shop.myshopify.com`
    pub shop_url: String,

    /// Admin API access token sent as `X-Shopify-Access-Token`
    pub access_token: String,

    /// Admin API version segment of the GraphQL endpoint
    pub api_version: String,

    /// Timeout for each HTTP request in seconds
    pub request_timeout_seconds: u64,

    /// SQLite file holding the product mirror
    pub database_path: PathBuf,

    pub sync: SyncConfig,

    pub logging: LoggingConfig,
}

/// Pipeline behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Products requested per listing page (1..=250)
    pub page_size: u32,

    /// Keep only ACTIVE products (edges without a status are always kept)
    pub active_only: bool,

    /// Literal substrings; any mirrored product whose tags contain one is dropped
    pub exclude_tags: Vec<String>,

    /// Tag appended to every product left after exclusion
    pub augment_tag: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted file logs
    pub json_format: bool,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Directory for log files; defaults to `<data dir>/shopify-tag-sync/logs`
    pub log_dir: Option<PathBuf>,

    /// Number of log files to keep (older files will be deleted)
    pub max_files: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            shop_url: String::new(),
            access_token: String::new(),
            api_version: shopify::API_VERSION.to_string(),
            request_timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            database_path: PathBuf::from(defaults::DATABASE_FILE),
            sync: SyncConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            page_size: MAX_PAGE_SIZE,
            active_only: true,
            exclude_tags: defaults::EXCLUDE_TAGS.iter().map(|s| s.to_string()).collect(),
            augment_tag: defaults::AUGMENT_TAG.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: false,
            console_output: true,
            file_output: false,
            log_dir: None,
            max_files: defaults::LOG_MAX_FILES,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("shop_url", &self.shop_url)
            .field("access_token", &"<redacted>")
            .field("api_version", &self.api_version)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("database_path", &self.database_path)
            .field("sync", &self.sync)
            .field("logging", &self.logging)
            .finish()
    }
}

impl AppConfig {
    /// Loads defaults, then the config file, then `SHOPIFY_*` environment variables.
    ///
    /// With `path` set the file is required; otherwise `shopify_tag_sync.*`
    /// in the working directory is picked up when present.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, config::Environment::with_prefix(defaults::ENV_PREFIX))
    }

    fn load_with_env(path: Option<&Path>, env: config::Environment) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(defaults::CONFIG_FILE_STEM).required(false),
        };

        let settings = config::Config::builder()
            .add_source(file)
            .add_source(env.prefix_separator("_").separator("__").try_parsing(true))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings that would make the run meaningless or destructive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shop_url.trim().is_empty() {
            return Err(ConfigError::validation(
                "shop_url is not set (use SHOPIFY_SHOP_URL or the config file)",
            ));
        }
        url::Url::parse(&self.shop_url)
            .map_err(|e| ConfigError::validation(format!("shop_url '{}' is not a valid URL: {}", self.shop_url, e)))?;

        if self.access_token.trim().is_empty() {
            return Err(ConfigError::validation(
                "access_token is not set (use SHOPIFY_ACCESS_TOKEN or the config file)",
            ));
        }

        if self.sync.page_size == 0 || self.sync.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::validation(format!(
                "sync.page_size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, self.sync.page_size
            )));
        }

        // An empty substring is contained in every tag string and would wipe the mirror.
        if self.sync.exclude_tags.iter().any(String::is_empty) {
            return Err(ConfigError::validation("sync.exclude_tags must not contain empty entries"));
        }

        if self.sync.augment_tag.trim().is_empty() {
            return Err(ConfigError::validation("sync.augment_tag must not be empty"));
        }
        if self.sync.augment_tag.contains(TAG_SEPARATOR) {
            return Err(ConfigError::validation(format!(
                "sync.augment_tag '{}' must not contain '{}'",
                self.sync.augment_tag, TAG_SEPARATOR
            )));
        }

        Ok(())
    }

    pub fn exclusion_rule(&self) -> ExclusionRule {
        ExclusionRule::new(self.sync.exclude_tags.iter().cloned())
    }

    pub fn augmentation_rule(&self) -> AugmentationRule {
        AugmentationRule::new(self.sync.augment_tag.clone())
    }

    /// `{shop_url}/admin/api/{api_version}/graphql.json`
    pub fn graphql_endpoint(&self) -> Result<url::Url, ConfigError> {
        let mut endpoint = url::Url::parse(&self.shop_url)
            .map_err(|e| ConfigError::validation(format!("invalid shop_url: {}", e)))?;
        endpoint
            .path_segments_mut()
            .map_err(|()| ConfigError::validation(format!("shop_url '{}' cannot carry a path", self.shop_url)))?
            .pop_if_empty()
            .extend(["admin", "api", self.api_version.as_str(), shopify::GRAPHQL_PATH]);
        Ok(endpoint)
    }

    /// Application data directory used for logs when no `log_dir` is configured
    pub fn app_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(defaults::APP_DIR_NAME)
    }
}

/// Shopify Admin API constants
pub mod shopify {
    /// Admin API version the queries are written against
    pub const API_VERSION: &str = "2024-10";

    /// Final path segment of the GraphQL endpoint
    pub const GRAPHQL_PATH: &str = "graphql.json";

    /// Header carrying the Admin API access token
    pub const ACCESS_TOKEN_HEADER: &str = "x-shopify-access-token";
}

/// Default configuration values
pub mod defaults {
    /// Environment variable prefix
    pub const ENV_PREFIX: &str = "SHOPIFY";

    /// Config file looked up in the working directory (any supported extension)
    pub const CONFIG_FILE_STEM: &str = "shopify_tag_sync";

    /// Directory name under the platform data dir
    pub const APP_DIR_NAME: &str = "shopify-tag-sync";

    /// Default SQLite file for the mirror
    pub const DATABASE_FILE: &str = "shopify_products.db";

    /// Default request timeout in seconds
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;

    /// Tags that take a product out of the sync
    pub const EXCLUDE_TAGS: &[&str] = &[
        "Like New & Gently Used Saddles",
        "Outlet",
        "Like New",
        "Saddles",
        "Gift Card",
        "Premier Gear",
    ];

    /// Tag added to every remaining product
    pub const AUGMENT_TAG: &str = "Premier Gear";

    /// Default log level
    pub const LOG_LEVEL: &str = "info";

    /// Default maximum log files to keep
    pub const LOG_MAX_FILES: u32 = 5;
}
