//! Infrastructure layer for configuration, logging, the SQLite mirror
//! and the Shopify Admin API client

pub mod config;
pub mod database_connection;
pub mod logging;
pub mod product_mirror_repository;
pub mod shopify_client;

// Re-export commonly used items
pub use config::{AppConfig, ConfigError, LoggingConfig, SyncConfig};
pub use database_connection::DatabaseConnection;
pub use logging::{get_log_directory, init_logging_with_config, log_system_info};
pub use product_mirror_repository::SqliteProductMirror;
pub use shopify_client::ShopifyClient;
