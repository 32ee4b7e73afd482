// Database connection and pool management
// This module handles the SQLite mirror database using sqlx

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

pub struct DatabaseConnection {
    pool: SqlitePool,
}

impl DatabaseConnection {
    /// Opens a database from a `sqlite:` URL, e.g. `sqlite::memory:`.
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL: {}", database_url))?
            .create_if_missing(true);

        // Every connection to `:memory:` opens its own empty database, so keep exactly one alive.
        let pool_options = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(4)
        };

        Self::connect(pool_options, options, database_url).await
    }

    /// Opens the SQLite file at `path`, creating it and its parent directory when missing.
    ///
    /// The path is used verbatim; `?` and `%` in file names are not URL syntax here.
    pub async fn open_file(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create database directory {:?}", parent))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool_options = SqlitePoolOptions::new().max_connections(4);

        Self::connect(pool_options, options, &path.display().to_string()).await
    }

    async fn connect(pool_options: SqlitePoolOptions, options: SqliteConnectOptions, label: &str) -> Result<Self> {
        let pool = pool_options
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open database {}", label))?;

        debug!("Opened database {}", label);
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<()> {
        let create_products_sql = r#"
            CREATE TABLE IF NOT EXISTS products (
                shopify_id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                tags TEXT NOT NULL DEFAULT ''
            )
        "#;

        sqlx::query(create_products_sql)
            .execute(&self.pool)
            .await
            .context("Failed to create products table")?;

        Ok(())
    }
}
