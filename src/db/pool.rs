//! SQLite connection pool
//!
//! Accepts either a `sqlite:` URL, a bare file path or `:memory:`. File-based
//! databases get their parent directory created and are opened in
//! read-write-create mode.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::config::StorageConfig;

fn is_in_memory(url: &str) -> bool {
    url == ":memory:" || url.starts_with("sqlite::memory:")
}

/// Turn the configured URL into something `sqlx` can connect to
fn connection_url(url: &str) -> String {
    if url == ":memory:" {
        "sqlite::memory:".to_string()
    } else if url.starts_with("sqlite:") {
        if url.contains('?') || is_in_memory(url) {
            url.to_string()
        } else {
            format!("{}?mode=rwc", url)
        }
    } else {
        format!("sqlite:{}?mode=rwc", url)
    }
}

/// Create a SQLite pool from storage configuration
pub async fn create_pool(config: &StorageConfig) -> Result<SqlitePool> {
    let url = config.url.as_str();

    if !is_in_memory(url) {
        let path = url.strip_prefix("sqlite:").unwrap_or(url);
        let path = path.split('?').next().unwrap_or(path);
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory: {:?}", parent)
                })?;
            }
        }
    }

    let mut options = SqlitePoolOptions::new().max_connections(10);
    if is_in_memory(url) {
        // Each connection to `:memory:` opens its own empty database, and the
        // data lives only as long as that connection
        options = options
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    }

    let pool = options
        .connect(&connection_url(url))
        .await
        .with_context(|| format!("Failed to connect to SQLite database: {}", url))?;

    Ok(pool)
}

/// Create an in-memory SQLite pool for testing
pub async fn create_test_pool() -> Result<SqlitePool> {
    let config = StorageConfig {
        url: ":memory:".to_string(),
        ..StorageConfig::default()
    };
    create_pool(&config).await
}

/// Check the connection is usable
pub async fn ping(pool: &SqlitePool) -> Result<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .context("Database ping failed")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_url() {
        assert_eq!(connection_url(":memory:"), "sqlite::memory:");
        assert_eq!(connection_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(connection_url("data/app.db"), "sqlite:data/app.db?mode=rwc");
        assert_eq!(connection_url("sqlite:data/app.db"), "sqlite:data/app.db?mode=rwc");
        assert_eq!(connection_url("sqlite:x.db?mode=ro"), "sqlite:x.db?mode=ro");
    }

    #[tokio::test]
    async fn test_create_test_pool() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        ping(&pool).await.expect("Ping should succeed");
    }

    #[tokio::test]
    async fn test_file_pool_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("techlabs.db");
        let config = StorageConfig {
            url: path.display().to_string(),
            ..StorageConfig::default()
        };

        let pool = create_pool(&config).await.expect("Failed to create file pool");
        ping(&pool).await.unwrap();
        assert!(path.exists());
    }
}
