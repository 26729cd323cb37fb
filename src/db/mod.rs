//! Storage layer
//!
//! Two interchangeable backends sit behind the repository traits:
//! - `memory`: in-process collections, seeded from fixtures (default)
//! - `sqlite`: persistent storage through sqlx
//!
//! `open_storage` picks one according to `StorageConfig::driver` and hands
//! back the repositories the services are built on.
//!
//! # Usage
//!
//! ```ignore
//! use techlabs::config::StorageConfig;
//! use techlabs::db::open_storage;
//!
//! let storage = open_storage(&StorageConfig::default()).await?;
//! let events = storage.events.list().await?;
//! ```

pub mod memory;
pub mod migrations;
pub mod pool;
pub mod repositories;
pub mod seed;

use anyhow::Result;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::config::{StorageConfig, StorageDriver};
use memory::{MemoryEventRepository, MemoryPostRepository, MemoryStore, MemoryUserRepository};
use repositories::{
    EventRepository, PostRepository, SqlxEventRepository, SqlxPostRepository,
    SqlxUserRepository, UserRepository,
};

pub use pool::{create_pool, create_test_pool};

/// Repositories for every entity, backed by one storage driver
#[derive(Clone)]
pub struct Storage {
    pub driver: StorageDriver,
    pub events: Arc<dyn EventRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub users: Arc<dyn UserRepository>,
    /// Present for the sqlite driver only
    pub pool: Option<SqlitePool>,
}

impl Storage {
    /// Fresh, empty in-memory storage
    pub fn memory() -> Self {
        let store = MemoryStore::new();
        Self {
            driver: StorageDriver::Memory,
            events: MemoryEventRepository::boxed(store.clone()),
            posts: MemoryPostRepository::boxed(store.clone()),
            users: MemoryUserRepository::boxed(store),
            pool: None,
        }
    }

    /// SQLite-backed storage on an already migrated pool
    pub fn sqlite(pool: SqlitePool) -> Self {
        Self {
            driver: StorageDriver::Sqlite,
            events: SqlxEventRepository::boxed(pool.clone()),
            posts: SqlxPostRepository::boxed(pool.clone()),
            users: SqlxUserRepository::boxed(pool.clone()),
            pool: Some(pool),
        }
    }

    /// Check the backend is reachable
    pub async fn ping(&self) -> Result<()> {
        match &self.pool {
            Some(pool) => pool::ping(pool).await,
            None => Ok(()),
        }
    }
}

/// Open storage according to configuration
///
/// The sqlite driver runs pending migrations; the memory driver is seeded
/// from fixtures when `config.seed` is set.
pub async fn open_storage(config: &StorageConfig) -> Result<Storage> {
    match config.driver {
        StorageDriver::Memory => {
            let storage = Storage::memory();
            if config.seed {
                let (events, posts) = seed::seed_store(
                    storage.events.as_ref(),
                    storage.posts.as_ref(),
                    &config.events_seed_path,
                )
                .await?;
                tracing::info!("Seeded memory store with {} events and {} posts", events, posts);
            }
            Ok(storage)
        }
        StorageDriver::Sqlite => {
            let pool = create_pool(config).await?;
            migrations::run_migrations(&pool).await?;
            Ok(Storage::sqlite(pool))
        }
    }
}
