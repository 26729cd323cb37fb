//! In-memory storage
//!
//! Keeps every entity in an owned `Vec` behind a `tokio::sync::RwLock`.
//! Nothing survives a restart; the store is filled from fixtures at startup
//! (see `db::seed`). Uniqueness of post slugs and user emails is checked
//! under the write lock, so concurrent writers cannot both claim a value.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::repositories::{DuplicateKey, EventRepository, PostRepository, UserRepository};
use crate::models::{BlogPost, Event, User, UserRole};

/// Shared collections for all entities
#[derive(Debug, Default)]
pub struct MemoryStore {
    events: RwLock<Vec<Event>>,
    posts: RwLock<Vec<BlogPost>>,
    users: RwLock<Vec<User>>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

/// Replace the element with the same id, returning the stored copy
fn replace_by_id<T: Clone>(items: &mut [T], id: Uuid, value: &T, id_of: impl Fn(&T) -> Uuid) -> Option<T> {
    let slot = items.iter_mut().find(|item| id_of(item) == id)?;
    *slot = value.clone();
    Some(slot.clone())
}

/// Remove the element with the given id, returning whether it existed
fn remove_by_id<T>(items: &mut Vec<T>, id: Uuid, id_of: impl Fn(&T) -> Uuid) -> bool {
    let before = items.len();
    items.retain(|item| id_of(item) != id);
    items.len() != before
}

// ============================================================================
// Events
// ============================================================================

pub struct MemoryEventRepository {
    store: Arc<MemoryStore>,
}

impl MemoryEventRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    pub fn boxed(store: Arc<MemoryStore>) -> Arc<dyn EventRepository> {
        Arc::new(Self::new(store))
    }
}

#[async_trait]
impl EventRepository for MemoryEventRepository {
    async fn create(&self, event: &Event) -> Result<Event> {
        self.store.events.write().await.push(event.clone());
        Ok(event.clone())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Event>> {
        let events = self.store.events.read().await;
        Ok(events.iter().find(|e| e.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<Event>> {
        Ok(self.store.events.read().await.clone())
    }

    async fn update(&self, event: &Event) -> Result<Option<Event>> {
        let mut events = self.store.events.write().await;
        Ok(replace_by_id(&mut events, event.id, event, |e| e.id))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut events = self.store.events.write().await;
        Ok(remove_by_id(&mut events, id, |e| e.id))
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.store.events.read().await.len())
    }
}

// ============================================================================
// Blog posts
// ============================================================================

pub struct MemoryPostRepository {
    store: Arc<MemoryStore>,
}

impl MemoryPostRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    pub fn boxed(store: Arc<MemoryStore>) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(store))
    }
}

#[async_trait]
impl PostRepository for MemoryPostRepository {
    async fn create(&self, post: &BlogPost) -> Result<BlogPost> {
        let mut posts = self.store.posts.write().await;
        if posts.iter().any(|p| p.slug == post.slug) {
            return Err(DuplicateKey::new("slug", &post.slug).into());
        }
        posts.push(post.clone());
        Ok(post.clone())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<BlogPost>> {
        let posts = self.store.posts.read().await;
        Ok(posts.iter().find(|p| p.id == id).cloned())
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<BlogPost>> {
        let posts = self.store.posts.read().await;
        Ok(posts.iter().find(|p| p.slug == slug).cloned())
    }

    async fn list(&self) -> Result<Vec<BlogPost>> {
        Ok(self.store.posts.read().await.clone())
    }

    async fn update(&self, post: &BlogPost) -> Result<Option<BlogPost>> {
        let mut posts = self.store.posts.write().await;
        if posts.iter().any(|p| p.slug == post.slug && p.id != post.id) {
            return Err(DuplicateKey::new("slug", &post.slug).into());
        }
        Ok(replace_by_id(&mut posts, post.id, post, |p| p.id))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut posts = self.store.posts.write().await;
        Ok(remove_by_id(&mut posts, id, |p| p.id))
    }

    async fn exists_by_slug(&self, slug: &str, exclude: Option<Uuid>) -> Result<bool> {
        let posts = self.store.posts.read().await;
        Ok(posts
            .iter()
            .any(|p| p.slug == slug && Some(p.id) != exclude))
    }
}

// ============================================================================
// Users
// ============================================================================

pub struct MemoryUserRepository {
    store: Arc<MemoryStore>,
}

impl MemoryUserRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    pub fn boxed(store: Arc<MemoryStore>) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(store))
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        let mut users = self.store.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(DuplicateKey::new("email", &user.email).into());
        }
        users.push(user.clone());
        Ok(user.clone())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let users = self.store.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.store.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn list(&self) -> Result<Vec<User>> {
        Ok(self.store.users.read().await.clone())
    }

    async fn update(&self, user: &User) -> Result<Option<User>> {
        let mut users = self.store.users.write().await;
        if users.iter().any(|u| u.email == user.email && u.id != user.id) {
            return Err(DuplicateKey::new("email", &user.email).into());
        }
        Ok(replace_by_id(&mut users, user.id, user, |u| u.id))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut users = self.store.users.write().await;
        Ok(remove_by_id(&mut users, id, |u| u.id))
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.store.users.read().await.len())
    }

    async fn count_admins(&self) -> Result<usize> {
        let users = self.store.users.read().await;
        Ok(users.iter().filter(|u| u.role == UserRole::Admin).count())
    }
}
