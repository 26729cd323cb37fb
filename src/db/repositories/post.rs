//! Blog post repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

use super::{write_error, DuplicateKey};
use crate::models::BlogPost;

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, post: &BlogPost) -> Result<BlogPost>;
    async fn get_by_id(&self, id: Uuid) -> Result<Option<BlogPost>>;
    async fn get_by_slug(&self, slug: &str) -> Result<Option<BlogPost>>;
    async fn list(&self) -> Result<Vec<BlogPost>>;
    /// Replace a stored post; `None` when the id is unknown
    async fn update(&self, post: &BlogPost) -> Result<Option<BlogPost>>;
    /// Hard delete; `false` when the id is unknown
    async fn delete(&self, id: Uuid) -> Result<bool>;
    /// Whether another post (other than `exclude`) already uses `slug`
    async fn exists_by_slug(&self, slug: &str, exclude: Option<Uuid>) -> Result<bool>;
}

pub struct SqlxPostRepository {
    pool: SqlitePool,
}

impl SqlxPostRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(pool))
    }
}

const SELECT_POST: &str = "SELECT id, title, slug, excerpt, content, author, tags, status, published_at, created_at, updated_at FROM blog_posts";

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn create(&self, post: &BlogPost) -> Result<BlogPost> {
        sqlx::query(
            "INSERT INTO blog_posts (id, title, slug, excerpt, content, author, tags, status, published_at, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(post.id.to_string())
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.excerpt)
        .bind(&post.content)
        .bind(&post.author)
        .bind(serde_json::to_string(&post.tags)?)
        .bind(post.status.to_string())
        .bind(post.published_at)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            write_error(
                e,
                DuplicateKey::new("slug", &post.slug),
                "Failed to create blog post",
            )
        })?;

        Ok(post.clone())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<BlogPost>> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_POST))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get blog post")?;
        row.map(|r| row_to_post(&r)).transpose()
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<BlogPost>> {
        let row = sqlx::query(&format!("{} WHERE slug = ?", SELECT_POST))
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get blog post by slug")?;
        row.map(|r| row_to_post(&r)).transpose()
    }

    async fn list(&self) -> Result<Vec<BlogPost>> {
        let rows = sqlx::query(&format!("{} ORDER BY created_at DESC", SELECT_POST))
            .fetch_all(&self.pool)
            .await
            .context("Failed to list blog posts")?;
        rows.iter().map(row_to_post).collect()
    }

    async fn update(&self, post: &BlogPost) -> Result<Option<BlogPost>> {
        let result = sqlx::query(
            "UPDATE blog_posts SET title = ?, slug = ?, excerpt = ?, content = ?, author = ?, tags = ?, status = ?, published_at = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.excerpt)
        .bind(&post.content)
        .bind(&post.author)
        .bind(serde_json::to_string(&post.tags)?)
        .bind(post.status.to_string())
        .bind(post.published_at)
        .bind(post.updated_at)
        .bind(post.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            write_error(
                e,
                DuplicateKey::new("slug", &post.slug),
                "Failed to update blog post",
            )
        })?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(post.id).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM blog_posts WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete blog post")?;
        Ok(result.rows_affected() > 0)
    }

    async fn exists_by_slug(&self, slug: &str, exclude: Option<Uuid>) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM blog_posts WHERE slug = ? AND id != ?")
            .bind(slug)
            .bind(exclude.map(|id| id.to_string()).unwrap_or_default())
            .fetch_one(&self.pool)
            .await
            .context("Failed to check blog post slug")?;
        Ok(row.get::<i64, _>("count") > 0)
    }
}

fn row_to_post(row: &sqlx::sqlite::SqliteRow) -> Result<BlogPost> {
    let id: String = row.get("id");
    let tags: String = row.get("tags");
    let status: String = row.get("status");
    Ok(BlogPost {
        id: Uuid::parse_str(&id).context("Invalid blog post id in database")?,
        title: row.get("title"),
        slug: row.get("slug"),
        excerpt: row.get("excerpt"),
        content: row.get("content"),
        author: row.get("author"),
        tags: serde_json::from_str(&tags).context("Invalid tags in database")?,
        status: status.parse()?,
        published_at: row.get("published_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use crate::models::PostStatus;
    use chrono::Utc;

    async fn setup() -> SqlxPostRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxPostRepository::new(pool)
    }

    fn sample(slug: &str) -> BlogPost {
        let now = Utc::now();
        BlogPost {
            id: Uuid::new_v4(),
            title: slug.to_uppercase(),
            slug: slug.to_string(),
            excerpt: "short".to_string(),
            content: "long".to_string(),
            author: "Grace".to_string(),
            tags: vec!["ai".to_string(), "data".to_string()],
            status: PostStatus::Draft,
            published_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_by_slug() {
        let repo = setup().await;
        let post = sample("first-post");
        repo.create(&post).await.unwrap();

        let fetched = repo.get_by_slug("first-post").await.unwrap().expect("post exists");
        assert_eq!(fetched.id, post.id);
        assert_eq!(fetched.tags, vec!["ai", "data"]);
        assert_eq!(fetched.status, PostStatus::Draft);
        assert!(fetched.published_at.is_none());
    }

    #[tokio::test]
    async fn test_exists_by_slug_excludes_self() {
        let repo = setup().await;
        let post = sample("taken");
        repo.create(&post).await.unwrap();

        assert!(repo.exists_by_slug("taken", None).await.unwrap());
        assert!(!repo.exists_by_slug("taken", Some(post.id)).await.unwrap());
        assert!(!repo.exists_by_slug("free", None).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected_by_schema() {
        let repo = setup().await;
        repo.create(&sample("dup")).await.unwrap();

        let err = repo.create(&sample("dup")).await.unwrap_err();
        let dup = err.downcast_ref::<DuplicateKey>().expect("typed duplicate");
        assert_eq!(dup.field, "slug");
        assert_eq!(dup.value, "dup");

        let mut other = sample("other");
        repo.create(&other).await.unwrap();
        other.slug = "dup".to_string();
        let err = repo.update(&other).await.unwrap_err();
        assert!(err.downcast_ref::<DuplicateKey>().is_some());
    }

    #[tokio::test]
    async fn test_update_persists_published_at() {
        let repo = setup().await;
        let mut post = sample("publish-me");
        repo.create(&post).await.unwrap();

        post.set_status(PostStatus::Published);
        let updated = repo.update(&post).await.unwrap().expect("post exists");
        assert_eq!(updated.status, PostStatus::Published);
        assert!(updated.published_at.is_some());

        assert!(repo.delete(post.id).await.unwrap());
        assert!(repo.update(&post).await.unwrap().is_none());
    }
}
