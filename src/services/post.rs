//! Blog post service
//!
//! Implements business logic for blog posts:
//! - Create, read, update, delete posts
//! - Slug generation and uniqueness
//! - Excerpt derivation
//! - Publication timestamps (`publishedAt` is stamped once, on first publish)

use crate::db::repositories::{DuplicateKey, PostRepository};
use crate::models::{
    BlogPost, CreatePostInput, ListQuery, PagedResult, PostFilter, PostStatus, SortOrder,
    UpdatePostInput,
};
use chrono::Utc;
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::Arc;
use uuid::Uuid;

/// Fields a post listing may be sorted by
pub const POST_SORT_FIELDS: &[&str] = &["createdAt", "publishedAt", "title"];

/// Maximum excerpt length in characters when derived from content
const EXCERPT_LENGTH: usize = 160;

/// Error types for post service operations
#[derive(Debug, thiserror::Error)]
pub enum PostServiceError {
    #[error("Blog post not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Slug already used by another post
    #[error("Slug already exists: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    InternalError(anyhow::Error),
}

impl From<anyhow::Error> for PostServiceError {
    /// A slug taken between the uniqueness check and the write is still a conflict
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<DuplicateKey>() {
            Some(dup) => PostServiceError::Conflict(dup.value.clone()),
            None => PostServiceError::InternalError(err),
        }
    }
}

/// Post counts for the admin dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PostStats {
    pub total: usize,
    pub published: usize,
    pub draft: usize,
}

pub struct PostService {
    repo: Arc<dyn PostRepository>,
}

impl PostService {
    pub fn new(repo: Arc<dyn PostRepository>) -> Self {
        Self { repo }
    }

    /// List posts matching `filter`, sorted and optionally paginated
    pub async fn list(
        &self,
        query: &ListQuery,
        filter: &PostFilter,
    ) -> Result<PagedResult<BlogPost>, PostServiceError> {
        let field = query.sort.as_deref().unwrap_or("createdAt");
        if !POST_SORT_FIELDS.contains(&field) {
            return Err(PostServiceError::ValidationError(format!(
                "Cannot sort posts by '{}'",
                field
            )));
        }
        let order = query.order.unwrap_or(SortOrder::Desc);

        let mut posts: Vec<BlogPost> = self
            .repo
            .list()
            .await?
            .into_iter()
            .filter(|p| filter.matches(p))
            .collect();
        posts.sort_by(|a, b| {
            let ord = compare_posts(a, b, field);
            match order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });

        Ok(PagedResult::paginate(posts, query))
    }

    pub async fn get(&self, id: Uuid) -> Result<BlogPost, PostServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| PostServiceError::NotFound(id.to_string()))
    }

    /// Public lookup: drafts are reported as missing
    pub async fn get_published_by_slug(&self, slug: &str) -> Result<BlogPost, PostServiceError> {
        self.repo
            .get_by_slug(slug)
            .await?
            .filter(BlogPost::is_published)
            .ok_or_else(|| PostServiceError::NotFound(slug.to_string()))
    }

    pub async fn create(&self, input: CreatePostInput) -> Result<BlogPost, PostServiceError> {
        require_text("title", &input.title)?;
        require_text("content", &input.content)?;
        require_text("author", &input.author)?;

        let slug = match input.slug.as_deref() {
            Some(requested) => {
                let slug = normalize_slug(requested)?;
                if self.repo.exists_by_slug(&slug, None).await? {
                    return Err(PostServiceError::Conflict(slug));
                }
                slug
            }
            None => self.unique_slug(&input.title).await?,
        };

        let excerpt = match input.excerpt {
            Some(excerpt) if !excerpt.trim().is_empty() => excerpt,
            _ => generate_excerpt(&input.content),
        };

        let now = Utc::now();
        let mut post = BlogPost {
            id: Uuid::new_v4(),
            title: input.title,
            slug,
            excerpt,
            content: input.content,
            author: input.author,
            tags: normalize_tags(input.tags),
            status: PostStatus::Draft,
            published_at: None,
            created_at: now,
            updated_at: now,
        };
        post.set_status(input.status);

        let post = self.repo.create(&post).await?;
        tracing::info!(post_id = %post.id, "Created blog post '{}'", post.slug);
        Ok(post)
    }

    /// Merge submitted fields into an existing post
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdatePostInput,
    ) -> Result<BlogPost, PostServiceError> {
        let mut post = self.get(id).await?;

        if let Some(title) = input.title {
            require_text("title", &title)?;
            post.title = title;
        }
        if let Some(requested) = input.slug {
            let slug = normalize_slug(&requested)?;
            if slug != post.slug && self.repo.exists_by_slug(&slug, Some(id)).await? {
                return Err(PostServiceError::Conflict(slug));
            }
            post.slug = slug;
        }
        if let Some(content) = input.content {
            require_text("content", &content)?;
            post.content = content;
        }
        if let Some(excerpt) = input.excerpt {
            post.excerpt = if excerpt.trim().is_empty() {
                generate_excerpt(&post.content)
            } else {
                excerpt
            };
        }
        if let Some(author) = input.author {
            require_text("author", &author)?;
            post.author = author;
        }
        if let Some(tags) = input.tags {
            post.tags = normalize_tags(tags);
        }
        if let Some(status) = input.status {
            post.set_status(status);
        }
        post.updated_at = Utc::now();

        self.repo
            .update(&post)
            .await?
            .ok_or_else(|| PostServiceError::NotFound(id.to_string()))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), PostServiceError> {
        if !self.repo.delete(id).await? {
            return Err(PostServiceError::NotFound(id.to_string()));
        }
        tracing::info!(post_id = %id, "Deleted blog post");
        Ok(())
    }

    pub async fn stats(&self) -> Result<PostStats, PostServiceError> {
        let posts = self.repo.list().await?;
        let published = posts.iter().filter(|p| p.is_published()).count();
        Ok(PostStats {
            total: posts.len(),
            published,
            draft: posts.len() - published,
        })
    }

    /// Slug derived from the title, suffixed with a counter while taken
    async fn unique_slug(&self, title: &str) -> Result<String, PostServiceError> {
        let base = match generate_slug(title) {
            s if s.is_empty() => format!("post-{}", &Uuid::new_v4().simple().to_string()[..8]),
            s => s,
        };

        let mut candidate = base.clone();
        let mut n = 2;
        while self.repo.exists_by_slug(&candidate, None).await? {
            candidate = format!("{}-{}", base, n);
            n += 1;
        }
        Ok(candidate)
    }
}

fn compare_posts(a: &BlogPost, b: &BlogPost, field: &str) -> Ordering {
    match field {
        "title" => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        "publishedAt" => a.published_at.cmp(&b.published_at),
        _ => a.created_at.cmp(&b.created_at),
    }
}

fn require_text(field: &str, value: &str) -> Result<(), PostServiceError> {
    if value.trim().is_empty() {
        return Err(PostServiceError::ValidationError(format!(
            "{} is required",
            field
        )));
    }
    Ok(())
}

fn normalize_slug(requested: &str) -> Result<String, PostServiceError> {
    let slug = generate_slug(requested);
    if slug.is_empty() {
        return Err(PostServiceError::ValidationError(
            "slug must contain at least one letter or digit".to_string(),
        ));
    }
    Ok(slug)
}

/// Trim tags and drop empty or duplicate entries, keeping first occurrence
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_string();
        if !tag.is_empty() && !out.iter().any(|t| t.eq_ignore_ascii_case(&tag)) {
            out.push(tag);
        }
    }
    out
}

/// Generate a URL-friendly slug from a title
///
/// ASCII letters and digits are lowercased and kept, non-ASCII letters are
/// kept as-is, everything else becomes a single hyphen.
pub fn generate_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut prev_hyphen = true;

    for c in title.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() || (!c.is_ascii() && c.is_alphanumeric()) {
            slug.push(c);
            prev_hyphen = false;
        } else if !prev_hyphen {
            slug.push('-');
            prev_hyphen = true;
        }
    }

    slug.trim_end_matches('-').to_string()
}

/// First paragraph of `content`, cut at a word boundary
pub fn generate_excerpt(content: &str) -> String {
    let text = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.chars().count() <= EXCERPT_LENGTH {
        return text;
    }

    let cut: String = text.chars().take(EXCERPT_LENGTH).collect();
    let trimmed = match cut.rfind(' ') {
        Some(idx) if idx > 0 => &cut[..idx],
        _ => cut.as_str(),
    };
    format!("{}...", trimmed.trim_end_matches([',', '.', ';', ':']))
}
