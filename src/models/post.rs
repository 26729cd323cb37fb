//! Blog post model
//!
//! This module provides:
//! - `BlogPost` entity
//! - `PostStatus` enum for publication states
//! - Input types for creating and updating posts
//! - `PostFilter` for list queries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Blog post entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: Uuid,
    pub title: String,
    /// URL-friendly slug (unique)
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub author: String,
    pub tags: Vec<String>,
    pub status: PostStatus,
    /// Set on the first transition to `published`, never cleared
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BlogPost {
    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }

    /// Change status, stamping `published_at` the first time the post goes live
    pub fn set_status(&mut self, status: PostStatus) {
        if status == PostStatus::Published && self.published_at.is_none() {
            self.published_at = Some(Utc::now());
        }
        self.status = status;
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

/// Post publication status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostStatus::Draft => write!(f, "draft"),
            PostStatus::Published => write!(f, "published"),
        }
    }
}

impl FromStr for PostStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            _ => Err(anyhow::anyhow!("Invalid post status: {}", s)),
        }
    }
}

/// Input for creating a post
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostInput {
    pub title: String,
    /// Generated from the title when omitted
    #[serde(default)]
    pub slug: Option<String>,
    /// Derived from the content when omitted
    #[serde(default)]
    pub excerpt: Option<String>,
    pub content: String,
    pub author: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: PostStatus,
}

/// Input for updating a post; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostInput {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
    pub tags: Option<Vec<String>>,
    pub status: Option<PostStatus>,
}

/// Filters applied to post listings
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub status: Option<PostStatus>,
    pub tag: Option<String>,
}

impl PostFilter {
    /// Only published posts, as shown on the public site
    pub fn published() -> Self {
        Self {
            status: Some(PostStatus::Published),
            tag: None,
        }
    }

    pub fn matches(&self, post: &BlogPost) -> bool {
        if let Some(status) = self.status {
            if post.status != status {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !post.has_tag(tag) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_post(status: PostStatus) -> BlogPost {
        let now = Utc::now();
        BlogPost {
            id: Uuid::new_v4(),
            title: "Hello".to_string(),
            slug: "hello".to_string(),
            excerpt: String::new(),
            content: "Body".to_string(),
            author: "Ada".to_string(),
            tags: vec!["Rust".to_string(), "web".to_string()],
            status,
            published_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_set_status_stamps_published_at_once() {
        let mut post = sample_post(PostStatus::Draft);
        post.set_status(PostStatus::Published);
        let first = post.published_at.expect("published_at should be set");

        post.set_status(PostStatus::Draft);
        assert_eq!(post.published_at, Some(first));

        post.set_status(PostStatus::Published);
        assert_eq!(post.published_at, Some(first));
    }

    #[test]
    fn test_draft_leaves_published_at_empty() {
        let mut post = sample_post(PostStatus::Draft);
        post.set_status(PostStatus::Draft);
        assert!(post.published_at.is_none());
    }

    #[test]
    fn test_filter_matches_status_and_tag() {
        let post = sample_post(PostStatus::Published);
        assert!(PostFilter::default().matches(&post));
        assert!(PostFilter::published().matches(&post));
        assert!(PostFilter { status: None, tag: Some("rust".to_string()) }.matches(&post));
        assert!(!PostFilter { status: None, tag: Some("go".to_string()) }.matches(&post));
        assert!(!PostFilter { status: Some(PostStatus::Draft), tag: None }.matches(&post));
    }

    #[test]
    fn test_create_input_defaults() {
        let input: CreatePostInput = serde_json::from_value(serde_json::json!({
            "title": "T", "content": "C", "author": "A"
        }))
        .unwrap();
        assert_eq!(input.status, PostStatus::Draft);
        assert!(input.tags.is_empty());
        assert!(input.slug.is_none());
    }

    #[test]
    fn test_post_status_serde() {
        let json = serde_json::to_value(sample_post(PostStatus::Published)).unwrap();
        assert_eq!(json["status"], "published");
        assert!(json.get("publishedAt").is_some());
        assert!(serde_json::from_value::<PostStatus>(serde_json::json!("archived")).is_err());
    }
}
