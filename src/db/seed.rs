//! Seed data for the in-memory store
//!
//! Events come from a JSON fixture (`data/events.json` by default); the
//! initial blog posts are built in. Seeding only touches empty collections.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use std::path::Path;
use uuid::Uuid;

use crate::db::repositories::{EventRepository, PostRepository};
use crate::models::{BlogPost, CreateEventInput, Event, PostStatus};
use crate::services::post::{generate_excerpt, generate_slug};

/// Read event fixtures from a JSON array of event inputs
pub fn load_events(path: &Path) -> Result<Vec<CreateEventInput>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file '{}'", path.display()))?;
    let events: Vec<CreateEventInput> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse seed file '{}'", path.display()))?;
    Ok(events)
}

/// Built-in blog posts shown on a fresh install
pub fn default_posts() -> Vec<BlogPost> {
    let now = Utc::now();
    let entries: [(&str, &str, &str, &[&str], i64); 3] = [
        (
            "Welcome to the TechLabs Blog",
            "TechLabs Team",
            "We teach Data Science, Artificial Intelligence, Web Development and UX Design \
             for free. This blog is where our community shares what they build and learn.",
            &["community", "announcement"],
            30,
        ),
        (
            "What Our Digital Shaper Program Looks Like",
            "TechLabs Team",
            "Each semester combines online courses, hands-on workshops and a project phase \
             where interdisciplinary teams solve real problems together.",
            &["program", "learning"],
            14,
        ),
        (
            "Project Phase Highlights",
            "TechLabs Team",
            "From a machine learning model that predicts bike demand to an accessible booking \
             app, here is a look at projects from the latest project phase.",
            &["projects", "showcase"],
            3,
        ),
    ];

    entries
        .into_iter()
        .map(|(title, author, content, tags, days_ago)| {
            let published = now - Duration::days(days_ago);
            BlogPost {
                id: Uuid::new_v4(),
                title: title.to_string(),
                slug: generate_slug(title),
                excerpt: generate_excerpt(content),
                content: content.to_string(),
                author: author.to_string(),
                tags: tags.iter().map(|t| t.to_string()).collect(),
                status: PostStatus::Published,
                published_at: Some(published),
                created_at: published,
                updated_at: published,
            }
        })
        .collect()
}

/// Fill empty event and post collections, returning `(events, posts)` inserted
pub async fn seed_store(
    events: &dyn EventRepository,
    posts: &dyn PostRepository,
    events_path: &Path,
) -> Result<(usize, usize)> {
    let mut inserted_events = 0;
    if events.count().await? == 0 {
        if events_path.exists() {
            for input in load_events(events_path)? {
                events.create(&Event::new(input)).await?;
                inserted_events += 1;
            }
        } else {
            tracing::warn!(
                "Event seed file '{}' not found, starting without events",
                events_path.display()
            );
        }
    }

    let mut inserted_posts = 0;
    if posts.list().await?.is_empty() {
        for post in default_posts() {
            posts.create(&post).await?;
            inserted_posts += 1;
        }
    }

    Ok((inserted_events, inserted_posts))
}
