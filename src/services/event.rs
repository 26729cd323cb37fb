//! Event service
//!
//! Business rules for the events listing:
//! - required text fields must be non-empty
//! - partial updates touch only submitted fields
//! - listings sort by date ascending unless asked otherwise

use crate::db::repositories::EventRepository;
use crate::models::{
    CreateEventInput, Event, ListQuery, PagedResult, SortOrder, UpdateEventInput,
};
use chrono::Utc;
use std::cmp::Ordering;
use std::sync::Arc;
use uuid::Uuid;

/// Fields an event listing may be sorted by
pub const EVENT_SORT_FIELDS: &[&str] = &["date", "title", "createdAt"];

/// Error types for event service operations
#[derive(Debug, thiserror::Error)]
pub enum EventServiceError {
    #[error("Event not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct EventService {
    repo: Arc<dyn EventRepository>,
}

impl EventService {
    pub fn new(repo: Arc<dyn EventRepository>) -> Self {
        Self { repo }
    }

    /// List events, sorted and optionally paginated
    pub async fn list(&self, query: &ListQuery) -> Result<PagedResult<Event>, EventServiceError> {
        let field = query.sort.as_deref().unwrap_or("date");
        if !EVENT_SORT_FIELDS.contains(&field) {
            return Err(EventServiceError::ValidationError(format!(
                "Cannot sort events by '{}'",
                field
            )));
        }
        let order = query.order.unwrap_or(SortOrder::Asc);

        let mut events = self.repo.list().await?;
        events.sort_by(|a, b| {
            let ord = compare_events(a, b, field);
            match order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });

        Ok(PagedResult::paginate(events, query))
    }

    pub async fn get(&self, id: Uuid) -> Result<Event, EventServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| EventServiceError::NotFound(id.to_string()))
    }

    pub async fn create(&self, input: CreateEventInput) -> Result<Event, EventServiceError> {
        require_text("title", &input.title)?;
        require_text("blurb", &input.blurb)?;
        require_text("location", &input.location)?;
        require_text("imageUrl", &input.image_url)?;
        require_text("href", &input.href)?;

        let event = self.repo.create(&Event::new(input)).await?;
        tracing::info!(event_id = %event.id, "Created event '{}'", event.title);
        Ok(event)
    }

    /// Merge submitted fields into an existing event
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateEventInput,
    ) -> Result<Event, EventServiceError> {
        let mut event = self.get(id).await?;

        if let Some(title) = input.title {
            require_text("title", &title)?;
            event.title = title;
        }
        if let Some(blurb) = input.blurb {
            require_text("blurb", &blurb)?;
            event.blurb = blurb;
        }
        if let Some(date) = input.date {
            event.date = date;
        }
        if let Some(location) = input.location {
            require_text("location", &location)?;
            event.location = location;
        }
        if let Some(event_type) = input.event_type {
            event.event_type = event_type;
        }
        if let Some(image_url) = input.image_url {
            require_text("imageUrl", &image_url)?;
            event.image_url = image_url;
        }
        if let Some(href) = input.href {
            require_text("href", &href)?;
            event.href = href;
        }
        event.updated_at = Utc::now();

        // The event may have been deleted between the read and the write
        self.repo
            .update(&event)
            .await?
            .ok_or_else(|| EventServiceError::NotFound(id.to_string()))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), EventServiceError> {
        if !self.repo.delete(id).await? {
            return Err(EventServiceError::NotFound(id.to_string()));
        }
        tracing::info!(event_id = %id, "Deleted event");
        Ok(())
    }

    pub async fn count(&self) -> Result<usize, EventServiceError> {
        Ok(self.repo.count().await?)
    }
}

fn compare_events(a: &Event, b: &Event, field: &str) -> Ordering {
    match field {
        "title" => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        "createdAt" => a.created_at.cmp(&b.created_at),
        _ => a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)),
    }
}

fn require_text(field: &str, value: &str) -> Result<(), EventServiceError> {
    if value.trim().is_empty() {
        return Err(EventServiceError::ValidationError(format!(
            "{} is required",
            field
        )));
    }
    Ok(())
}
