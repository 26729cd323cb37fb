//! Event repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::Event;

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn create(&self, event: &Event) -> Result<Event>;
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Event>>;
    async fn list(&self) -> Result<Vec<Event>>;
    /// Replace a stored event; `None` when the id is unknown
    async fn update(&self, event: &Event) -> Result<Option<Event>>;
    /// Hard delete; `false` when the id is unknown
    async fn delete(&self, id: Uuid) -> Result<bool>;
    async fn count(&self) -> Result<usize>;
}

pub struct SqlxEventRepository {
    pool: SqlitePool,
}

impl SqlxEventRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn EventRepository> {
        Arc::new(Self::new(pool))
    }
}

const SELECT_EVENT: &str = "SELECT id, title, blurb, date, location, event_type, image_url, href, created_at, updated_at FROM events";

#[async_trait]
impl EventRepository for SqlxEventRepository {
    async fn create(&self, event: &Event) -> Result<Event> {
        sqlx::query(
            "INSERT INTO events (id, title, blurb, date, location, event_type, image_url, href, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(event.id.to_string())
        .bind(&event.title)
        .bind(&event.blurb)
        .bind(event.date)
        .bind(&event.location)
        .bind(event.event_type.to_string())
        .bind(&event.image_url)
        .bind(&event.href)
        .bind(event.created_at)
        .bind(event.updated_at)
        .execute(&self.pool)
        .await
        .context("Failed to create event")?;

        Ok(event.clone())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Event>> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_EVENT))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get event")?;
        row.map(|r| row_to_event(&r)).transpose()
    }

    async fn list(&self) -> Result<Vec<Event>> {
        let rows = sqlx::query(&format!("{} ORDER BY date ASC", SELECT_EVENT))
            .fetch_all(&self.pool)
            .await
            .context("Failed to list events")?;
        rows.iter().map(row_to_event).collect()
    }

    async fn update(&self, event: &Event) -> Result<Option<Event>> {
        let result = sqlx::query(
            "UPDATE events SET title = ?, blurb = ?, date = ?, location = ?, event_type = ?, image_url = ?, href = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&event.title)
        .bind(&event.blurb)
        .bind(event.date)
        .bind(&event.location)
        .bind(event.event_type.to_string())
        .bind(&event.image_url)
        .bind(&event.href)
        .bind(event.updated_at)
        .bind(event.id.to_string())
        .execute(&self.pool)
        .await
        .context("Failed to update event")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(event.id).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete event")?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<usize> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM events")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count events")?;
        Ok(row.get::<i64, _>("count") as usize)
    }
}

fn row_to_event(row: &sqlx::sqlite::SqliteRow) -> Result<Event> {
    let id: String = row.get("id");
    let event_type: String = row.get("event_type");
    Ok(Event {
        id: Uuid::parse_str(&id).context("Invalid event id in database")?,
        title: row.get("title"),
        blurb: row.get("blurb"),
        date: row.get("date"),
        location: row.get("location"),
        event_type: event_type.parse()?,
        image_url: row.get("image_url"),
        href: row.get("href"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use crate::models::{CreateEventInput, EventType};
    use chrono::NaiveDate;

    async fn setup() -> SqlxEventRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxEventRepository::new(pool)
    }

    fn sample(title: &str, date: NaiveDate) -> Event {
        Event::new(CreateEventInput {
            title: title.to_string(),
            blurb: "blurb".to_string(),
            date,
            location: "Berlin".to_string(),
            event_type: EventType::Upcoming,
            image_url: "/img.png".to_string(),
            href: "/events/x".to_string(),
        })
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = setup().await;
        let event = sample("Demo Day", NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        repo.create(&event).await.unwrap();

        let fetched = repo.get_by_id(event.id).await.unwrap().expect("event exists");
        assert_eq!(fetched.title, "Demo Day");
        assert_eq!(fetched.date, event.date);
        assert_eq!(fetched.event_type, EventType::Upcoming);
    }

    #[tokio::test]
    async fn test_list_sorted_by_date() {
        let repo = setup().await;
        repo.create(&sample("late", NaiveDate::from_ymd_opt(2025, 12, 1).unwrap()))
            .await
            .unwrap();
        repo.create(&sample("early", NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()))
            .await
            .unwrap();

        let titles: Vec<String> = repo.list().await.unwrap().into_iter().map(|e| e.title).collect();
        assert_eq!(titles, vec!["early", "late"]);
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_update_and_delete_unknown_id() {
        let repo = setup().await;
        let event = sample("ghost", NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());

        assert!(repo.update(&event).await.unwrap().is_none());
        assert!(!repo.delete(event.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_then_delete() {
        let repo = setup().await;
        let mut event = sample("before", NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        repo.create(&event).await.unwrap();

        event.title = "after".to_string();
        event.event_type = EventType::Past;
        let updated = repo.update(&event).await.unwrap().expect("event exists");
        assert_eq!(updated.title, "after");
        assert_eq!(updated.event_type, EventType::Past);

        assert!(repo.delete(event.id).await.unwrap());
        assert!(repo.get_by_id(event.id).await.unwrap().is_none());
    }
}
