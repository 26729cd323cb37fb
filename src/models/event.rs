//! Event model
//!
//! Events are listed on the website as upcoming or past meetups, workshops
//! and demo days. They have no relationships to other entities.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Event entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    /// Short teaser shown on event cards
    pub blurb: String,
    pub date: NaiveDate,
    pub location: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub image_url: String,
    /// Link to the event detail or registration page
    pub href: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Build a new event from validated input, assigning id and timestamps
    pub fn new(input: CreateEventInput) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            blurb: input.blurb,
            date: input.date,
            location: input.location,
            event_type: input.event_type,
            image_url: input.image_url,
            href: input.href,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Whether an event is still ahead or already happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    #[default]
    Upcoming,
    Past,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::Upcoming => write!(f, "upcoming"),
            EventType::Past => write!(f, "past"),
        }
    }
}

impl FromStr for EventType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "upcoming" => Ok(EventType::Upcoming),
            "past" => Ok(EventType::Past),
            _ => Err(anyhow::anyhow!("Invalid event type: {}", s)),
        }
    }
}

/// Input for creating an event
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventInput {
    pub title: String,
    pub blurb: String,
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
    pub location: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub image_url: String,
    pub href: String,
}

/// Input for updating an event; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventInput {
    pub title: Option<String>,
    pub blurb: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub date: Option<NaiveDate>,
    pub location: Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<EventType>,
    pub image_url: Option<String>,
    pub href: Option<String>,
}

/// Parse `YYYY-MM-DD`, or an RFC 3339 timestamp truncated to its date
pub fn parse_event_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc).date_naive())
        })
}

fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_event_date(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid date '{}'", raw)))
}

fn deserialize_optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => parse_event_date(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date '{}'", raw))),
        None => Ok(None),
    }
}
