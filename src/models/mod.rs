//! Data models
//!
//! Entities stored by the content API (Event, BlogPost, User), their
//! create/update inputs, and the list query types shared by the listings.

mod event;
mod post;
mod query;
mod user;

pub use event::{parse_event_date, CreateEventInput, Event, EventType, UpdateEventInput};
pub use post::{BlogPost, CreatePostInput, PostFilter, PostStatus, UpdatePostInput};
pub use query::{ListQuery, PageMeta, PagedResult, SortOrder, DEFAULT_LIMIT, MAX_LIMIT};
pub use user::{normalize_email, CreateUserInput, UpdateUserInput, User, UserRole};
