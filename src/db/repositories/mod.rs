//! Database repositories
//!
//! Repository traits for each entity, with their SQLite implementations.
//! The in-memory implementations live in `db::memory`.

pub mod event;
pub mod post;
pub mod user;

pub use event::{EventRepository, SqlxEventRepository};
pub use post::{PostRepository, SqlxPostRepository};
pub use user::{SqlxUserRepository, UserRepository};

/// A write collided with a unique column (post slug, user email)
///
/// Repositories return it inside `anyhow::Error`; services downcast it to
/// report a conflict instead of an internal error.
#[derive(Debug, thiserror::Error)]
#[error("{field} '{value}' already exists")]
pub struct DuplicateKey {
    pub field: &'static str,
    pub value: String,
}

impl DuplicateKey {
    pub fn new(field: &'static str, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}

/// Map a failed write, turning unique-constraint violations into `DuplicateKey`
pub(crate) fn write_error(
    err: sqlx::Error,
    duplicate: DuplicateKey,
    context: &'static str,
) -> anyhow::Error {
    let unique = err
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation());
    if unique {
        duplicate.into()
    } else {
        anyhow::Error::new(err).context(context)
    }
}
