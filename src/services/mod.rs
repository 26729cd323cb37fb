//! Services layer - Business logic
//!
//! Services sit between the HTTP handlers and the repositories. They own
//! validation, sorting and pagination, slug and timestamp rules, and
//! authentication.

pub mod event;
pub mod password;
pub mod post;
pub mod rate_limiter;
pub mod token;
pub mod user;

pub use event::{EventService, EventServiceError};
pub use password::{hash_password, verify_password};
pub use post::{generate_excerpt, generate_slug, PostService, PostServiceError, PostStats};
pub use rate_limiter::LoginRateLimiter;
pub use token::{Claims, TokenError, TokenService};
pub use user::{LoginInput, LoginResult, UserService, UserServiceError, UserStats};
