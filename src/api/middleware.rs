//! API middleware and shared handler types
//!
//! Contains:
//! - `AppState` shared by every handler
//! - `ApiError`, the `{ error: { code, message, details? } }` envelope
//! - Authentication (Bearer JWT) and admin authorization middleware

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::Storage;
use crate::models::User;
use crate::services::{
    EventService, EventServiceError, PostService, PostServiceError, UserService, UserServiceError,
};

/// Whether internal error messages reach clients (off in production)
static EXPOSE_INTERNAL_ERRORS: AtomicBool = AtomicBool::new(true);

pub fn set_expose_internal_errors(expose: bool) {
    EXPOSE_INTERNAL_ERRORS.store(expose, Ordering::Relaxed);
}

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub storage: Storage,
    pub event_service: Arc<EventService>,
    pub post_service: Arc<PostService>,
    pub user_service: Arc<UserService>,
}

impl AppState {
    /// Wire services on top of a storage backend
    pub fn new(storage: Storage, user_service: UserService) -> Self {
        Self {
            event_service: Arc::new(EventService::new(storage.events.clone())),
            post_service: Arc::new(PostService::new(storage.posts.clone())),
            user_service: Arc::new(user_service),
            storage,
        }
    }
}

/// Authenticated user extracted from request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::with_details("RATE_LIMIT", message, serde_json::json!({ "retryAfter": 60 }))
    }

    /// Log an unexpected failure under a fresh trace id
    ///
    /// The client always gets the trace id; the message itself is replaced
    /// by a generic one when internal errors are not exposed.
    pub fn internal_error(err: impl std::fmt::Display) -> Self {
        let trace_id = Uuid::new_v4();
        tracing::error!(trace_id = %trace_id, "Internal error: {:#}", err);

        let message = internal_message(&err, EXPOSE_INTERNAL_ERRORS.load(Ordering::Relaxed));
        Self::with_details(
            "INTERNAL_ERROR",
            message,
            serde_json::json!({ "traceId": trace_id }),
        )
    }
}

fn internal_message(err: &impl std::fmt::Display, expose: bool) -> String {
    if expose {
        err.to_string()
    } else {
        "Internal server error".to_string()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            "RATE_LIMIT" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

impl From<EventServiceError> for ApiError {
    fn from(err: EventServiceError) -> Self {
        match err {
            EventServiceError::NotFound(_) => ApiError::not_found("Event not found"),
            EventServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            EventServiceError::InternalError(e) => ApiError::internal_error(e),
        }
    }
}

impl From<PostServiceError> for ApiError {
    fn from(err: PostServiceError) -> Self {
        match err {
            PostServiceError::NotFound(_) => ApiError::not_found("Blog post not found"),
            PostServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            PostServiceError::Conflict(slug) => {
                ApiError::conflict(format!("A post with slug '{}' already exists", slug))
            }
            PostServiceError::InternalError(e) => ApiError::internal_error(e),
        }
    }
}

impl From<UserServiceError> for ApiError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::NotFound(_) => ApiError::not_found("User not found"),
            UserServiceError::AuthenticationError(msg) => ApiError::unauthorized(msg),
            UserServiceError::Forbidden(msg) => ApiError::forbidden(msg),
            UserServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            UserServiceError::Conflict(email) => {
                ApiError::conflict(format!("A user with email '{}' already exists", email))
            }
            UserServiceError::RateLimited => {
                ApiError::rate_limited("Too many login attempts, try again later")
            }
            UserServiceError::InternalError(e) => ApiError::internal_error(e),
        }
    }
}

/// Extract the Bearer token from the Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Authentication middleware
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(request.headers())
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    let user = state.user_service.authenticate(token).await?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

/// Admin authorization middleware, layered inside `require_auth`
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if !user.0.is_admin() {
        return Err(ApiError::forbidden("Admin privileges required"));
    }

    Ok(next.run(request).await)
}
