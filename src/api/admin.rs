//! Admin API endpoints
//!
//! Everything here sits behind `require_auth` + `require_admin`:
//! - GET    /admin/stats       - Counts per entity and post status
//! - GET    /admin/users       - List users
//! - POST   /admin/users       - Create a user
//! - GET    /admin/users/{id}  - Get a user
//! - PATCH  /admin/users/{id}  - Update a user
//! - DELETE /admin/users/{id}  - Delete a user
//!
//! Event and blog management reuse the routers in `events` and `blog`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Serialize;

use crate::api::common::{data, parse_id, ApiJson};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{CreateUserInput, UpdateUserInput};
use crate::services::{PostStats, UserStats};

/// Dashboard counters
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub events: usize,
    pub posts: PostStats,
    pub users: UserStats,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stats", get(get_stats))
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/{id}",
            get(get_user).patch(update_user).delete(delete_user),
        )
}

async fn get_stats(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(data(StatsResponse {
        events: state.event_service.count().await?,
        posts: state.post_service.stats().await?,
        users: state.user_service.stats().await?,
    }))
}

async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(data(state.user_service.list().await?))
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, "User")?;
    Ok(data(state.user_service.get(id).await?))
}

async fn create_user(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateUserInput>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.user_service.create(input).await?;
    tracing::info!(user_id = %user.id, "Admin created user {}", user.email);
    Ok((StatusCode::CREATED, data(user)))
}

async fn update_user(
    State(state): State<AppState>,
    AuthenticatedUser(admin): AuthenticatedUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<UpdateUserInput>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, "User")?;
    Ok(data(state.user_service.update(id, input, admin.id).await?))
}

async fn delete_user(
    State(state): State<AppState>,
    AuthenticatedUser(admin): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, "User")?;
    state.user_service.delete(id, admin.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
