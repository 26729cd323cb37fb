//! Blog API endpoints
//!
//! Public (published posts only):
//! - GET /blog          - List published posts (`?tag=&page=&limit=&sort=&order=`)
//! - GET /blog/{slug}   - Get a published post by slug
//!
//! Admin (every status, mounted under `/admin`):
//! - GET    /blog        - List posts (`?status=&tag=` plus list params)
//! - POST   /blog        - Create a post
//! - GET    /blog/{id}   - Get a post by id
//! - PATCH  /blog/{id}   - Partial update (PUT behaves the same)
//! - DELETE /blog/{id}   - Delete a post

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};

use crate::api::common::{data, paged, parse_id, ApiJson, ApiQuery, PostListParams};
use crate::api::middleware::{ApiError, AppState};
use crate::models::{CreatePostInput, PostStatus, UpdatePostInput};

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/blog", get(list_published_posts))
        .route("/blog/{slug}", get(get_published_post))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/blog", get(list_posts).post(create_post))
        .route(
            "/blog/{id}",
            get(get_post)
                .patch(update_post)
                .put(update_post)
                .delete(delete_post),
        )
}

async fn list_published_posts(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<PostListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (query, mut filter) = params.into_parts()?;
    filter.status = Some(PostStatus::Published);
    let result = state.post_service.list(&query, &filter).await?;
    Ok(paged(result))
}

async fn get_published_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(data(state.post_service.get_published_by_slug(&slug).await?))
}

async fn list_posts(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<PostListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (query, filter) = params.into_parts()?;
    let result = state.post_service.list(&query, &filter).await?;
    Ok(paged(result))
}

async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, "Blog post")?;
    Ok(data(state.post_service.get(id).await?))
}

async fn create_post(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreatePostInput>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state.post_service.create(input).await?;
    Ok((StatusCode::CREATED, data(post)))
}

async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<UpdatePostInput>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, "Blog post")?;
    Ok(data(state.post_service.update(id, input).await?))
}

async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, "Blog post")?;
    state.post_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
