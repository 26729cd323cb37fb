//! Event API endpoints
//!
//! - GET    /events        - List events (`?page=&limit=&sort=&order=`)
//! - GET    /events/{id}   - Get one event
//! - POST   /events        - Create an event
//! - PATCH  /events/{id}   - Partial update (PUT behaves the same)
//! - DELETE /events/{id}   - Delete an event
//!
//! Mounted publicly under `/api` and again under `/api/admin`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};

use crate::api::common::{data, paged, parse_id, ApiJson, ApiQuery, ListParams};
use crate::api::middleware::{ApiError, AppState};
use crate::models::{CreateEventInput, UpdateEventInput};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route(
            "/events/{id}",
            get(get_event)
                .patch(update_event)
                .put(update_event)
                .delete(delete_event),
        )
}

async fn list_events(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = params.into_query()?;
    let result = state.event_service.list(&query).await?;
    Ok(paged(result))
}

async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, "Event")?;
    Ok(data(state.event_service.get(id).await?))
}

async fn create_event(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateEventInput>,
) -> Result<impl IntoResponse, ApiError> {
    let event = state.event_service.create(input).await?;
    Ok((StatusCode::CREATED, data(event)))
}

async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<UpdateEventInput>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, "Event")?;
    Ok(data(state.event_service.update(id, input).await?))
}

async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, "Event")?;
    state.event_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
