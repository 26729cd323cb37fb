//! API layer - HTTP handlers and routing
//!
//! All endpoints live under `/api`:
//! - `/api/health`
//! - `/api/events` (public CRUD)
//! - `/api/blog` (published posts)
//! - `/api/auth` (login, current user)
//! - `/api/admin/*` (events, blog, users and stats; admin token required)
//!
//! Everything else is either the configured SPA directory or a JSON 404.

pub mod admin;
pub mod auth;
pub mod blog;
pub mod common;
pub mod events;
pub mod health;
pub mod middleware;
pub mod static_files;

use anyhow::{Context, Result};
use axum::{
    extract::Request,
    http::{header, HeaderName, HeaderValue, Method},
    middleware as axum_middleware, Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;

pub use middleware::{ApiError, AppState, AuthenticatedUser};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Build the `/api` router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Admin routes (need admin role)
    let admin_routes = Router::new()
        .merge(admin::router())
        .merge(events::router())
        .merge(blog::admin_router())
        .route_layer(axum_middleware::from_fn(middleware::require_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Protected routes (need auth but not admin)
    let protected_routes = auth::protected_router().route_layer(
        axum_middleware::from_fn_with_state(state, middleware::require_auth),
    );

    // Public routes
    Router::new()
        .merge(health::router())
        .merge(events::router())
        .merge(blog::public_router())
        .merge(auth::public_router())
        .merge(protected_routes)
        .nest("/admin", admin_routes)
        .fallback(static_files::not_found)
}

/// Build the complete application with middleware
pub fn build_router(state: AppState, config: &ServerConfig) -> Result<Router> {
    middleware::set_expose_internal_errors(!config.environment.is_production());
    health::mark_started();

    let app = Router::new().nest("/api", build_api_router(state.clone()));
    let app = static_files::with_fallback(app, config.static_dir.as_deref());

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        let request_id = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");
        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    });

    Ok(app
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(cors_layer(&config.cors_origin)?)
        .layer(trace)
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .with_state(state))
}

/// CORS for the configured origin(s); `*` allows any origin
fn cors_layer(origins: &str) -> Result<CorsLayer> {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)]);

    if origins.trim() == "*" {
        return Ok(cors.allow_origin(Any));
    }

    let origins = origins
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(|o| {
            o.parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin '{}'", o))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(cors.allow_origin(AllowOrigin::list(origins)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_layer_accepts_lists_and_wildcard() {
        assert!(cors_layer("*").is_ok());
        assert!(cors_layer("http://localhost:5173").is_ok());
        assert!(cors_layer("https://techlabs.org, https://admin.techlabs.org").is_ok());
    }

    #[test]
    fn test_cors_layer_rejects_invalid_origin() {
        assert!(cors_layer("http://bad\norigin").is_err());
    }
}
