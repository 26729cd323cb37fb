//! Static file serving for a pre-built SPA
//!
//! When `server.static_dir` is set, paths outside `/api` are served from that
//! directory. Unknown paths get `index.html` so client-side routes resolve.

use axum::{http::Uri, response::IntoResponse, Router};
use std::path::Path;
use tower_http::services::{ServeDir, ServeFile};

use crate::api::middleware::{ApiError, AppState};

/// Attach the SPA (or a JSON 404) as the router fallback
pub fn with_fallback(router: Router<AppState>, static_dir: Option<&Path>) -> Router<AppState> {
    match static_dir {
        Some(dir) => {
            let index = dir.join("index.html");
            if !index.exists() {
                tracing::warn!("No index.html in static dir '{}'", dir.display());
            }
            tracing::info!("Serving static files from '{}'", dir.display());
            router.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(index)))
        }
        None => router.fallback(not_found),
    }
}

/// Envelope 404 for unknown routes
pub async fn not_found(uri: Uri) -> impl IntoResponse {
    ApiError::not_found(format!("No route for {}", uri.path()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use crate::config::{Config, StorageConfig};

    async fn app(static_dir: Option<&Path>) -> Router {
        let mut config = Config::default();
        config.storage = StorageConfig {
            seed: false,
            ..StorageConfig::default()
        };
        let state = crate::app::bootstrap(&config).await.unwrap();
        with_fallback(Router::new(), static_dir).with_state(state)
    }

    async fn get(app: Router, path: &str) -> (StatusCode, Vec<u8>) {
        let response = app
            .oneshot(Request::get(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_spa_routes_fall_back_to_index() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html>spa</html>").unwrap();
        std::fs::write(dir.path().join("app.js"), "console.log(1)").unwrap();

        let app = app(Some(dir.path())).await;

        let (status, body) = get(app.clone(), "/app.js").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"console.log(1)");

        let (status, body) = get(app, "/events/kickoff").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"<html>spa</html>");
    }

    #[tokio::test]
    async fn test_without_static_dir_unknown_paths_are_json_404() {
        let (status, body) = get(app(None).await, "/anything").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }
}
