//! Application wiring: storage, services and state from configuration

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

use crate::api::AppState;
use crate::config::Config;
use crate::db;
use crate::services::{LoginRateLimiter, TokenService, UserService};

/// Rate limiter sweep interval
const RATE_LIMITER_CLEANUP_SECS: u64 = 300;

/// Open storage, build services and create the configured admin account
pub async fn bootstrap(config: &Config) -> Result<AppState> {
    let storage = db::open_storage(&config.storage)
        .await
        .with_context(|| format!("Failed to open {} storage", config.storage.driver))?;
    tracing::info!("Storage ready: {}", config.storage.driver);

    let tokens = Arc::new(TokenService::new(
        &config.auth.jwt_secret,
        config.auth.jwt_expiration_hours,
    ));
    let user_service = UserService::new(
        storage.users.clone(),
        tokens,
        Arc::new(LoginRateLimiter::new()),
    );

    match (&config.auth.admin_email, &config.auth.admin_password) {
        (Some(email), Some(password)) => {
            user_service
                .ensure_admin(email, password)
                .await
                .context("Failed to create admin account")?;
        }
        _ => {
            if user_service.stats().await.map(|s| s.admins).unwrap_or(0) == 0 {
                tracing::warn!(
                    "No admin account exists; set ADMIN_EMAIL and ADMIN_PASSWORD to create one"
                );
            }
        }
    }

    Ok(AppState::new(storage, user_service))
}

/// Periodically drop expired login rate-limit entries
pub fn spawn_rate_limiter_cleanup(limiter: Arc<LoginRateLimiter>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(RATE_LIMITER_CLEANUP_SECS));
        loop {
            interval.tick().await;
            limiter.cleanup().await;
        }
    })
}
