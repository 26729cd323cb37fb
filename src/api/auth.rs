//! Authentication API endpoints
//!
//! - POST /auth/login - Exchange email and password for a JWT
//! - GET  /auth/me    - Current user (requires a Bearer token)

use axum::{extract::State, response::IntoResponse, routing::{get, post}, Router};

use crate::api::common::{data, ApiJson, ClientIp};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::services::LoginInput;

/// Routes that need no authentication
pub fn public_router() -> Router<AppState> {
    Router::new().route("/auth/login", post(login))
}

/// Routes behind `require_auth`
pub fn protected_router() -> Router<AppState> {
    Router::new().route("/auth/me", get(get_current_user))
}

/// POST /api/auth/login
///
/// 200 `{ data: { token, expiresIn, user } }`; 401 on bad credentials,
/// 403 for disabled accounts, 429 when rate limited.
async fn login(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    ApiJson(body): ApiJson<LoginInput>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state.user_service.login(body, ip).await?;
    Ok(data(result))
}

/// GET /api/auth/me
async fn get_current_user(AuthenticatedUser(user): AuthenticatedUser) -> impl IntoResponse {
    data(user)
}
