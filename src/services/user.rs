//! User service
//!
//! Authentication and account management:
//! - Login with email and password, issuing a JWT
//! - Token verification and current-user lookup
//! - Admin bootstrap from configuration
//! - User CRUD for the admin surface

use crate::db::repositories::{DuplicateKey, UserRepository};
use crate::models::{normalize_email, CreateUserInput, UpdateUserInput, User, UserRole};
use crate::services::password::{
    hash_password, verify_dummy, verify_password, MIN_PASSWORD_LENGTH,
};
use crate::services::rate_limiter::LoginRateLimiter;
use crate::services::token::{Claims, TokenError, TokenService};
use anyhow::Context;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::sync::Arc;
use uuid::Uuid;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    #[error("User not found: {0}")]
    NotFound(String),

    /// Missing, invalid or expired credentials
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Authenticated, but not allowed
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Email already registered
    #[error("User already exists: {0}")]
    Conflict(String),

    #[error("Too many login attempts, try again later")]
    RateLimited,

    #[error("Internal error: {0}")]
    InternalError(anyhow::Error),
}

impl From<anyhow::Error> for UserServiceError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<DuplicateKey>() {
            Some(dup) => UserServiceError::Conflict(dup.value.clone()),
            None => UserServiceError::InternalError(err),
        }
    }
}

/// Login request body
#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Successful login
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    pub token: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
    pub user: User,
}

/// User counts for the admin dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserStats {
    pub total: usize,
    pub admins: usize,
}

pub struct UserService {
    repo: Arc<dyn UserRepository>,
    tokens: Arc<TokenService>,
    rate_limiter: Arc<LoginRateLimiter>,
}

impl UserService {
    pub fn new(
        repo: Arc<dyn UserRepository>,
        tokens: Arc<TokenService>,
        rate_limiter: Arc<LoginRateLimiter>,
    ) -> Self {
        Self {
            repo,
            tokens,
            rate_limiter,
        }
    }

    pub fn rate_limiter(&self) -> &Arc<LoginRateLimiter> {
        &self.rate_limiter
    }

    /// Check credentials and issue a token
    ///
    /// Unknown email and wrong password produce the same error. Inactive
    /// accounts with correct credentials are refused with `Forbidden`.
    pub async fn login(
        &self,
        input: LoginInput,
        client_ip: Option<IpAddr>,
    ) -> Result<LoginResult, UserServiceError> {
        if let Some(ip) = client_ip {
            if self.rate_limiter.check_ip(ip).await {
                tracing::warn!(%ip, "Login rate limit hit for client");
                return Err(UserServiceError::RateLimited);
            }
        }

        let email = normalize_email(&input.email);
        if email.is_empty() || input.password.is_empty() {
            return Err(UserServiceError::ValidationError(
                "email and password are required".to_string(),
            ));
        }
        if self.rate_limiter.is_email_limited(&email).await {
            tracing::warn!("Login rate limit hit for {}", email);
            return Err(UserServiceError::RateLimited);
        }

        let user = match self.repo.get_by_email(&email).await? {
            Some(user) => user,
            None => {
                verify_dummy(&input.password);
                self.rate_limiter.record_failed_attempt(&email).await;
                return Err(UserServiceError::AuthenticationError(
                    INVALID_CREDENTIALS.to_string(),
                ));
            }
        };

        let valid = verify_password(&input.password, &user.password_hash)
            .context("Failed to verify password")?;
        if !valid {
            self.rate_limiter.record_failed_attempt(&email).await;
            tracing::info!(user_id = %user.id, "Failed login attempt");
            return Err(UserServiceError::AuthenticationError(
                INVALID_CREDENTIALS.to_string(),
            ));
        }

        if !user.is_active {
            return Err(UserServiceError::Forbidden("Account is disabled".to_string()));
        }

        self.rate_limiter.clear_email_attempts(&email).await;
        let token = self.issue_token(&user)?;
        tracing::info!(user_id = %user.id, "User logged in");

        Ok(LoginResult {
            token,
            expires_in: self.tokens.expires_in(),
            user,
        })
    }

    fn issue_token(&self, user: &User) -> Result<String, UserServiceError> {
        self.tokens
            .issue(user)
            .map_err(|e| UserServiceError::InternalError(anyhow::anyhow!(e)))
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, UserServiceError> {
        self.tokens.verify(token).map_err(|e| match e {
            TokenError::Expired => {
                UserServiceError::AuthenticationError("Token expired".to_string())
            }
            _ => UserServiceError::AuthenticationError("Invalid token".to_string()),
        })
    }

    /// Load the account behind verified claims
    pub async fn current_user(&self, claims: &Claims) -> Result<User, UserServiceError> {
        let user = match claims.user_id() {
            Some(id) => self.repo.get_by_id(id).await?,
            None => None,
        };
        let user = user.ok_or_else(|| {
            UserServiceError::AuthenticationError("User no longer exists".to_string())
        })?;

        if !user.is_active {
            return Err(UserServiceError::Forbidden("Account is disabled".to_string()));
        }
        Ok(user)
    }

    /// Verify a bearer token and load its user
    pub async fn authenticate(&self, token: &str) -> Result<User, UserServiceError> {
        let claims = self.verify_token(token)?;
        self.current_user(&claims).await
    }

    /// Create the configured admin account unless that email already exists
    pub async fn ensure_admin(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, UserServiceError> {
        let email = normalize_email(email);
        if self.repo.get_by_email(&email).await?.is_some() {
            tracing::debug!("Admin account {} already present", email);
            return Ok(None);
        }

        let user = self
            .create(CreateUserInput {
                email,
                password: password.to_string(),
                role: UserRole::Admin,
                is_active: Some(true),
            })
            .await?;
        tracing::info!(user_id = %user.id, "Created admin account {}", user.email);
        Ok(Some(user))
    }

    pub async fn list(&self) -> Result<Vec<User>, UserServiceError> {
        Ok(self.repo.list().await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<User, UserServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| UserServiceError::NotFound(id.to_string()))
    }

    pub async fn create(&self, input: CreateUserInput) -> Result<User, UserServiceError> {
        let email = normalize_email(&input.email);
        validate_email(&email)?;
        validate_password(&input.password)?;

        if self.repo.get_by_email(&email).await?.is_some() {
            return Err(UserServiceError::Conflict(email));
        }

        let hash = hash_password(&input.password).context("Failed to hash password")?;
        let mut user = User::new(email, hash, input.role);
        if let Some(active) = input.is_active {
            user.is_active = active;
        }

        Ok(self.repo.create(&user).await?)
    }

    /// Apply submitted changes; `acting_user` may not lock themselves out
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateUserInput,
        acting_user: Uuid,
    ) -> Result<User, UserServiceError> {
        let mut user = self.get(id).await?;

        if let Some(email) = input.email {
            let email = normalize_email(&email);
            validate_email(&email)?;
            if email != user.email && self.repo.get_by_email(&email).await?.is_some() {
                return Err(UserServiceError::Conflict(email));
            }
            user.email = email;
        }
        if let Some(password) = input.password {
            validate_password(&password)?;
            user.password_hash = hash_password(&password).context("Failed to hash password")?;
        }

        let loses_admin = user.is_admin()
            && (input.role.is_some_and(|r| r != UserRole::Admin) || input.is_active == Some(false));
        if loses_admin {
            if id == acting_user {
                return Err(UserServiceError::ValidationError(
                    "You cannot remove your own admin access".to_string(),
                ));
            }
            self.ensure_other_admin_exists().await?;
        }

        if let Some(role) = input.role {
            user.role = role;
        }
        if let Some(active) = input.is_active {
            user.is_active = active;
        }
        user.updated_at = Utc::now();

        self.repo
            .update(&user)
            .await?
            .ok_or_else(|| UserServiceError::NotFound(id.to_string()))
    }

    pub async fn delete(&self, id: Uuid, acting_user: Uuid) -> Result<(), UserServiceError> {
        if id == acting_user {
            return Err(UserServiceError::ValidationError(
                "You cannot delete your own account".to_string(),
            ));
        }

        let user = self.get(id).await?;
        if user.is_admin() {
            self.ensure_other_admin_exists().await?;
        }

        if !self.repo.delete(id).await? {
            return Err(UserServiceError::NotFound(id.to_string()));
        }
        tracing::info!(user_id = %id, "Deleted user");
        Ok(())
    }

    pub async fn stats(&self) -> Result<UserStats, UserServiceError> {
        Ok(UserStats {
            total: self.repo.count().await?,
            admins: self.repo.count_admins().await?,
        })
    }

    async fn ensure_other_admin_exists(&self) -> Result<(), UserServiceError> {
        if self.repo.count_admins().await? <= 1 {
            return Err(UserServiceError::ValidationError(
                "At least one admin account must remain".to_string(),
            ));
        }
        Ok(())
    }
}

fn validate_email(email: &str) -> Result<(), UserServiceError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains('@')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(UserServiceError::ValidationError(format!(
            "'{}' is not a valid email address",
            email
        )));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), UserServiceError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(UserServiceError::ValidationError(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}
