//! Configuration management
//!
//! Configuration is loaded from a `config.yml` file and then overridden by
//! environment variables. Missing optional values are filled with defaults,
//! so the server starts with no configuration at all (in-memory storage,
//! development secret).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// JWT secret used when nothing is configured. Refused in production.
pub const DEV_JWT_SECRET: &str = "techlabs-dev-secret-change-me";

/// Longest accepted token lifetime (10 years)
pub const MAX_JWT_EXPIRATION_HOURS: i64 = 10 * 365 * 24;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        *self == Environment::Production
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
    /// Runtime environment; production hides internal error messages
    #[serde(default)]
    pub environment: Environment,
    /// Directory holding a pre-built SPA to serve for non-API paths
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
            environment: Environment::default(),
            static_dir: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_cors_origin() -> String {
    "http://localhost:5173".to_string()
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage driver (memory or sqlite)
    #[serde(default)]
    pub driver: StorageDriver,
    /// SQLite database URL or file path (sqlite driver only)
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Seed the memory store with fixtures on startup
    #[serde(default = "default_seed")]
    pub seed: bool,
    /// Path to the events fixture file
    #[serde(default = "default_events_seed_path")]
    pub events_seed_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            driver: StorageDriver::default(),
            url: default_database_url(),
            seed: default_seed(),
            events_seed_path: default_events_seed_path(),
        }
    }
}

fn default_database_url() -> String {
    "data/techlabs.db".to_string()
}

fn default_seed() -> bool {
    true
}

fn default_events_seed_path() -> PathBuf {
    PathBuf::from("data/events.json")
}

/// Storage driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageDriver {
    /// In-process collections (default)
    #[default]
    Memory,
    /// SQLite through sqlx
    Sqlite,
}

impl std::fmt::Display for StorageDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageDriver::Memory => write!(f, "memory"),
            StorageDriver::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret used to sign tokens
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Token lifetime in hours
    #[serde(default = "default_jwt_expiration_hours")]
    pub jwt_expiration_hours: i64,
    /// Admin account created at startup when absent
    #[serde(default)]
    pub admin_email: Option<String>,
    #[serde(default)]
    pub admin_password: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            jwt_expiration_hours: default_jwt_expiration_hours(),
            admin_email: None,
            admin_password: None,
        }
    }
}

fn default_jwt_secret() -> String {
    DEV_JWT_SECRET.to_string()
}

fn default_jwt_expiration_hours() -> i64 {
    7 * 24
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// A missing or empty file yields the default configuration.
    /// Invalid YAML is an error carrying the line and column.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            })?;

        Ok(config)
    }

    /// Load configuration from file, apply environment overrides and validate
    ///
    /// Recognized variables:
    /// - HOST, PORT, CORS_ORIGIN, APP_ENV (NODE_ENV when unset), STATIC_DIR
    /// - STORAGE_DRIVER, DATABASE_URL, SEED_DATA, SEED_EVENTS_PATH
    /// - JWT_SECRET, JWT_EXPIRATION_HOURS, ADMIN_EMAIL, ADMIN_PASSWORD
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(cors_origin) = std::env::var("CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }
        if let Ok(env) = std::env::var("APP_ENV").or_else(|_| std::env::var("NODE_ENV")) {
            match env.to_lowercase().as_str() {
                "development" | "dev" => self.server.environment = Environment::Development,
                "production" | "prod" => self.server.environment = Environment::Production,
                _ => {}
            }
        }
        if let Ok(dir) = std::env::var("STATIC_DIR") {
            self.server.static_dir = Some(PathBuf::from(dir));
        }

        if let Ok(driver) = std::env::var("STORAGE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "memory" => self.storage.driver = StorageDriver::Memory,
                "sqlite" => self.storage.driver = StorageDriver::Sqlite,
                _ => {}
            }
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.storage.url = url;
        }
        if let Ok(seed) = std::env::var("SEED_DATA") {
            if let Ok(seed) = seed.parse::<bool>() {
                self.storage.seed = seed;
            }
        }
        if let Ok(path) = std::env::var("SEED_EVENTS_PATH") {
            self.storage.events_seed_path = PathBuf::from(path);
        }

        if let Ok(secret) = std::env::var("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Ok(hours) = std::env::var("JWT_EXPIRATION_HOURS") {
            if let Ok(hours) = hours.parse::<i64>() {
                self.auth.jwt_expiration_hours = hours;
            }
        }
        if let Ok(email) = std::env::var("ADMIN_EMAIL") {
            self.auth.admin_email = Some(email);
        }
        if let Ok(password) = std::env::var("ADMIN_PASSWORD") {
            self.auth.admin_password = Some(password);
        }
    }

    /// Check values that defaults cannot repair
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.is_empty() {
            return Err(ConfigError::ValidationError(
                "auth.jwt_secret must not be empty".to_string(),
            ));
        }
        if self.server.environment.is_production() && self.auth.jwt_secret == DEV_JWT_SECRET {
            return Err(ConfigError::ValidationError(
                "JWT_SECRET must be set in production".to_string(),
            ));
        }
        if self.auth.jwt_expiration_hours <= 0 {
            return Err(ConfigError::ValidationError(
                "auth.jwt_expiration_hours must be positive".to_string(),
            ));
        }
        if self.auth.jwt_expiration_hours > MAX_JWT_EXPIRATION_HOURS {
            return Err(ConfigError::ValidationError(format!(
                "auth.jwt_expiration_hours must not exceed {}",
                MAX_JWT_EXPIRATION_HOURS
            )));
        }
        if self.auth.admin_email.is_some() != self.auth.admin_password.is_some() {
            return Err(ConfigError::ValidationError(
                "ADMIN_EMAIL and ADMIN_PASSWORD must be set together".to_string(),
            ));
        }
        Ok(())
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for config tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
