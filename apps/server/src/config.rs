//! Server configuration.

use std::env;

use anyhow::Context;
use entities::UserId;
use uuid::Uuid;

/// User ID every request acts as in single-user mode unless overridden.
pub const DEFAULT_LOCAL_USER_ID: Uuid = Uuid::from_u128(1);

/// `DATABASE_URL` value selecting the in-memory store.
pub const MEMORY_DATABASE_URL: &str = "memory";

const DEFAULT_DATABASE_URL: &str = "sqlite:taskdeck.db?mode=rwc";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_JWT_EXPIRATION_HOURS: u64 = auth::DEFAULT_JWT_EXPIRATION_HOURS;

/// Storage backend selected by `DATABASE_URL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// Process-local maps, lost on restart.
    Memory,
    /// SQLite database at the given URL.
    Sqlite(String),
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Database URL.
    pub database_url: String,
    /// Whether running in single-user mode.
    pub single_user_mode: bool,
    /// Identity used for every request in single-user mode.
    pub local_user_id: UserId,
    /// JWT secret (required in multi-user mode).
    pub jwt_secret: Option<String>,
    /// JWT expiration in hours.
    pub jwt_expiration_hours: u64,
    /// Log level.
    pub log_level: String,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let single_user_mode = lookup("TASKDECK_SINGLE_USER_MODE")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(true);

        let jwt_secret = lookup("TASKDECK_JWT_SECRET").filter(|s| !s.is_empty());
        if !single_user_mode && jwt_secret.is_none() {
            anyhow::bail!("TASKDECK_JWT_SECRET is required in multi-user mode");
        }

        let local_user_id = match lookup("TASKDECK_LOCAL_USER_ID") {
            Some(value) => value
                .parse()
                .with_context(|| format!("TASKDECK_LOCAL_USER_ID is not a valid UUID: {value}"))?,
            None => UserId::from(DEFAULT_LOCAL_USER_ID),
        };

        Ok(Self {
            host: lookup("TASKDECK_SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: lookup("TASKDECK_SERVER_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            single_user_mode,
            local_user_id,
            jwt_secret,
            jwt_expiration_hours: lookup("TASKDECK_JWT_EXPIRATION_HOURS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_JWT_EXPIRATION_HOURS),
            log_level: lookup("TASKDECK_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Returns the server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns true if authentication should be enabled.
    pub fn auth_enabled(&self) -> bool {
        !self.single_user_mode
    }

    /// Returns the storage backend named by `database_url`.
    pub fn store_backend(&self) -> StoreBackend {
        if self.database_url == MEMORY_DATABASE_URL {
            StoreBackend::Memory
        } else {
            StoreBackend::Sqlite(self.database_url.clone())
        }
    }
}
