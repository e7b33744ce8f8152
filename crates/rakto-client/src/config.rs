//! Client configuration.

use std::env;
use std::str::FromStr;

use crate::error::{ClientError, Result};

/// Default database URL.
pub const DEFAULT_DATABASE_URL: &str = "sqlite:rakto.db?mode=rwc";

/// Configuration for the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// SQLite database URL.
    pub database_url: String,

    /// Maximum database connections.
    pub pool_size: u32,

    /// Number of pending requests shown on the home feed.
    pub recent_requests: usize,

    /// Capacity of the session command channel.
    pub session_channel: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            pool_size: 5,
            recent_requests: 5,
            session_channel: 32,
        }
    }
}

impl ClientConfig {
    /// Create configuration from environment variables (after loading `.env`).
    ///
    /// Optional environment variables:
    /// - `RAKTO_DATABASE_URL` - Database URL (default: sqlite:rakto.db?mode=rwc)
    /// - `RAKTO_DB_POOL_SIZE` - Max database connections (default: 5)
    /// - `RAKTO_RECENT_REQUESTS` - Home feed size (default: 5)
    /// - `RAKTO_SESSION_CHANNEL` - Session command channel capacity (default: 32)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let database_url = lookup("RAKTO_DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(defaults.database_url);

        let config = Self {
            database_url,
            pool_size: parse_var(&lookup, "RAKTO_DB_POOL_SIZE", defaults.pool_size)?,
            recent_requests: parse_var(&lookup, "RAKTO_RECENT_REQUESTS", defaults.recent_requests)?,
            session_channel: parse_var(&lookup, "RAKTO_SESSION_CHANNEL", defaults.session_channel)?,
        };

        if config.pool_size == 0 {
            return Err(ClientError::Config(
                "RAKTO_DB_POOL_SIZE must be at least 1".to_string(),
            ));
        }
        if config.session_channel == 0 {
            return Err(ClientError::Config(
                "RAKTO_SESSION_CHANNEL must be at least 1".to_string(),
            ));
        }

        Ok(config)
    }
}

fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ClientError::Config(format!("{} is not a valid number: '{}'", name, value))),
        None => Ok(default),
    }
}
