//! Environment-driven configuration for the bot binary.

use anyhow::{Context, Result};
use std::time::Duration;

/// Default due-timer polling cadence in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Discord bot token (`DISCORD_TOKEN`).
    pub discord_token: String,
    /// Path to the sqlite database file (`DATABASE_URL`, default `tempus.db`).
    pub database_url: String,
    /// Due-timer polling cadence (`POLL_INTERVAL_SECS`, default 60).
    pub poll_interval: Duration,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        let discord_token =
            std::env::var("DISCORD_TOKEN").context("DISCORD_TOKEN must be set")?;

        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "tempus.db".to_string());

        let poll_interval_secs = match std::env::var("POLL_INTERVAL_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .context("POLL_INTERVAL_SECS must be a positive integer")?,
            Err(_) => DEFAULT_POLL_INTERVAL_SECS,
        };

        Ok(Config {
            discord_token,
            database_url,
            poll_interval: Duration::from_secs(poll_interval_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_poll_interval_is_one_minute() {
        assert_eq!(DEFAULT_POLL_INTERVAL_SECS, 60);
    }

    #[test]
    fn test_config_is_cloneable() {
        let config = Config {
            discord_token: "token".to_string(),
            database_url: ":memory:".to_string(),
            poll_interval: Duration::from_secs(60),
        };
        let clone = config.clone();
        assert_eq!(clone.database_url, ":memory:");
    }
}
