//! Service configuration loaded from environment variables.
//!
//! Fail-fast loading with validation: required variables must be present and
//! valid, or the service exits with a clear error message.

use std::env;
use std::time::Duration;

use thiserror::Error;

use firmdir_feed::FeedSource;
use firmdir_sync::WorkerMode;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable was not set.
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// An environment variable held an unusable value.
    #[error("Invalid value for {var}: {message}")]
    Invalid { var: &'static str, message: String },
}

/// Runtime configuration for the sync service.
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string.
    pub database_url: String,
    /// Where the PDA feed document comes from.
    pub feed_source: FeedSource,
    /// Whether the periodic worker runs at all.
    pub sync_enabled: bool,
    /// Interval between reconciliation cycles.
    pub sync_interval: Duration,
    /// Lease duration for the shared cycle lock.
    pub sync_lease: Duration,
    /// Whether cycles apply changes or only report them.
    pub worker_mode: WorkerMode,
    /// Log filter directive (e.g. "info,firmdir=debug").
    pub log_filter: String,
}

impl Config {
    /// Load configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::MissingVar("DATABASE_URL"))?;

        let feed_source = match (optional("PDA_FEED_PATH"), optional("PDA_FEED_URL")) {
            (Some(path), None) => FeedSource::File(path.into()),
            (None, Some(url)) => {
                let url = url.parse().map_err(|e| ConfigError::Invalid {
                    var: "PDA_FEED_URL",
                    message: format!("{e}"),
                })?;
                FeedSource::Http(url)
            }
            (Some(_), Some(_)) => {
                return Err(ConfigError::Invalid {
                    var: "PDA_FEED_PATH",
                    message: "set either PDA_FEED_PATH or PDA_FEED_URL, not both".to_string(),
                });
            }
            (None, None) => {
                return Err(ConfigError::MissingVar("PDA_FEED_PATH or PDA_FEED_URL"));
            }
        };

        let sync_enabled = parse_or("SYNC_ENABLED", true)?;
        let sync_interval = Duration::from_secs(parse_or("SYNC_INTERVAL_SECS", 900u64)?);
        let sync_lease = Duration::from_secs(parse_or("SYNC_LEASE_SECS", 600u64)?);

        if sync_interval.is_zero() {
            return Err(ConfigError::Invalid {
                var: "SYNC_INTERVAL_SECS",
                message: "must be greater than zero".to_string(),
            });
        }
        if sync_lease.is_zero() {
            return Err(ConfigError::Invalid {
                var: "SYNC_LEASE_SECS",
                message: "must be greater than zero".to_string(),
            });
        }

        let worker_mode = match optional("SYNC_MODE") {
            Some(raw) => raw.parse().map_err(|e: String| ConfigError::Invalid {
                var: "SYNC_MODE",
                message: e,
            })?,
            None => WorkerMode::Synchronize,
        };

        let log_filter = optional("LOG_FILTER").unwrap_or_else(|| "info".to_string());

        Ok(Self {
            database_url,
            feed_source,
            sync_enabled,
            sync_interval,
            sync_lease,
            worker_mode,
            log_filter,
        })
    }
}

fn optional(var: &'static str) -> Option<String> {
    env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match optional(var) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            message: format!("{e}"),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConfigError::MissingVar("DATABASE_URL");
        assert_eq!(
            err.to_string(),
            "Missing required environment variable: DATABASE_URL"
        );

        let err = ConfigError::Invalid {
            var: "SYNC_INTERVAL_SECS",
            message: "must be greater than zero".to_string(),
        };
        assert!(err.to_string().contains("SYNC_INTERVAL_SECS"));
    }
}
