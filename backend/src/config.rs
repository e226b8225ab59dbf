//! Configuration management for the POS Stock Tracker
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with POS_ prefix

use chrono::{FixedOffset, Offset, Utc};
use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Storage backend selection
    pub store: StoreConfig,

    /// Report calendar settings
    pub reports: ReportsConfig,

    /// Log output settings
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Connection attempts at start-up before giving up
    pub connect_retries: u32,

    /// Run embedded migrations at start-up
    pub run_migrations: bool,
}

/// Which persistence adapter backs the inventory store
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackend::Postgres => "postgres",
            StoreBackend::Memory => "memory",
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportsConfig {
    /// Offset of the shop's local time from UTC, in minutes
    pub utc_offset_minutes: i32,

    /// Default size of the top-sellers report
    pub top_sellers_limit: usize,
}

impl ReportsConfig {
    /// Offset used to cut calendar days; falls back to UTC when out of range
    pub fn offset(&self) -> FixedOffset {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(utc_offset)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("POS_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3001)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.url", "postgres://localhost:5432/pos_tracker")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.connect_retries", 5)?
            .set_default("database.run_migrations", environment == "development")?
            .set_default("store.backend", "postgres")?
            .set_default("reports.utc_offset_minutes", 0)?
            .set_default("reports.top_sellers_limit", 5)?
            .set_default("logging.json", false)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (POS_ prefix)
            .add_source(
                Environment::with_prefix("POS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Configuration for tests and local runs without a database
    pub fn in_memory() -> Self {
        Self {
            environment: "test".to_string(),
            server: ServerConfig::default(),
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 1,
                min_connections: 0,
                connect_retries: 0,
                run_migrations: false,
            },
            store: StoreConfig {
                backend: StoreBackend::Memory,
            },
            reports: ReportsConfig {
                utc_offset_minutes: 0,
                top_sellers_limit: shared::reports::DEFAULT_TOP_SELLERS,
            },
            logging: LoggingConfig { json: false },
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            host: "0.0.0.0".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_from_minutes() {
        let reports = ReportsConfig {
            utc_offset_minutes: 60,
            top_sellers_limit: 5,
        };
        assert_eq!(reports.offset().local_minus_utc(), 3600);
    }

    #[test]
    fn test_out_of_range_offset_falls_back_to_utc() {
        let reports = ReportsConfig {
            utc_offset_minutes: 60 * 48,
            top_sellers_limit: 5,
        };
        assert_eq!(reports.offset().local_minus_utc(), 0);
    }
}
