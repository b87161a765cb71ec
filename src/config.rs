use std::env;
use std::time::Duration;

use crate::error::ConfigError;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_FETCH_TIMEOUT_MS: u64 = 5_000;

/// Top-level configuration, read from `.env` and the process environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub dashboard: DashboardConfig,
    pub telemetry: TelemetryConfig,
    /// Shared secret for admin commands. Unset means no admin access.
    pub admin_token: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let url = env::var("DATABASE_URL").ok().filter(|v| !v.trim().is_empty());
        let max_connections = parse_positive(
            "PULSE_DB_MAX_CONNECTIONS",
            u64::from(DEFAULT_MAX_CONNECTIONS),
        )?;
        let max_connections =
            u32::try_from(max_connections).map_err(|_| ConfigError::InvalidNumber {
                name: "PULSE_DB_MAX_CONNECTIONS",
                value: max_connections.to_string(),
            })?;
        let fetch_timeout_ms = parse_positive("PULSE_FETCH_TIMEOUT_MS", DEFAULT_FETCH_TIMEOUT_MS)?;

        let log_level = env::var("PULSE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let admin_token = env::var("PULSE_ADMIN_TOKEN")
            .ok()
            .filter(|v| !v.is_empty());

        Ok(Self {
            database: DatabaseConfig {
                url,
                max_connections,
            },
            dashboard: DashboardConfig {
                fetch_timeout: Duration::from_millis(fetch_timeout_ms),
            },
            telemetry: TelemetryConfig { log_level },
            admin_token,
        })
    }
}

fn parse_positive(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(value) if value > 0 => Ok(value),
            _ => Err(ConfigError::InvalidNumber { name, value: raw }),
        },
    }
}

/// Connection settings for the Postgres record store.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn url(&self) -> Result<&str, ConfigError> {
        self.url.as_deref().ok_or(ConfigError::MissingDatabaseUrl)
    }
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Applied to each table fetch independently.
    pub fetch_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}
