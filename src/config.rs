use std::env;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub telegram: TelegramConfig,
    pub admin: AdminConfig,
    pub reminders: ReminderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    /// Timeout for a single outbound send; a hung call is classified as a
    /// transient failure so the delivery loop is never blocked indefinitely.
    pub send_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    /// Bearer token required on operator endpoints (event creation,
    /// cancellation, broadcasts, participant listings).
    pub api_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReminderConfig {
    /// Whether the reminder delivery worker is started.
    pub enabled: bool,
    /// How often (seconds) the worker scans for due reminders. Must stay well
    /// below the smallest reminder offset (15 minutes).
    pub poll_interval_seconds: u64,
    /// Transient delivery failures tolerated per reminder before it is
    /// abandoned (marked sent without delivery).
    pub max_attempts: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Config {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("PORT".to_string()))?,
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite://data/events.db".to_string()),
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .unwrap_or(5),
            },
            telegram: TelegramConfig {
                bot_token: env::var("TELEGRAM_BOT_TOKEN").ok(),
                send_timeout_seconds: env::var("TELEGRAM_SEND_TIMEOUT_SECONDS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10u64),
            },
            admin: AdminConfig {
                api_token: env::var("ADMIN_API_TOKEN")
                    .map_err(|_| ConfigError::MissingEnv("ADMIN_API_TOKEN".to_string()))?,
            },
            reminders: ReminderConfig {
                enabled: match env::var("REMINDERS_ENABLED") {
                    Ok(v) => match v.to_lowercase().as_str() {
                        "1" | "true" | "yes" => true,
                        "0" | "false" | "no" => false,
                        _ => true,
                    },
                    Err(_) => true,
                },
                poll_interval_seconds: env::var("REMINDER_POLL_INTERVAL_SECONDS")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()
                    .unwrap_or(60u64),
                max_attempts: env::var("REMINDER_MAX_ATTEMPTS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .unwrap_or(5u32),
            },
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "sqlite://data/events.db".to_string(),
                max_connections: 5,
            },
            telegram: TelegramConfig {
                bot_token: None,
                send_timeout_seconds: 10,
            },
            admin: AdminConfig {
                api_token: String::new(),
            },
            reminders: ReminderConfig {
                enabled: true,
                poll_interval_seconds: 60,
                max_attempts: 5,
            },
        }
    }
}
