use std::{env, fmt::Display, str::FromStr};

use log::{info, warn};
use thiserror::Error;

use crate::constants::TOKEN_LIFETIME_MAX_HOURS;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable {0} is required")]
    Missing(&'static str),

    #[error("Invalid {key} value: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub bind_address: String,
    pub token_secret: String,
    pub token_lifetime_hours: i64,
}

impl Config {
    /// Reads the process environment, seeded from `.env` when one exists.
    pub fn load() -> Result<Self, ConfigError> {
        if dotenvy::dotenv().is_err() {
            info!("No .env file found, reading process environment only");
        }

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            database_max_connections: try_load("DATABASE_MAX_CONNECTIONS", "5")?,
            bind_address: try_load("BIND_ADDRESS", "0.0.0.0:8000")?,
            token_secret: required("TOKEN_SECRET")?,
            token_lifetime_hours: token_lifetime(try_load("TOKEN_LIFETIME_HOURS", "24")?)?,
        })
    }
}

fn token_lifetime(hours: i64) -> Result<i64, ConfigError> {
    if !(1..=TOKEN_LIFETIME_MAX_HOURS).contains(&hours) {
        warn!("Invalid TOKEN_LIFETIME_HOURS value: {hours}");
        return Err(ConfigError::Invalid {
            key: "TOKEN_LIFETIME_HOURS",
            reason: format!("has to be between 1 and {TOKEN_LIFETIME_MAX_HOURS}"),
        });
    }
    Ok(hours)
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::Missing(key))
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    parse_value(key, env::var(key).ok(), default)
}

fn parse_value<T: FromStr>(
    key: &'static str,
    value: Option<String>,
    default: &str,
) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    value
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            ConfigError::Invalid {
                key,
                reason: e.to_string(),
            }
        })
}
