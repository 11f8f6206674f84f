//! Process configuration, read from the environment once at startup.
//!
//! | Variable | Default | |
//! |---|---|---|
//! | `DATABASE_URL` | required | PostgreSQL connection string |
//! | `HUMANS_BIND_ADDR` | `0.0.0.0:8000` | listen address |
//! | `HUMANS_DB_MAX_CONNECTIONS` | `8` | pool size, at least 1 |
//! | `HUMANS_DB_CONNECT_TIMEOUT_MS` | `2000` | initial connect deadline |
//! | `HUMANS_QUERY_TIMEOUT_MS` | `5000` | per-statement deadline |
//! | `HUMANS_DRAIN_TIMEOUT_MS` | `10000` | shutdown wait for open connections |
//!
//! Counts and timeouts must be greater than zero.
//!
//! Log filtering is separate and follows `RUST_LOG`.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use thiserror::Error;

use crate::store::PgStoreOptions;

pub const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} is invalid: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub store: PgStoreOptions,
    pub drain_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_kv(&std::env::vars().collect())
    }

    pub fn from_kv(kv: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_url = kv
            .get("DATABASE_URL")
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?
            .to_owned();

        let bind_addr = match non_empty(kv, "HUMANS_BIND_ADDR") {
            Some(raw) => raw.parse().map_err(|e| invalid("HUMANS_BIND_ADDR", e))?,
            None => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
        };

        let max_connections = positive_or(kv, "HUMANS_DB_MAX_CONNECTIONS", 8u32)?;
        let connect_timeout_ms = positive_or(kv, "HUMANS_DB_CONNECT_TIMEOUT_MS", 2_000u64)?;
        let query_timeout_ms = positive_or(kv, "HUMANS_QUERY_TIMEOUT_MS", 5_000u64)?;
        let drain_timeout_ms = positive_or(kv, "HUMANS_DRAIN_TIMEOUT_MS", 10_000u64)?;

        Ok(Self {
            bind_addr,
            database_url,
            store: PgStoreOptions {
                max_connections,
                connect_timeout: Duration::from_millis(connect_timeout_ms),
                query_timeout: Duration::from_millis(query_timeout_ms),
            },
            drain_timeout: Duration::from_millis(drain_timeout_ms),
        })
    }
}

fn non_empty<'a>(kv: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    kv.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn parse_or<T>(kv: &HashMap<String, String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match non_empty(kv, key) {
        Some(raw) => raw.parse().map_err(|e| invalid(key, e)),
        None => Ok(default),
    }
}

fn positive_or<T>(kv: &HashMap<String, String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + Default + PartialEq,
    T::Err: std::fmt::Display,
{
    let value = parse_or(kv, key, default)?;
    if value == T::default() {
        return Err(ConfigError::Invalid { key, message: "must be greater than zero".to_owned() });
    }
    Ok(value)
}

fn invalid(key: &'static str, err: impl std::fmt::Display) -> ConfigError {
    ConfigError::Invalid { key, message: err.to_string() }
}
