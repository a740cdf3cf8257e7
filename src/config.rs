use anyhow::{bail, Context, Result};
use std::{env, str::FromStr};
use tracing::debug;

const DEFAULT_MONGODB_URI: &str = "mongodb://localhost:27017";
const DEFAULT_DATABASE: &str = "MoneyMap";
const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3001;
const DEFAULT_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;
const DEFAULT_HASH_TIME_COST: u32 = 2;
const MIN_SECRET_LENGTH: usize = 32;

/// Where user aggregates live. `memory` keeps everything in process and
/// loses it on restart.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub store: StoreBackend,
    pub mongodb_uri: String,
    pub database: String,
    pub bind_address: String,
    pub port: u16,
    pub token_secret: String,
    pub token_ttl_secs: i64,
    pub service_api_token: Option<String>,
    pub password_hash_time_cost: u32,
    pub cors_origin: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let token_secret = var("TOKEN_SECRET").context("You need to add the TOKEN_SECRET to the env")?;
        if token_secret.len() < MIN_SECRET_LENGTH {
            bail!("TOKEN_SECRET must be at least {MIN_SECRET_LENGTH} bytes long");
        }

        let store = match var("STORE").map(|value| value.trim().to_ascii_lowercase()).as_deref() {
            None | Some("mongo") | Some("mongodb") => StoreBackend::Mongo,
            Some("memory") => StoreBackend::Memory,
            Some(other) => bail!("STORE must be 'mongo' or 'memory', got '{other}'"),
        };

        let config = Config {
            store,
            mongodb_uri: var("MONGODB_URI").unwrap_or_else(|| DEFAULT_MONGODB_URI.to_string()),
            database: var("MONGODB_DATABASE").unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            bind_address: var("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            port: parse_or(var("PORT"), "PORT", DEFAULT_PORT)?,
            token_secret,
            token_ttl_secs: parse_or(var("TOKEN_TTL_SECS"), "TOKEN_TTL_SECS", DEFAULT_TOKEN_TTL_SECS)?,
            service_api_token: var("SERVICE_API_TOKEN"),
            password_hash_time_cost: parse_or(
                var("PASSWORD_HASH_TIME_COST"),
                "PASSWORD_HASH_TIME_COST",
                DEFAULT_HASH_TIME_COST,
            )?,
            cors_origin: var("CORS_ORIGIN"),
        };
        if config.token_ttl_secs <= 0 {
            bail!("TOKEN_TTL_SECS must be positive");
        }
        if config.password_hash_time_cost == 0 {
            bail!("PASSWORD_HASH_TIME_COST must be positive");
        }
        debug!(store = ?config.store, database = %config.database, port = config.port, "Loaded configuration");
        Ok(config)
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("Failed to parse {key}='{value}'")),
        None => Ok(default),
    }
}
