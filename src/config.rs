use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use crate::errors::AppError;
use crate::external::yahoo;
use crate::services::currency_service::DEFAULT_EXCHANGE_RATE;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_DATABASE_URL: &str = "sqlite://investment.db";
pub const DEFAULT_INDEX_SYMBOL: &str = "^GSPC";
pub const DEFAULT_CURRENCY_SYMBOL: &str = "₪";
pub const DEFAULT_FETCH_RETRIES: u32 = 3;
pub const DEFAULT_FETCH_DELAY_SECS: u64 = 5;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 168;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: IpAddr,
    pub port: u16,
    pub database_url: String,
    pub currency_symbol: String,
    pub price: PriceConfig,
    pub seed_amounts: Option<Vec<f64>>,
}

#[derive(Debug, Clone)]
pub struct PriceConfig {
    pub symbol: String,
    pub exchange_rate: f64,
    pub base_url: String,
    pub retries: u32,
    pub delay: Duration,
    pub timeout: Duration,
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            symbol: DEFAULT_INDEX_SYMBOL.to_string(),
            exchange_rate: DEFAULT_EXCHANGE_RATE,
            base_url: yahoo::DEFAULT_BASE_URL.to_string(),
            retries: DEFAULT_FETCH_RETRIES,
            delay: Duration::from_secs(DEFAULT_FETCH_DELAY_SECS),
            timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
        }
    }
}

/// Login credential and session signing material. Loaded separately from
/// [`AppConfig`] so commands that never serve pages don't need secrets.
#[derive(Clone)]
pub struct AuthConfig {
    pub password_hash: Option<String>,
    pub password: Option<String>,
    pub secret_key: String,
    pub previous_secret_key: Option<String>,
    pub session_ttl: chrono::Duration,
}

// secrets are redacted
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("password_hash", &self.password_hash.as_ref().map(|_| "<redacted>"))
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("secret_key", &"<redacted>")
            .field("previous_secret_key", &self.previous_secret_key.as_ref().map(|_| "<redacted>"))
            .field("session_ttl", &self.session_ttl)
            .finish()
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match non_empty(lookup, key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| AppError::Config(format!("{key}={raw:?} is invalid: {e}"))),
        None => Ok(default),
    }
}

/// Parses a comma-separated list such as `1066981,361300,250000,100000`.
pub fn parse_amounts(raw: &str) -> Result<Vec<f64>, AppError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<f64>()
                .map_err(|e| AppError::Validation(format!("invalid amount {part:?}: {e}")))
        })
        .collect()
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = non_empty(&lookup, "PRICE_API_BASE_URL")
            .unwrap_or_else(|| yahoo::DEFAULT_BASE_URL.to_string());
        url::Url::parse(&base_url)
            .map_err(|e| AppError::Config(format!("PRICE_API_BASE_URL is invalid: {e}")))?;

        let price = PriceConfig {
            symbol: non_empty(&lookup, "INDEX_SYMBOL")
                .unwrap_or_else(|| DEFAULT_INDEX_SYMBOL.to_string()),
            exchange_rate: parse_or(&lookup, "EXCHANGE_RATE", DEFAULT_EXCHANGE_RATE)?,
            base_url,
            retries: parse_or(&lookup, "PRICE_FETCH_RETRIES", DEFAULT_FETCH_RETRIES)?,
            delay: Duration::from_secs(parse_or(
                &lookup,
                "PRICE_FETCH_DELAY_SECS",
                DEFAULT_FETCH_DELAY_SECS,
            )?),
            timeout: Duration::from_secs(parse_or(
                &lookup,
                "PRICE_FETCH_TIMEOUT_SECS",
                DEFAULT_FETCH_TIMEOUT_SECS,
            )?),
        };
        if price.retries == 0 {
            return Err(AppError::Config("PRICE_FETCH_RETRIES must be at least 1".into()));
        }

        let seed_amounts = non_empty(&lookup, "SEED_AMOUNTS")
            .map(|raw| parse_amounts(&raw))
            .transpose()
            .map_err(|e| AppError::Config(format!("SEED_AMOUNTS: {e}")))?;

        Ok(Self {
            host: parse_or(&lookup, "HOST", IpAddr::V4(Ipv4Addr::UNSPECIFIED))?,
            port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
            database_url: non_empty(&lookup, "DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            currency_symbol: non_empty(&lookup, "CURRENCY_SYMBOL")
                .unwrap_or_else(|| DEFAULT_CURRENCY_SYMBOL.to_string()),
            price,
            seed_amounts,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl AuthConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret_key = non_empty(&lookup, "SECRET_KEY")
            .ok_or_else(|| AppError::Config("SECRET_KEY must be set".into()))?;

        let password_hash = non_empty(&lookup, "LOGIN_PASSWORD_HASH");
        let password = lookup("LOGIN_PASSWORD").filter(|v| !v.is_empty());
        if password_hash.is_none() && password.is_none() {
            return Err(AppError::Config(
                "either LOGIN_PASSWORD_HASH or LOGIN_PASSWORD must be set".into(),
            ));
        }

        let ttl_hours: i64 = parse_or(&lookup, "SESSION_TTL_HOURS", DEFAULT_SESSION_TTL_HOURS)?;
        if ttl_hours <= 0 {
            return Err(AppError::Config("SESSION_TTL_HOURS must be positive".into()));
        }

        Ok(Self {
            password_hash,
            password,
            secret_key,
            previous_secret_key: non_empty(&lookup, "SECRET_KEY_PREVIOUS"),
            session_ttl: chrono::Duration::hours(ttl_hours),
        })
    }
}
