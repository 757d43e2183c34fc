//! Process-wide configuration.
//!
//! Everything the service needs from the environment is read exactly once, in
//! [`Config::from_env`], and handed out by reference afterwards. No other module
//! calls `std::env::var`.

use jsonwebtoken::Algorithm;
use std::env;
use std::str::FromStr;
use thiserror::Error;

/// Default bcrypt work factor.
pub const DEFAULT_BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;
/// Bounds accepted by bcrypt for the work factor.
pub const BCRYPT_COST_RANGE: std::ops::RangeInclusive<u32> = 4..=31;

/// Upper bound on token lifetime: one hundred years.
pub const MAX_JWT_TTL_MINUTES: i64 = 100 * 366 * 24 * 60;

/// Errors raised while assembling [`Config`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub server_port: u16,
    pub server_host: String,
    pub jwt: JwtConfig,
    pub bcrypt_cost: u32,
    pub admin: AdminSeed,
    /// `None` when Yandex OAuth is not set up.
    pub yandex: Option<YandexConfig>,
}

/// Signing parameters for session tokens.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    pub ttl_minutes: i64,
}

/// Credentials of the admin account guaranteed to exist at startup.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YandexConfig {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
}

impl Config {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = non_empty("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let secret = non_empty("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let algorithm = parse_or("JWT_ALGORITHM", non_empty("JWT_ALGORITHM"), Algorithm::HS256)?;
        if !matches!(
            algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(ConfigError::Invalid {
                var: "JWT_ALGORITHM",
                reason: format!("{algorithm:?} is not an HMAC algorithm"),
            });
        }

        let ttl_minutes: i64 = parse_or("JWT_TTL_MINUTES", non_empty("JWT_TTL_MINUTES"), 1440)?;
        if ttl_minutes <= 0 || ttl_minutes > MAX_JWT_TTL_MINUTES {
            return Err(ConfigError::Invalid {
                var: "JWT_TTL_MINUTES",
                reason: format!("must be between 1 and {}", MAX_JWT_TTL_MINUTES),
            });
        }

        let bcrypt_cost = parse_or("BCRYPT_COST", non_empty("BCRYPT_COST"), DEFAULT_BCRYPT_COST)?;
        if !BCRYPT_COST_RANGE.contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                var: "BCRYPT_COST",
                reason: format!(
                    "must be between {} and {}",
                    BCRYPT_COST_RANGE.start(),
                    BCRYPT_COST_RANGE.end()
                ),
            });
        }

        let yandex = non_empty("YANDEX_CLIENT_ID").map(|client_id| YandexConfig {
            client_id,
            client_secret: non_empty("YANDEX_CLIENT_SECRET"),
            redirect_uri: non_empty("YANDEX_REDIRECT_URI")
                .unwrap_or_else(|| "http://localhost:5173/".to_string()),
        });

        Ok(Self {
            database_url,
            database_max_connections: parse_or(
                "DATABASE_MAX_CONNECTIONS",
                non_empty("DATABASE_MAX_CONNECTIONS"),
                10,
            )?,
            server_port: parse_or("SERVER_PORT", non_empty("SERVER_PORT"), 8080)?,
            server_host: non_empty("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            jwt: JwtConfig {
                secret,
                algorithm,
                ttl_minutes,
            },
            bcrypt_cost,
            admin: AdminSeed {
                username: non_empty("ADMIN_USERNAME").unwrap_or_else(|| "admin".to_string()),
                password: non_empty("ADMIN_PASSWORD").unwrap_or_else(|| "admin123".to_string()),
            },
            yandex,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

fn parse_or<T>(var: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
