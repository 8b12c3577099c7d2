use std::fmt;
use std::str::FromStr;
use std::time::Duration as StdDuration;

use chrono::Duration;

use crate::errors::AppError;
use crate::password::PasswordPolicy;
use crate::ratelimit::RateLimitConfig;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

/// Process configuration, read from the environment after `.env` is loaded.
#[derive(Clone)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub port: u16,
    pub rate_limit: RateLimitConfig,
    pub password_policy: PasswordPolicy,
    pub sweep_interval: StdDuration,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("jwt_secret", &"<redacted>")
            .field("port", &self.port)
            .field("rate_limit", &self.rate_limit)
            .field("password_policy", &self.password_policy)
            .field("sweep_interval", &self.sweep_interval)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes `std::env::var`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|secret| !secret.is_empty())
            .ok_or_else(|| AppError::configuration("JWT_SECRET not set"))?;

        let defaults = RateLimitConfig::api_general();
        let max_requests = parse_or(&lookup, "RATE_LIMIT_MAX_REQUESTS", defaults.max_requests)?;
        let window_secs = parse_or(&lookup, "RATE_LIMIT_WINDOW_SECS", defaults.window.num_seconds())?;
        if window_secs <= 0 {
            return Err(AppError::configuration("RATE_LIMIT_WINDOW_SECS must be positive"));
        }

        let min_length = parse_or(&lookup, "PASSWORD_MIN_LENGTH", PasswordPolicy::default().min_length)?;
        let sweep_secs = parse_or(&lookup, "STORE_SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL_SECS)?;

        Ok(Self {
            jwt_secret,
            port: parse_or(&lookup, "APP_PORT", DEFAULT_PORT)?,
            rate_limit: RateLimitConfig::new(max_requests, Duration::seconds(window_secs)),
            password_policy: PasswordPolicy::with_min_length(min_length),
            sweep_interval: StdDuration::from_secs(sweep_secs.max(1)),
        })
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|_| AppError::configuration(format!("{key} must be a number, got {raw:?}"))),
        _ => Ok(default),
    }
}
