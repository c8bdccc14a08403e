use crate::error::{AppError, Result};
use crate::utils;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Runtime configuration, read from the environment once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Upstream API credential, passed as the `token` query parameter.
    pub api_token: String,
    pub port: u16,
    /// Age below which a cached snapshot is served without refreshing.
    pub cache_ttl: Duration,
    /// Minimum spacing between consecutive upstream dispatches.
    pub request_delay: Duration,
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Per-HTTP-call timeout.
    pub http_timeout: Duration,
    pub cache_file: PathBuf,
    pub sector_map_file: Option<PathBuf>,
    /// Interval for the background warm worker; `None` disables it.
    pub warm_interval: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let api_token = std::env::var("SECTORPULSE_API_TOKEN")
            .map_err(|_| AppError::Config("SECTORPULSE_API_TOKEN is not set".to_string()))?;

        let warm_secs: u64 = env_parsed("WARM_INTERVAL_SECS", 0)?;

        Ok(Self {
            api_token,
            port: env_parsed("PORT", 3001)?,
            cache_ttl: Duration::from_secs(env_parsed("CACHE_TTL_SECS", 900)?),
            request_delay: Duration::from_millis(env_parsed("REQUEST_DELAY_MS", 1100)?),
            max_retries: env_parsed("MAX_RETRIES", 5)?,
            initial_backoff: Duration::from_millis(env_parsed("INITIAL_BACKOFF_MS", 2000)?),
            max_backoff: Duration::from_millis(env_parsed("MAX_BACKOFF_MS", 32000)?),
            http_timeout: Duration::from_secs(env_parsed("HTTP_TIMEOUT_SECS", 10)?),
            cache_file: utils::get_cache_file(),
            sector_map_file: utils::get_sector_map_file(),
            warm_interval: (warm_secs > 0).then(|| Duration::from_secs(warm_secs)),
        })
    }
}

fn env_parsed<T: FromStr>(name: &str, default: T) -> Result<T> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("Invalid value for {}: {}", name, raw))),
        Err(_) => Ok(default),
    }
}
