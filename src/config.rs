//! Runtime settings, read from the environment (and an optional `.env` file).

use std::time::Duration;

use crate::error::AppError;

pub const DEFAULT_INDICATOR_BASE_URL: &str = "https://mindicador.cl/api";
pub const DEFAULT_SEISMIC_BASE_URL: &str = "https://api.gael.cloud/general/public/sismos";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

pub const INDICATOR_TIMEOUT: Duration = Duration::from_secs(10);
pub const SEISMIC_TIMEOUT: Duration = Duration::from_secs(15);

const ENV_INDICATOR_BASE_URL: &str = "DVC_INDICATOR_BASE_URL";
const ENV_SEISMIC_BASE_URL: &str = "DVC_SEISMIC_BASE_URL";
const ENV_CACHE_TTL_SECS: &str = "DVC_CACHE_TTL_SECS";
const ENV_FAILURE_TTL_SECS: &str = "DVC_FAILURE_TTL_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub indicator_base_url: String,
    pub seismic_base_url: String,
    /// How long a successful fetch stays cached.
    pub cache_ttl: Duration,
    /// How long a failed fetch stays cached. Defaults to `cache_ttl`.
    pub failure_ttl: Duration,
    pub indicator_timeout: Duration,
    pub seismic_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            indicator_base_url: DEFAULT_INDICATOR_BASE_URL.to_string(),
            seismic_base_url: DEFAULT_SEISMIC_BASE_URL.to_string(),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            failure_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            indicator_timeout: INDICATOR_TIMEOUT,
            seismic_timeout: SEISMIC_TIMEOUT,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup (environment, map, ...).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let indicator_base_url = non_empty(ENV_INDICATOR_BASE_URL).unwrap_or(defaults.indicator_base_url);
        let seismic_base_url = non_empty(ENV_SEISMIC_BASE_URL).unwrap_or(defaults.seismic_base_url);

        let cache_ttl = match non_empty(ENV_CACHE_TTL_SECS) {
            Some(raw) => parse_secs(ENV_CACHE_TTL_SECS, &raw)?,
            None => defaults.cache_ttl,
        };
        let failure_ttl = match non_empty(ENV_FAILURE_TTL_SECS) {
            Some(raw) => parse_secs(ENV_FAILURE_TTL_SECS, &raw)?,
            None => cache_ttl,
        };

        Ok(Self {
            indicator_base_url,
            seismic_base_url,
            cache_ttl,
            failure_ttl,
            indicator_timeout: defaults.indicator_timeout,
            seismic_timeout: defaults.seismic_timeout,
        })
    }
}

fn parse_secs(key: &str, raw: &str) -> Result<Duration, AppError> {
    raw.parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| AppError::config(format!("Invalid {key} '{raw}': {e}")))
}
