//! Backend configuration.
//!
//! Values are read from the environment (a `.env` file in the working directory is loaded first
//! by the cli) or from an explicit env file:
//! - `DAYPIE_BACKEND_URL`: base url of the backend, e.g. `https://project.supabase.co`
//! - `DAYPIE_API_KEY`: key sent with every request
//! - `DAYPIE_TABLE`: table holding activities, `activities` by default
//! - `DAYPIE_POLL_INTERVAL_SECS`: how often subscriptions check for changes, 5 by default
//! - `DAYPIE_HTTP_TIMEOUT_SECS`: request timeout, 30 by default

use std::{collections::HashMap, path::Path, time::Duration};

use anyhow::{anyhow, bail, Context, Result};

use crate::repository::watch::DEFAULT_POLL_INTERVAL;

pub const URL_VAR: &str = "DAYPIE_BACKEND_URL";
pub const KEY_VAR: &str = "DAYPIE_API_KEY";
pub const TABLE_VAR: &str = "DAYPIE_TABLE";
pub const POLL_INTERVAL_VAR: &str = "DAYPIE_POLL_INTERVAL_SECS";
pub const HTTP_TIMEOUT_VAR: &str = "DAYPIE_HTTP_TIMEOUT_SECS";

const DEFAULT_TABLE: &str = "activities";
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub url: String,
    pub api_key: String,
    pub table: String,
    pub poll_interval: Duration,
    pub http_timeout: Duration,
}

impl BackendConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration from a dotenv formatted file without touching the process environment.
    pub fn from_env_file(path: &Path) -> Result<Self> {
        let values = dotenvy::from_path_iter(path)
            .with_context(|| format!("Failed to open env file {path:?}"))?
            .collect::<Result<HashMap<_, _>, _>>()
            .with_context(|| format!("Failed to parse env file {path:?}"))?;
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |name: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow!("{name} is not set"))
        };
        let seconds = |name: &str, default: Duration| -> Result<Duration> {
            let Some(v) = lookup(name) else {
                return Ok(default);
            };
            let seconds = v
                .trim()
                .parse::<u64>()
                .with_context(|| format!("Can't parse {name}={v} as seconds"))?;
            if seconds == 0 {
                bail!("{name} must be at least one second");
            }
            Ok(Duration::from_secs(seconds))
        };

        Ok(Self {
            url: required(URL_VAR)?,
            api_key: required(KEY_VAR)?,
            table: lookup(TABLE_VAR).unwrap_or_else(|| DEFAULT_TABLE.into()),
            poll_interval: seconds(POLL_INTERVAL_VAR, DEFAULT_POLL_INTERVAL)?,
            http_timeout: seconds(HTTP_TIMEOUT_VAR, DEFAULT_HTTP_TIMEOUT)?,
        })
    }

    pub fn with_overrides(self, url: Option<String>, api_key: Option<String>) -> Self {
        Self {
            url: url.unwrap_or(self.url),
            api_key: api_key.unwrap_or(self.api_key),
            ..self
        }
    }
}
