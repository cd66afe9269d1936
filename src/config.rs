use regex::Regex;
use serde::Deserialize;
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, Write};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::constants::{
    BASE_URL_ENV, COMPLETE_SETUP, DEBOUNCE_DELAY_MS, DEFAULT_BASE_URL, ENTER_BASE_URL,
    REQUEST_TIMEOUT_SECS, STALE_TIME_SECS,
};
use crate::external_api::ApiError;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Url of the tags API
    pub base_url: String,
    /// How long the search text must stay unchanged before it is used
    pub debounce_ms: u64,
    /// How long a fetched page is served without asking the server again
    pub stale_time_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            debounce_ms: DEBOUNCE_DELAY_MS,
            stale_time_secs: STALE_TIME_SECS,
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Create the application config by asking the user for the API url
    pub fn new<R, W>(mut input: R, mut output: W) -> Result<Self, ApiError>
    where
        R: BufRead,
        W: Write,
    {
        output.write_all(ENTER_BASE_URL.as_bytes())?;
        output.flush()?;
        let mut base_url = String::new();
        input.read_line(&mut base_url)?;
        let base_url = validate_url(base_url.trim().to_string())?;
        writeln!(output, "{}", COMPLETE_SETUP)?;

        Ok(Self { base_url, ..Self::default() })
    }

    /// Read the config file
    pub fn get_config(path_to_config: &Path) -> Result<Self, ApiError> {
        let not_read = |error: String| {
            ApiError::NotReadConfig(path_to_config.display().to_string(), error)
        };
        let file = File::open(path_to_config).map_err(|e| not_read(e.to_string()))?;
        let mut config: Self = serde_json::from_reader(file).map_err(|e| not_read(e.to_string()))?;
        config.base_url = validate_url(config.base_url)?;
        Ok(config)
    }

    /// Config file if it exists, defaults otherwise
    pub fn load_or_default(path_to_config: &Path) -> Result<Self, ApiError> {
        if !path_to_config.exists() {
            debug!(path = %path_to_config.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::get_config(path_to_config)
    }

    /// Env `TAGVIEW_BASE_URL` and then `--base-url` take precedence over the file
    pub fn with_overrides(mut self, env_base_url: Option<String>, base_url: Option<String>) -> Result<Self, ApiError> {
        if let Some(value) = env_base_url.filter(|value| !value.trim().is_empty()) {
            self.base_url = validate_url(value)?;
        }
        if let Some(value) = base_url {
            self.base_url = validate_url(value)?;
        }
        Ok(self)
    }

    pub fn env_base_url() -> Option<String> {
        std::env::var(BASE_URL_ENV).ok()
    }

    pub fn save(&self, path_to_config: &Path) -> Result<(), ApiError> {
        if let Some(parent) = path_to_config.parent() {
            std::fs::create_dir_all(parent).map_err(|_| ApiError::CantCreateConfig)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path_to_config, content).map_err(|_| ApiError::CantCreateConfig)
    }

    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn stale_time(&self) -> Duration {
        Duration::from_secs(self.stale_time_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// The entered string must be a URL
pub fn validate_url(mut value: String) -> Result<String, ApiError> {
    let regex = Regex::new(r"^https?://.+$").map_err(|e| ApiError::Parse(e.to_string()))?;
    if !regex.is_match(&value) {
        return Err(ApiError::InvalidUrl);
    }
    if value.ends_with('/') {
        value.pop();
    }
    Ok(value)
}
