//! Layered configuration loading: defaults, TOML file, then environment.

pub mod error;
mod file;

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use url::Url;

use self::error::ConfigLoadError;
use self::file::FileConfig;
use crate::constants::*;
use crate::models::{AbacaConfig, ImpactConfig, RetryStatusSet, Secret};
use crate::validation::{ConfigWarnings, apply_guard_rails};

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Result of a successful load.
#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: ImpactConfig,
    pub warnings: ConfigWarnings,
    /// The TOML file that contributed, if any.
    pub file: Option<PathBuf>,
}

/// Builder for [`ConfigLoad`].
///
/// Environment access goes through an injectable lookup so callers (and
/// tests) never need to mutate the process environment.
#[derive(Clone)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    env: EnvLookup,
    dotenv: HashMap<String, String>,
}

impl fmt::Debug for ConfigLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigLoader")
            .field("file", &self.file)
            .field("dotenv_keys", &self.dotenv.len())
            .finish()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Loader reading the real process environment.
    pub fn new() -> Self {
        Self {
            file: None,
            env: Arc::new(|key| std::env::var(key).ok()),
            dotenv: HashMap::new(),
        }
    }

    /// Loader reading only from the supplied map.
    pub fn from_env_map(map: HashMap<String, String>) -> Self {
        Self::new().with_env_lookup(move |key| map.get(key).cloned())
    }

    pub fn with_env_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Arc::new(lookup);
        self
    }

    /// Use an explicit TOML file instead of `IMPACT_CONFIG_PATH`.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Read a `.env` file as a fallback layer beneath the environment.
    /// A missing file is not an error.
    pub fn with_dotenv(
        mut self,
        path: impl AsRef<Path>,
    ) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(self);
        }
        for item in dotenvy::from_path_iter(path)? {
            let (key, value) = item?;
            self.dotenv.insert(key, value);
        }
        debug!(path = %path.display(), keys = self.dotenv.len(), "loaded dotenv file");
        Ok(self)
    }

    fn var(&self, key: &str) -> Option<String> {
        (self.env)(key)
            .or_else(|| self.dotenv.get(key).cloned())
            .filter(|v| !v.trim().is_empty())
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let mut config = ImpactConfig::default();
        let mut warnings = ConfigWarnings::default();

        let file = self
            .file
            .clone()
            .or_else(|| self.var(ENV_CONFIG_PATH).map(PathBuf::from));
        if let Some(path) = &file {
            let parsed = read_file(path)?;
            apply_file(&mut config, parsed, &mut warnings)?;
            debug!(path = %path.display(), "applied config file");
        }

        self.apply_env(&mut config, &mut warnings)?;

        let guard_warnings = apply_guard_rails(&config)?;
        warnings.items.extend(guard_warnings.items);

        Ok(ConfigLoad {
            config,
            warnings,
            file,
        })
    }

    fn apply_env(
        &self,
        config: &mut ImpactConfig,
        warnings: &mut ConfigWarnings,
    ) -> Result<(), ConfigLoadError> {
        if let Some(raw) = self.var(ENV_BASE_URL) {
            config.api.base_url = parse_url(ENV_BASE_URL, &raw)?;
        }
        if let Some(raw) = self.var(ENV_API_KEY) {
            config.api.api_key = Some(Secret::new(raw));
        }
        if let Some(raw) = self.var(ENV_REQUEST_TIMEOUT) {
            config.api.request_timeout =
                parse_duration(ENV_REQUEST_TIMEOUT, &raw)?;
        }

        if let Some(raw) = self.var(ENV_RETRY_MAX_ATTEMPTS) {
            config.retry.max_attempts =
                parse_number(ENV_RETRY_MAX_ATTEMPTS, &raw)?;
        }
        if let Some(raw) = self.var(ENV_RETRY_BASE_DELAY) {
            config.retry.base_delay =
                parse_duration(ENV_RETRY_BASE_DELAY, &raw)?;
        }
        if let Some(raw) = self.var(ENV_RETRY_STATUSES) {
            config.retry.retry_on = raw.parse::<RetryStatusSet>().map_err(
                |reason| ConfigLoadError::InvalidValue {
                    key: ENV_RETRY_STATUSES,
                    value: raw.clone(),
                    reason,
                },
            )?;
        }

        if let Some(raw) = self.var(ENV_POLL_INTERVAL) {
            config.poll.interval = parse_duration(ENV_POLL_INTERVAL, &raw)?;
        }
        if let Some(raw) = self.var(ENV_POLL_MAX_ATTEMPTS) {
            config.poll.max_attempts =
                parse_optional(ENV_POLL_MAX_ATTEMPTS, &raw, parse_number)?;
        }
        if let Some(raw) = self.var(ENV_POLL_DEADLINE) {
            config.poll.deadline =
                parse_optional(ENV_POLL_DEADLINE, &raw, parse_duration)?;
        }

        if let Some(raw) = self.var(ENV_WEIGHT_TOLERANCE) {
            config.normalization.tolerance =
                parse_number(ENV_WEIGHT_TOLERANCE, &raw)?;
        }
        if let Some(raw) = self.var(ENV_DEFAULT_ACTIVITIES) {
            config.normalization.max_default_activities =
                parse_number(ENV_DEFAULT_ACTIVITIES, &raw)?;
        }
        if let Some(raw) = self.var(ENV_UNKNOWN_ACTIVITY_POLICY) {
            config.normalization.unknown_activity =
                raw.parse().map_err(|err: impact_model::ModelError| {
                    ConfigLoadError::InvalidValue {
                        key: ENV_UNKNOWN_ACTIVITY_POLICY,
                        value: raw.clone(),
                        reason: err.to_string(),
                    }
                })?;
        }
        if let Some(raw) = self.var(ENV_INDUSTRY_FALLBACK) {
            config.normalization.industry_activity_fallback =
                parse_bool(ENV_INDUSTRY_FALLBACK, &raw)?;
        }

        let abaca_url = self.var(ENV_ABACA_BASE_URL);
        let abaca_token = self.var(ENV_ABACA_TOKEN);
        match (abaca_url, abaca_token) {
            (Some(url), Some(token)) => {
                config.abaca = Some(AbacaConfig {
                    base_url: parse_url(ENV_ABACA_BASE_URL, &url)?,
                    token: Secret::new(token),
                });
            }
            (Some(url), None) => {
                if let Some(abaca) = config.abaca.as_mut() {
                    abaca.base_url = parse_url(ENV_ABACA_BASE_URL, &url)?;
                } else {
                    warnings.push_with_hint(
                        "ABACA_BASE_URL set without ABACA_API_TOKEN; Abaca source disabled",
                        "Export ABACA_API_TOKEN alongside ABACA_BASE_URL",
                    );
                }
            }
            (None, Some(token)) => {
                if let Some(abaca) = config.abaca.as_mut() {
                    abaca.token = Secret::new(token);
                } else {
                    warnings.push(
                        "ABACA_API_TOKEN set without ABACA_BASE_URL; Abaca source disabled",
                    );
                }
            }
            (None, None) => {}
        }

        Ok(())
    }
}

fn read_file(path: &Path) -> Result<FileConfig, ConfigLoadError> {
    let raw =
        fs::read_to_string(path).map_err(|source| ConfigLoadError::FileIo {
            path: path.to_path_buf(),
            source,
        })?;
    toml::from_str(&raw).map_err(|source| ConfigLoadError::FileParse {
        path: path.to_path_buf(),
        source,
    })
}

fn apply_file(
    config: &mut ImpactConfig,
    file: FileConfig,
    warnings: &mut ConfigWarnings,
) -> Result<(), ConfigLoadError> {
    if let Some(raw) = file.api.base_url {
        config.api.base_url = parse_url("api.base_url", &raw)?;
    }
    if let Some(raw) = file.api.api_key {
        warnings.push_with_hint(
            "API key stored in the config file",
            "Prefer VESTED_API_KEY in the environment for credentials",
        );
        config.api.api_key = Some(Secret::new(raw));
    }
    if let Some(raw) = file.api.request_timeout {
        config.api.request_timeout =
            parse_duration("api.request_timeout", &raw)?;
    }

    if let Some(attempts) = file.retry.max_attempts {
        config.retry.max_attempts = attempts;
    }
    if let Some(raw) = file.retry.base_delay {
        config.retry.base_delay = parse_duration("retry.base_delay", &raw)?;
    }
    if let Some(codes) = file.retry.retry_on {
        config.retry.retry_on = RetryStatusSet::new(codes);
    }

    if let Some(raw) = file.poll.interval {
        config.poll.interval = parse_duration("poll.interval", &raw)?;
    }
    if let Some(attempts) = file.poll.max_attempts {
        config.poll.max_attempts = Some(attempts);
    }
    if let Some(raw) = file.poll.deadline {
        config.poll.deadline =
            parse_optional("poll.deadline", &raw, parse_duration)?;
    }

    let normalization = file.normalization;
    if let Some(tolerance) = normalization.tolerance {
        config.normalization.tolerance = tolerance;
    }
    if let Some(max) = normalization.max_default_activities {
        config.normalization.max_default_activities = max;
    }
    if let Some(policy) = normalization.unknown_activity {
        config.normalization.unknown_activity = policy;
    }
    if let Some(fallback) = normalization.industry_activity_fallback {
        config.normalization.industry_activity_fallback = fallback;
    }

    if let Some(abaca) = file.abaca {
        match (abaca.base_url, abaca.token) {
            (Some(url), Some(token)) => {
                config.abaca = Some(AbacaConfig {
                    base_url: parse_url("abaca.base_url", &url)?,
                    token: Secret::new(token),
                });
            }
            _ => warnings.push(
                "[abaca] section needs both base_url and token; ignoring it",
            ),
        }
    }

    Ok(())
}

fn parse_url(key: &'static str, raw: &str) -> Result<Url, ConfigLoadError> {
    Url::parse(raw.trim())
        .map_err(|source| ConfigLoadError::InvalidUrl { key, source })
}

fn parse_duration(
    key: &'static str,
    raw: &str,
) -> Result<Duration, ConfigLoadError> {
    humantime::parse_duration(raw.trim()).map_err(|err| {
        ConfigLoadError::InvalidValue {
            key,
            value: raw.to_string(),
            reason: err.to_string(),
        }
    })
}

fn parse_number<T>(key: &'static str, raw: &str) -> Result<T, ConfigLoadError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|err| ConfigLoadError::InvalidValue {
            key,
            value: raw.to_string(),
            reason: err.to_string(),
        })
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigLoadError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigLoadError::InvalidValue {
            key,
            value: raw.to_string(),
            reason: "expected true/false".into(),
        }),
    }
}

/// `off`/`none` disable an optional bound.
fn parse_optional<T>(
    key: &'static str,
    raw: &str,
    parse: fn(&'static str, &str) -> Result<T, ConfigLoadError>,
) -> Result<Option<T>, ConfigLoadError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "off" | "none" => Ok(None),
        _ => parse(key, raw).map(Some),
    }
}
