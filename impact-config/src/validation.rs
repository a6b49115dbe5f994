use thiserror::Error;

use super::models::{ImpactConfig, NormalizationConfig, PollConfig, RetryConfig};

#[derive(Debug, Error)]
pub enum ConfigGuardRailError {
    #[error("retry.max_attempts must be at least 1")]
    ZeroRetryAttempts,
    #[error("poll.interval must be greater than zero")]
    ZeroPollInterval,
    #[error(
        "poll loop is unbounded: set poll.max_attempts or poll.deadline"
    )]
    UnboundedPolling,
    #[error("normalization.tolerance must be within (0, 1), got {0}")]
    InvalidTolerance(f64),
    #[error("normalization.max_default_activities must be at least 1")]
    ZeroDefaultActivities,
    #[error("{field} must use http or https, got `{scheme}`")]
    UnsupportedScheme { field: &'static str, scheme: String },
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn mentions(&self, needle: &str) -> bool {
        self.items.iter().any(|w| w.message.contains(needle))
    }
}

pub fn apply_guard_rails(
    config: &ImpactConfig,
) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();

    check_scheme("api.base_url", config.api.base_url.scheme())?;
    if let Some(abaca) = &config.abaca {
        check_scheme("abaca.base_url", abaca.base_url.scheme())?;
        if !abaca.base_url.path().ends_with('/') {
            warnings.push_with_hint(
                "ABACA_BASE_URL has no trailing slash; its last path segment will be replaced on join",
                "Append '/' to the Abaca base URL",
            );
        }
    }

    match &config.api.api_key {
        None => warnings.push_with_hint(
            "VESTED_API_KEY not set; every remote call will be refused",
            "Export VESTED_API_KEY or set api.api_key in the config file",
        ),
        Some(key) if key.is_blank() => warnings.push_with_hint(
            "VESTED_API_KEY is blank",
            "Provide the API key issued for your account",
        ),
        Some(_) => {}
    }

    check_retry(&config.retry, &mut warnings)?;
    check_poll(&config.poll, &mut warnings)?;
    check_normalization(&config.normalization)?;

    Ok(warnings)
}

fn check_scheme(
    field: &'static str,
    scheme: &str,
) -> Result<(), ConfigGuardRailError> {
    if scheme == "http" || scheme == "https" {
        Ok(())
    } else {
        Err(ConfigGuardRailError::UnsupportedScheme {
            field,
            scheme: scheme.to_string(),
        })
    }
}

fn check_retry(
    retry: &RetryConfig,
    warnings: &mut ConfigWarnings,
) -> Result<(), ConfigGuardRailError> {
    if retry.max_attempts == 0 {
        return Err(ConfigGuardRailError::ZeroRetryAttempts);
    }

    // 400 is rarely transient; it stays configurable so the historical
    // behaviour can be reproduced, but it is flagged every time.
    if retry.retry_on.contains(400) {
        warnings.push_with_hint(
            "retry set includes 400 Bad Request; malformed requests will be resent",
            "Set IMPACT_RETRY_STATUSES=429,500,503,504 to stop retrying client errors",
        );
    }

    if retry.retry_on.is_empty() && retry.max_attempts > 1 {
        warnings.push(
            "retry set is empty; only network failures will be retried",
        );
    }

    Ok(())
}

fn check_poll(
    poll: &PollConfig,
    warnings: &mut ConfigWarnings,
) -> Result<(), ConfigGuardRailError> {
    if poll.interval.is_zero() {
        return Err(ConfigGuardRailError::ZeroPollInterval);
    }
    if poll.max_attempts.is_none() && poll.deadline.is_none() {
        return Err(ConfigGuardRailError::UnboundedPolling);
    }
    if poll.max_attempts == Some(0) {
        warnings.push(
            "poll.max_attempts is 0; every calculation will time out immediately",
        );
    }
    if let Some(deadline) = poll.deadline
        && deadline < poll.interval
    {
        warnings.push_with_hint(
            "poll.deadline is shorter than poll.interval; no status read fits in the budget",
            "Raise IMPACT_POLL_DEADLINE or lower IMPACT_POLL_INTERVAL",
        );
    }
    Ok(())
}

fn check_normalization(
    normalization: &NormalizationConfig,
) -> Result<(), ConfigGuardRailError> {
    let tolerance = normalization.tolerance;
    if !(tolerance.is_finite() && tolerance > 0.0 && tolerance < 1.0) {
        return Err(ConfigGuardRailError::InvalidTolerance(tolerance));
    }
    if normalization.max_default_activities == 0 {
        return Err(ConfigGuardRailError::ZeroDefaultActivities);
    }
    Ok(())
}
