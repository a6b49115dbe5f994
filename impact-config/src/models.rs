use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use impact_model::UnknownActivityPolicy;
use url::Url;
use zeroize::Zeroizing;

use crate::constants::*;

/// Credential wrapper that wipes its buffer on drop and never prints.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(Zeroizing<String>);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct ImpactConfig {
    pub api: ApiConfig,
    pub retry: RetryConfig,
    pub poll: PollConfig,
    pub normalization: NormalizationConfig,
    /// Upstream Abaca source; `None` when not configured.
    pub abaca: Option<AbacaConfig>,
}

impl Default for ImpactConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            retry: RetryConfig::default(),
            poll: PollConfig::default(),
            normalization: NormalizationConfig::default(),
            abaca: None,
        }
    }
}

/// Remote scoring service endpoint and credential.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Versioned base URL, e.g. `https://api.vestedimpact.co.uk/v2`.
    pub base_url: Url,
    /// Static credential sent as the `api-key` header. Absence is only
    /// fatal once a client is built.
    pub api_key: Option<Secret>,
    pub request_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).expect("default base URL is a valid URL")
}

/// HTTP status codes that make the transport retry a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryStatusSet(BTreeSet<u16>);

impl RetryStatusSet {
    pub fn new(codes: impl IntoIterator<Item = u16>) -> Self {
        Self(codes.into_iter().collect())
    }

    pub fn contains(&self, status: u16) -> bool {
        self.0.contains(&status)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.0.iter().copied()
    }
}

impl Default for RetryStatusSet {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_STATUSES)
    }
}

impl fmt::Display for RetryStatusSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(u16::to_string)
            .collect::<Vec<_>>()
            .join(",");
        f.write_str(&joined)
    }
}

impl FromStr for RetryStatusSet {
    type Err = String;

    /// Parses a comma separated list such as `429,500,503`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut codes = BTreeSet::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let code: u16 = part
                .parse()
                .map_err(|_| format!("`{part}` is not an HTTP status code"))?;
            if !(100..=599).contains(&code) {
                return Err(format!("{code} is outside the HTTP status range"));
            }
            codes.insert(code);
        }
        Ok(Self(codes))
    }
}

/// Transport retry policy. Delays grow linearly: the wait after failed
/// attempt `n` (1-based) is `n * base_delay`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub retry_on: RetryStatusSet,
}

impl RetryConfig {
    pub fn delay_for(&self, failed_attempt: u32) -> Duration {
        self.base_delay.saturating_mul(failed_attempt.max(1))
    }

    /// A policy that never retries.
    pub fn single_attempt() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_RETRY_MAX_ATTEMPTS,
            base_delay: DEFAULT_RETRY_BASE_DELAY,
            retry_on: RetryStatusSet::default(),
        }
    }
}

/// Bounds for the status polling loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollConfig {
    /// Sleep before every status read.
    pub interval: Duration,
    /// Maximum number of status reads.
    pub max_attempts: Option<u32>,
    /// Wall-clock budget for the whole loop.
    pub deadline: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: Some(DEFAULT_POLL_MAX_ATTEMPTS),
            deadline: Some(DEFAULT_POLL_DEADLINE),
        }
    }
}

/// Breakdown and holdings normalization knobs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizationConfig {
    /// Allowed absolute deviation of a weight sum from 1.0.
    pub tolerance: f64,
    /// Suggestions used when synthesizing a default breakdown.
    pub max_default_activities: usize,
    pub unknown_activity: UnknownActivityPolicy,
    /// Use the industry's published activities when the create step
    /// returned no suggestions.
    pub industry_activity_fallback: bool,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_WEIGHT_TOLERANCE,
            max_default_activities: DEFAULT_MAX_DEFAULT_ACTIVITIES,
            unknown_activity: UnknownActivityPolicy::default(),
            industry_activity_fallback: false,
        }
    }
}

/// Upstream Abaca platform credentials. The base URL keeps its trailing
/// slash so relative joins stay under it.
#[derive(Debug, Clone)]
pub struct AbacaConfig {
    pub base_url: Url,
    pub token: Secret,
}
