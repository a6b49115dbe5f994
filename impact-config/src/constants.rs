//! Environment keys and built-in defaults.

use std::time::Duration;

pub const ENV_API_KEY: &str = "VESTED_API_KEY";
pub const ENV_BASE_URL: &str = "VESTED_BASE_URL";
pub const ENV_REQUEST_TIMEOUT: &str = "IMPACT_REQUEST_TIMEOUT";
pub const ENV_CONFIG_PATH: &str = "IMPACT_CONFIG_PATH";

pub const ENV_RETRY_MAX_ATTEMPTS: &str = "IMPACT_RETRY_MAX_ATTEMPTS";
pub const ENV_RETRY_BASE_DELAY: &str = "IMPACT_RETRY_BASE_DELAY";
pub const ENV_RETRY_STATUSES: &str = "IMPACT_RETRY_STATUSES";

pub const ENV_POLL_INTERVAL: &str = "IMPACT_POLL_INTERVAL";
pub const ENV_POLL_MAX_ATTEMPTS: &str = "IMPACT_POLL_MAX_ATTEMPTS";
pub const ENV_POLL_DEADLINE: &str = "IMPACT_POLL_DEADLINE";

pub const ENV_WEIGHT_TOLERANCE: &str = "IMPACT_WEIGHT_TOLERANCE";
pub const ENV_DEFAULT_ACTIVITIES: &str = "IMPACT_DEFAULT_ACTIVITIES";
pub const ENV_UNKNOWN_ACTIVITY_POLICY: &str = "IMPACT_UNKNOWN_ACTIVITY_POLICY";
pub const ENV_INDUSTRY_FALLBACK: &str = "IMPACT_INDUSTRY_FALLBACK";

pub const ENV_ABACA_BASE_URL: &str = "ABACA_BASE_URL";
pub const ENV_ABACA_TOKEN: &str = "ABACA_API_TOKEN";

pub const DEFAULT_BASE_URL: &str = "https://api.vestedimpact.co.uk/v2";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Initial attempt plus three retries.
pub const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 4;
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_secs(1);
/// 400 is deliberately part of the default set; see `validation`.
pub const DEFAULT_RETRY_STATUSES: [u16; 5] = [400, 429, 500, 503, 504];

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 600;
pub const DEFAULT_POLL_DEADLINE: Duration = Duration::from_secs(15 * 60);

pub const DEFAULT_WEIGHT_TOLERANCE: f64 = 1e-4;
pub const DEFAULT_MAX_DEFAULT_ACTIVITIES: usize = 3;
