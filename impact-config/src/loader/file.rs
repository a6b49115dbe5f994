//! On-disk TOML layer. Every field is optional; absent values keep
//! whatever the previous layer resolved.

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FileConfig {
    #[serde(default)]
    pub api: FileApi,
    #[serde(default)]
    pub retry: FileRetry,
    #[serde(default)]
    pub poll: FilePoll,
    #[serde(default)]
    pub normalization: FileNormalization,
    pub abaca: Option<FileAbaca>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FileApi {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub request_timeout: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FileRetry {
    pub max_attempts: Option<u32>,
    pub base_delay: Option<String>,
    pub retry_on: Option<Vec<u16>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FilePoll {
    pub interval: Option<String>,
    pub max_attempts: Option<u32>,
    /// Humantime string, or `off` to disable the wall-clock bound.
    pub deadline: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FileNormalization {
    pub tolerance: Option<f64>,
    pub max_default_activities: Option<usize>,
    pub unknown_activity: Option<impact_model::UnknownActivityPolicy>,
    pub industry_activity_fallback: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FileAbaca {
    pub base_url: Option<String>,
    pub token: Option<String>,
}
