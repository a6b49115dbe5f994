use std::time::Duration;

use impact_model::ResourceId;
use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ImpactError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Reconciliation(#[from] ReconciliationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("HTTP {status} from {url}: {message}")]
    HttpStatus {
        status: StatusCode,
        url: Url,
        message: String,
    },

    #[error("Unexpected response from {url}: {reason}")]
    UnexpectedResponse { url: Url, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Impact calculation failed for {id}")]
    ComputeFailed { id: ResourceId },

    #[error(
        "Impact calculation for {id} still running after {reads} status reads ({elapsed:?})"
    )]
    PollTimeout {
        id: ResourceId,
        reads: u32,
        elapsed: Duration,
    },

    #[error("Operation cancelled: {0}")]
    Cancelled(String),
}

impl ImpactError {
    /// Status code of a non-2xx reply, if that is what this error is.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ImpactError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ImpactError::Cancelled(_))
    }
}

/// Caller input rejected before any remote call. Each variant lists every
/// offending field path, not only the first.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing required fields: [{}]", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("Fields must be numbers: [{}]", .0.join(", "))]
    NotNumeric(Vec<String>),

    #[error("Invalid items: [{}]", .0.join(", "))]
    InvalidItems(Vec<String>),

    #[error("Holdings array must be non-empty")]
    EmptyHoldings,

    #[error("{collection} weights sum to zero and cannot be rescaled")]
    ZeroWeightSum { collection: &'static str },

    #[error("Activity ids not among the suggested activities: [{}]", .0.join(", "))]
    UnknownActivities(Vec<String>),

    #[error("Malformed request body: {0}")]
    Malformed(String),
}

#[derive(Error, Debug)]
pub enum ReconciliationError {
    #[error(
        "{kind} `{name}` could not be created and no match was found by search{}",
        detail(.create_error)
    )]
    NotFound {
        kind: &'static str,
        name: String,
        create_error: Option<String>,
    },

    #[error(
        "{kind} `{name}` creation was ambiguous and search failed: {search_error}{}",
        detail(.create_error)
    )]
    SearchFailed {
        kind: &'static str,
        name: String,
        create_error: Option<String>,
        search_error: String,
    },
}

fn detail(create_error: &Option<String>) -> String {
    create_error
        .as_deref()
        .map(|e| format!(" (create error: {e})"))
        .unwrap_or_default()
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Request to {url} failed: {reason}")]
    Failed { url: Url, reason: String },
}

pub type Result<T> = std::result::Result<T, ImpactError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_enumerate_every_field() {
        let err = ValidationError::MissingFields(vec![
            "asset.name".into(),
            "basics.revenue".into(),
        ]);
        assert_eq!(
            err.to_string(),
            "Missing required fields: [asset.name, basics.revenue]"
        );
    }

    #[test]
    fn reconciliation_messages_keep_the_failed_path() {
        let not_found = ReconciliationError::NotFound {
            kind: "Asset",
            name: "Acme".into(),
            create_error: Some("HTTP 500".into()),
        };
        assert!(not_found.to_string().contains("no match was found"));
        assert!(not_found.to_string().contains("HTTP 500"));

        let search_failed = ReconciliationError::SearchFailed {
            kind: "Group",
            name: "Fund".into(),
            create_error: None,
            search_error: "timeout".into(),
        };
        let message = search_failed.to_string();
        assert!(message.contains("search failed: timeout"));
        assert!(!message.contains("create error"));
    }
}
