use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// What the normalizer does with a breakdown row whose activity id is not
/// among the suggested activities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum UnknownActivityPolicy {
    /// Replace the id with the first suggestion and log a warning.
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "rewrite"))]
    RewriteToFirstSuggestion,
    /// Fail validation naming the offending rows.
    #[cfg_attr(feature = "serde", serde(rename = "reject"))]
    Reject,
}

impl fmt::Display for UnknownActivityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnknownActivityPolicy::RewriteToFirstSuggestion => {
                f.write_str("rewrite")
            }
            UnknownActivityPolicy::Reject => f.write_str("reject"),
        }
    }
}

impl FromStr for UnknownActivityPolicy {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rewrite" => Ok(UnknownActivityPolicy::RewriteToFirstSuggestion),
            "reject" => Ok(UnknownActivityPolicy::Reject),
            _ => Err(ModelError::UnknownVariant {
                kind: "unknown-activity policy",
                value: s.to_string(),
            }),
        }
    }
}
