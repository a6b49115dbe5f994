use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ids::ResourceId;

/// `Partial` means the resource exists remotely but no fresh report was
/// produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum OutcomeStatus {
    Success,
    Partial,
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeStatus::Success => f.write_str("success"),
            OutcomeStatus::Partial => f.write_str("partial"),
        }
    }
}

/// Caller-facing result of a report workflow.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReportOutcome {
    pub id: ResourceId,
    pub status: OutcomeStatus,
    pub message: String,
}

impl ReportOutcome {
    pub fn success(id: ResourceId, message: impl Into<String>) -> Self {
        Self {
            id,
            status: OutcomeStatus::Success,
            message: message.into(),
        }
    }

    pub fn partial(id: ResourceId, message: impl Into<String>) -> Self {
        Self {
            id,
            status: OutcomeStatus::Partial,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}
