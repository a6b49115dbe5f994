use std::fmt::{self, Display};

/// Errors produced when parsing model values from their wire spelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// An enumeration received a spelling it does not know.
    UnknownVariant {
        /// Name of the enumeration being parsed.
        kind: &'static str,
        /// The rejected input.
        value: String,
    },
    /// A value was structurally empty where content is required.
    Empty(&'static str),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::UnknownVariant { kind, value } => {
                write!(f, "unknown {kind} `{value}`")
            }
            ModelError::Empty(what) => write!(f, "{what} must not be empty"),
        }
    }
}

impl std::error::Error for ModelError {}

pub type Result<T> = std::result::Result<T, ModelError>;
