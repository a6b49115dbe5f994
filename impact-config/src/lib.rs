//! Shared configuration library for the impact report workspace.
//!
//! Configuration is layered: built-in defaults, then an optional TOML file,
//! then environment variables. Loading always runs the guard rails in
//! [`validation`], which reject nonsensical values and collect warnings
//! for settings that are legal but surprising.

pub mod constants;
pub mod loader;
pub mod models;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoader, error::ConfigLoadError};
pub use models::{
    AbacaConfig, ApiConfig, ImpactConfig, NormalizationConfig, PollConfig,
    RetryConfig, RetryStatusSet, Secret,
};
pub use validation::{
    ConfigGuardRailError, ConfigWarning, ConfigWarnings, apply_guard_rails,
};
