//! Upstream platforms that produce report workflow inputs.

pub mod abaca;

pub use abaca::{AbacaCohortInputs, AbacaCompanyInputs, AbacaSource};
