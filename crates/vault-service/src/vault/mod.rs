//! Vault lifecycle management and summary queries.

pub mod service;

pub use service::{VaultService, VaultSummary};
