//! Vault usage value object.

use serde::{Deserialize, Serialize};

use super::model::Vault;

/// Quota usage snapshot for a vault, as consumed by presentation layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultUsage {
    /// Bytes currently used.
    pub storage_used: i64,
    /// Total quota in bytes.
    pub storage_limit: i64,
    /// Remaining bytes, clamped to zero.
    pub remaining: i64,
}

impl VaultUsage {
    /// Build a usage snapshot from a vault row.
    pub fn from_vault(vault: &Vault) -> Self {
        Self {
            storage_used: vault.storage_used,
            storage_limit: vault.storage_limit,
            remaining: vault.remaining_bytes(),
        }
    }
}
