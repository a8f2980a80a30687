//! Vault quota configuration.

use serde::{Deserialize, Serialize};

/// Default per-vault storage limit: 500 MB.
pub const DEFAULT_STORAGE_LIMIT_BYTES: i64 = 524_288_000;

/// Per-vault quota configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Storage limit in bytes assigned to newly provisioned vaults.
    #[serde(default = "default_storage_limit")]
    pub storage_limit_bytes: i64,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            storage_limit_bytes: default_storage_limit(),
        }
    }
}

fn default_storage_limit() -> i64 {
    DEFAULT_STORAGE_LIMIT_BYTES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limit_is_500_mb() {
        let config = VaultConfig::default();
        assert_eq!(config.storage_limit_bytes, 524_288_000);
    }
}
