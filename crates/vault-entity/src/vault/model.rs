//! Vault entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use vault_core::types::{UserId, VaultId};

/// Fixed name of the reserved root folder provisioned with every vault.
pub const SYSTEM_FOLDER_NAME: &str = "AI Outputs";

/// A per-user vault tracking the folder/file hierarchy and byte quota.
///
/// Exactly one vault exists per owner identity. It is provisioned lazily
/// on first access together with its reserved system folder and is never
/// explicitly deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vault {
    /// Unique vault identifier.
    pub id: VaultId,
    /// The owning user identity (unique per vault).
    pub owner_id: UserId,
    /// Bytes currently claimed by files in this vault.
    pub storage_used: i64,
    /// Fixed byte quota for this vault.
    pub storage_limit: i64,
    /// When the vault was created.
    pub created_at: DateTime<Utc>,
}

impl Vault {
    /// Remaining bytes before the quota is reached, clamped to zero.
    pub fn remaining_bytes(&self) -> i64 {
        (self.storage_limit - self.storage_used).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vault(used: i64, limit: i64) -> Vault {
        Vault {
            id: VaultId::new(),
            owner_id: UserId::new(),
            storage_used: used,
            storage_limit: limit,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_remaining_bytes() {
        assert_eq!(vault(1_000_000, 500_000_000).remaining_bytes(), 499_000_000);
    }

    #[test]
    fn test_remaining_clamps_at_zero() {
        // Usage nominally above the limit due to external inconsistency.
        assert_eq!(vault(600, 500).remaining_bytes(), 0);
    }
}
