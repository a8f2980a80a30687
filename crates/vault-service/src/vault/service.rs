//! Vault lifecycle manager.
//!
//! The entry point every other operation goes through: resolving a vault
//! lazily provisions it (and its reserved system folder) on first access.

use std::sync::Arc;

use tracing::debug;

use vault_core::config::vault::VaultConfig;
use vault_core::result::AppResult;
use vault_core::types::UserId;
use vault_entity::folder::Folder;
use vault_entity::vault::{Vault, VaultUsage};
use vault_store::VaultStore;

/// Manages vault provisioning and the summary/usage query surface.
#[derive(Debug, Clone)]
pub struct VaultService {
    /// Backing store.
    store: Arc<dyn VaultStore>,
    /// Quota configuration applied to newly provisioned vaults.
    config: VaultConfig,
}

/// Vault row plus its root folders, as consumed by presentation layers.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct VaultSummary {
    /// The resolved vault.
    pub vault: Vault,
    /// Root-level folders, ordered by creation time ascending.
    pub root_folders: Vec<Folder>,
}

impl VaultService {
    /// Creates a new vault service.
    pub fn new(store: Arc<dyn VaultStore>, config: VaultConfig) -> Self {
        Self { store, config }
    }

    /// Resolves the vault for an owner identity, provisioning it together
    /// with its system folder on first access.
    ///
    /// Idempotent: repeated calls return the same vault and never create a
    /// second system folder. May write as a byproduct of a read-like call.
    pub async fn resolve(&self, owner_id: UserId) -> AppResult<Vault> {
        let vault = self
            .store
            .resolve_vault(owner_id, self.config.storage_limit_bytes)
            .await?;
        debug!(owner_id = %owner_id, vault_id = %vault.id, "Vault resolved");
        Ok(vault)
    }

    /// Returns the vault together with its root folders.
    pub async fn summary(&self, owner_id: UserId) -> AppResult<VaultSummary> {
        let vault = self.resolve(owner_id).await?;
        let root_folders = self.store.list_roots(vault.id).await?;
        Ok(VaultSummary {
            vault,
            root_folders,
        })
    }

    /// Returns the quota usage snapshot for the owner's vault.
    pub async fn usage(&self, owner_id: UserId) -> AppResult<VaultUsage> {
        let vault = self.resolve(owner_id).await?;
        Ok(VaultUsage::from_vault(&vault))
    }
}
