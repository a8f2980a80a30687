//! Folder entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use vault_core::types::{FolderId, VaultId};

/// A folder in a vault's hierarchy.
///
/// Sibling names are not required to be unique; folders are distinguished
/// by identity only.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Folder {
    /// Unique folder identifier.
    pub id: FolderId,
    /// The vault this folder belongs to.
    pub vault_id: VaultId,
    /// Parent folder ID (null for root-level folders).
    pub parent_id: Option<FolderId>,
    /// Folder name (non-empty after trimming).
    pub name: String,
    /// Whether this is the reserved system folder.
    pub is_system_folder: bool,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
}

impl Folder {
    /// Check if this is a root folder (no parent).
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Data required to create a new folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFolder {
    /// The vault the folder belongs to.
    pub vault_id: VaultId,
    /// Parent folder (None for root-level).
    pub parent_id: Option<FolderId>,
    /// Folder name (already validated and trimmed).
    pub name: String,
}
