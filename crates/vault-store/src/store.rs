//! The backing-store contract for vault state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use vault_core::result::AppResult;
use vault_core::types::{FileId, FolderId, UserId, VaultId};
use vault_entity::file::{CreateFile, File};
use vault_entity::folder::{CreateFolder, Folder};
use vault_entity::vault::Vault;

/// Summary of a completed cascade deletion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CascadeOutcome {
    /// Number of folders removed, including the deletion root.
    pub folders_removed: u64,
    /// Number of files removed from the subtree.
    pub files_removed: u64,
    /// Total bytes released back to the quota ledger.
    pub bytes_released: i64,
}

/// Transactional store for vaults, folders, and files.
///
/// Every method that touches both structural state and the quota ledger
/// applies both effects atomically. `storage_used` is only ever mutated
/// by store-level arithmetic scoped to the vault row, never by a
/// read-modify-write in application code, so concurrent deltas compose
/// under any interleaving.
///
/// Methods returning `Option` yield `None` when the target row is absent
/// or not owned by the given vault; mapping that onto a caller-facing
/// error is the service layer's job.
#[async_trait]
pub trait VaultStore: Send + Sync + std::fmt::Debug + 'static {
    /// Get or create the vault for an owner identity, and ensure its
    /// reserved system folder exists at the root.
    ///
    /// Both steps are idempotent get-or-inserts against uniqueness
    /// constraints: repeated or concurrent calls never produce a second
    /// vault for the same owner, nor a second system folder.
    async fn resolve_vault(&self, owner_id: UserId, default_limit_bytes: i64) -> AppResult<Vault>;

    /// Find a folder by ID, scoped to a vault.
    async fn find_folder(&self, vault_id: VaultId, folder_id: FolderId)
    -> AppResult<Option<Folder>>;

    /// List root-level folders of a vault, ordered by creation time ascending.
    async fn list_roots(&self, vault_id: VaultId) -> AppResult<Vec<Folder>>;

    /// List direct subfolders of a folder, ordered by creation time ascending.
    async fn list_subfolders(&self, folder_id: FolderId) -> AppResult<Vec<Folder>>;

    /// List files in a folder, ordered by creation time ascending.
    async fn list_files(&self, folder_id: FolderId) -> AppResult<Vec<File>>;

    /// Insert a new non-system folder.
    async fn insert_folder(&self, data: &CreateFolder) -> AppResult<Folder>;

    /// Rename a folder, scoped to a vault. System folders are never matched.
    async fn rename_folder(
        &self,
        vault_id: VaultId,
        folder_id: FolderId,
        new_name: &str,
    ) -> AppResult<Option<Folder>>;

    /// Delete a folder together with all descendant folders and files,
    /// releasing the removed files' bytes back to the quota ledger.
    ///
    /// The structural removal and the ledger decrement are one atomic
    /// unit: either the entire subtree and the delta commit, or nothing
    /// does. System folders are never matched.
    async fn delete_folder_cascade(
        &self,
        vault_id: VaultId,
        folder_id: FolderId,
    ) -> AppResult<Option<CascadeOutcome>>;

    /// Insert a file record and claim its size against the vault's quota
    /// ledger, atomically.
    ///
    /// Fails with `QuotaExceeded` (and writes nothing) when the claim
    /// would push `storage_used` past `storage_limit`.
    async fn insert_file(&self, vault_id: VaultId, data: &CreateFile) -> AppResult<File>;

    /// Delete a file record and release its recorded size from the quota
    /// ledger, atomically. Returns the removed row.
    async fn delete_file(&self, vault_id: VaultId, file_id: FileId) -> AppResult<Option<File>>;
}
