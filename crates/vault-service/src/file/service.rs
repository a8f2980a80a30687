//! File metadata bookkeeping: upload-completion recording and deletion.
//!
//! Byte content lives in an external object store; this service only
//! tracks size and hierarchy, and keeps the quota ledger consistent with
//! both.

use std::sync::Arc;

use tracing::info;

use vault_core::error::AppError;
use vault_core::result::AppResult;
use vault_core::types::{FileId, FolderId, UserId};
use vault_entity::file::{CreateFile, File};
use vault_store::VaultStore;

use crate::vault::VaultService;

/// Manages file metadata rows and their quota claims.
#[derive(Debug, Clone)]
pub struct FileService {
    /// Backing store.
    store: Arc<dyn VaultStore>,
    /// Vault lifecycle manager.
    vaults: VaultService,
}

/// Upload-completion callback payload from the object-storage collaborator.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RecordFileRequest {
    /// Target folder ID.
    pub folder_id: FolderId,
    /// File name.
    pub name: String,
    /// Size in bytes reported by the collaborator.
    pub size_bytes: i64,
    /// MIME type, if known.
    pub mime_type: Option<String>,
}

impl FileService {
    /// Creates a new file service.
    pub fn new(store: Arc<dyn VaultStore>, vaults: VaultService) -> Self {
        Self { store, vaults }
    }

    /// Records a completed upload: inserts the file row and claims its
    /// size against the vault's quota ledger, atomically. Fails with
    /// `QuotaExceeded` (writing nothing) when the claim would pass the
    /// vault's storage limit.
    pub async fn record_file_created(
        &self,
        owner_id: UserId,
        req: RecordFileRequest,
    ) -> AppResult<File> {
        let name = req.name.trim();
        if name.is_empty() {
            return Err(AppError::invalid_argument("File name is required"));
        }
        if req.size_bytes < 0 {
            return Err(AppError::invalid_argument("File size cannot be negative"));
        }

        let vault = self.vaults.resolve(owner_id).await?;
        self.store
            .find_folder(vault.id, req.folder_id)
            .await?
            .ok_or_else(|| AppError::not_found("Folder not found"))?;

        let file = self
            .store
            .insert_file(
                vault.id,
                &CreateFile {
                    folder_id: req.folder_id,
                    name: name.to_string(),
                    size_bytes: req.size_bytes,
                    mime_type: req.mime_type,
                },
            )
            .await?;

        info!(
            owner_id = %owner_id,
            file_id = %file.id,
            folder_id = %file.folder_id,
            size_bytes = file.size_bytes,
            "File recorded"
        );

        Ok(file)
    }

    /// Deletes a file record and releases its recorded size from the
    /// quota ledger; both effects commit together or not at all.
    pub async fn delete_file(&self, owner_id: UserId, file_id: FileId) -> AppResult<()> {
        let vault = self.vaults.resolve(owner_id).await?;

        let removed = self
            .store
            .delete_file(vault.id, file_id)
            .await?
            .ok_or_else(|| AppError::not_found("File not found"))?;

        info!(
            owner_id = %owner_id,
            file_id = %file_id,
            bytes_released = removed.size_bytes,
            "File deleted"
        );

        Ok(())
    }
}
