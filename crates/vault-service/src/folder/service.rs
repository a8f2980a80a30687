//! Folder CRUD with system-folder protection and cascading deletion.

use std::sync::Arc;

use tracing::info;

use vault_core::error::AppError;
use vault_core::result::AppResult;
use vault_core::types::{FolderId, UserId};
use vault_entity::file::File;
use vault_entity::folder::{CreateFolder, Folder};
use vault_store::{CascadeOutcome, VaultStore};

use crate::vault::VaultService;

/// Manages folder operations, all scoped to the caller's resolved vault.
#[derive(Debug, Clone)]
pub struct FolderService {
    /// Backing store.
    store: Arc<dyn VaultStore>,
    /// Vault lifecycle manager.
    vaults: VaultService,
}

/// A folder together with its direct children, both listings in
/// creation-time order.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FolderContents {
    /// The listed folder.
    pub folder: Folder,
    /// Direct subfolders.
    pub subfolders: Vec<Folder>,
    /// Contained files.
    pub files: Vec<File>,
}

impl FolderService {
    /// Creates a new folder service.
    pub fn new(store: Arc<dyn VaultStore>, vaults: VaultService) -> Self {
        Self { store, vaults }
    }

    /// Creates a non-system folder, at the root or under `parent_id`.
    pub async fn create_folder(
        &self,
        owner_id: UserId,
        name: &str,
        parent_id: Option<FolderId>,
    ) -> AppResult<Folder> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::invalid_argument("Folder name is required"));
        }

        let vault = self.vaults.resolve(owner_id).await?;

        if let Some(parent_id) = parent_id {
            self.store
                .find_folder(vault.id, parent_id)
                .await?
                .ok_or_else(|| AppError::not_found("Parent folder not found"))?;
        }

        let folder = self
            .store
            .insert_folder(&CreateFolder {
                vault_id: vault.id,
                parent_id,
                name: name.to_string(),
            })
            .await?;

        info!(
            owner_id = %owner_id,
            folder_id = %folder.id,
            name = %folder.name,
            "Folder created"
        );

        Ok(folder)
    }

    /// Renames a folder. The system folder is immutable.
    pub async fn rename_folder(
        &self,
        owner_id: UserId,
        folder_id: FolderId,
        new_name: &str,
    ) -> AppResult<Folder> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(AppError::invalid_argument("Folder name is required"));
        }

        let vault = self.vaults.resolve(owner_id).await?;
        let folder = self
            .store
            .find_folder(vault.id, folder_id)
            .await?
            .ok_or_else(|| AppError::not_found("Folder not found"))?;
        if folder.is_system_folder {
            return Err(AppError::forbidden("System folders cannot be renamed"));
        }

        let renamed = self
            .store
            .rename_folder(vault.id, folder_id, new_name)
            .await?
            .ok_or_else(|| AppError::not_found("Folder not found"))?;

        info!(
            owner_id = %owner_id,
            folder_id = %folder_id,
            new_name = %new_name,
            "Folder renamed"
        );

        Ok(renamed)
    }

    /// Deletes a folder together with all descendant folders and files,
    /// releasing the removed bytes back to the quota ledger as one atomic
    /// unit. The system folder is immutable.
    pub async fn delete_folder(
        &self,
        owner_id: UserId,
        folder_id: FolderId,
    ) -> AppResult<CascadeOutcome> {
        let vault = self.vaults.resolve(owner_id).await?;
        let folder = self
            .store
            .find_folder(vault.id, folder_id)
            .await?
            .ok_or_else(|| AppError::not_found("Folder not found"))?;
        if folder.is_system_folder {
            return Err(AppError::forbidden("System folders cannot be deleted"));
        }

        let outcome = self
            .store
            .delete_folder_cascade(vault.id, folder_id)
            .await?
            .ok_or_else(|| AppError::not_found("Folder not found"))?;

        info!(
            owner_id = %owner_id,
            folder_id = %folder_id,
            folders_removed = outcome.folders_removed,
            files_removed = outcome.files_removed,
            bytes_released = outcome.bytes_released,
            "Folder deleted"
        );

        Ok(outcome)
    }

    /// Lists a folder's direct subfolders and files, both ordered by
    /// creation time ascending.
    pub async fn list_children(
        &self,
        owner_id: UserId,
        folder_id: FolderId,
    ) -> AppResult<FolderContents> {
        let vault = self.vaults.resolve(owner_id).await?;
        let folder = self
            .store
            .find_folder(vault.id, folder_id)
            .await?
            .ok_or_else(|| AppError::not_found("Folder not found"))?;

        let subfolders = self.store.list_subfolders(folder_id).await?;
        let files = self.store.list_files(folder_id).await?;

        Ok(FolderContents {
            folder,
            subfolders,
            files,
        })
    }

    /// Lists the root folders of the caller's vault.
    pub async fn list_roots(&self, owner_id: UserId) -> AppResult<Vec<Folder>> {
        let vault = self.vaults.resolve(owner_id).await?;
        self.store.list_roots(vault.id).await
    }
}
