//! In-memory implementation of the [`VaultStore`] contract.
//!
//! All state lives behind a single async `RwLock`; every mutating method
//! holds the write guard for its whole unit of work, which gives the same
//! all-or-nothing semantics the PostgreSQL backend gets from transactions.
//! Used by the test suites and for embedded/dev setups.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use vault_core::error::AppError;
use vault_core::result::AppResult;
use vault_core::types::{FileId, FolderId, UserId, VaultId};
use vault_entity::file::{CreateFile, File};
use vault_entity::folder::{CreateFolder, Folder};
use vault_entity::vault::{SYSTEM_FOLDER_NAME, Vault};

use crate::store::{CascadeOutcome, VaultStore};

/// A folder row plus its insertion sequence number.
///
/// The sequence number breaks `created_at` ties so listings keep stable
/// append order even when rows are created within the same instant.
#[derive(Debug, Clone)]
struct StoredFolder {
    folder: Folder,
    seq: u64,
}

/// A file row plus its insertion sequence number.
#[derive(Debug, Clone)]
struct StoredFile {
    file: File,
    seq: u64,
}

#[derive(Debug, Default)]
struct MemoryState {
    vaults: HashMap<VaultId, Vault>,
    owners: HashMap<UserId, VaultId>,
    folders: HashMap<FolderId, StoredFolder>,
    files: HashMap<FileId, StoredFile>,
    seq: u64,
}

impl MemoryState {
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    fn folder_in_vault(&self, vault_id: VaultId, folder_id: FolderId) -> Option<&Folder> {
        self.folders
            .get(&folder_id)
            .map(|s| &s.folder)
            .filter(|f| f.vault_id == vault_id)
    }

    /// Collect a folder and all its descendants.
    fn subtree(&self, root: FolderId) -> Vec<FolderId> {
        let mut collected = vec![root];
        let mut frontier = vec![root];
        while let Some(current) = frontier.pop() {
            for stored in self.folders.values() {
                if stored.folder.parent_id == Some(current) {
                    collected.push(stored.folder.id);
                    frontier.push(stored.folder.id);
                }
            }
        }
        collected
    }
}

/// Vault store holding all state in process memory.
#[derive(Debug, Default)]
pub struct MemoryVaultStore {
    state: RwLock<MemoryState>,
}

impl MemoryVaultStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VaultStore for MemoryVaultStore {
    async fn resolve_vault(&self, owner_id: UserId, default_limit_bytes: i64) -> AppResult<Vault> {
        let mut state = self.state.write().await;

        let vault_id = match state.owners.get(&owner_id) {
            Some(id) => *id,
            None => {
                let vault = Vault {
                    id: VaultId::new(),
                    owner_id,
                    storage_used: 0,
                    storage_limit: default_limit_bytes,
                    created_at: Utc::now(),
                };
                let id = vault.id;
                state.owners.insert(owner_id, id);
                state.vaults.insert(id, vault);
                id
            }
        };

        let has_system_folder = state
            .folders
            .values()
            .any(|s| s.folder.vault_id == vault_id && s.folder.is_system_folder && s.folder.is_root());

        if !has_system_folder {
            let seq = state.next_seq();
            let folder = Folder {
                id: FolderId::new(),
                vault_id,
                parent_id: None,
                name: SYSTEM_FOLDER_NAME.to_string(),
                is_system_folder: true,
                created_at: Utc::now(),
            };
            state.folders.insert(folder.id, StoredFolder { folder, seq });
        }

        Ok(state.vaults[&vault_id].clone())
    }

    async fn find_folder(
        &self,
        vault_id: VaultId,
        folder_id: FolderId,
    ) -> AppResult<Option<Folder>> {
        let state = self.state.read().await;
        Ok(state.folder_in_vault(vault_id, folder_id).cloned())
    }

    async fn list_roots(&self, vault_id: VaultId) -> AppResult<Vec<Folder>> {
        let state = self.state.read().await;
        let mut roots: Vec<&StoredFolder> = state
            .folders
            .values()
            .filter(|s| s.folder.vault_id == vault_id && s.folder.is_root())
            .collect();
        roots.sort_by_key(|s| (s.folder.created_at, s.seq));
        Ok(roots.into_iter().map(|s| s.folder.clone()).collect())
    }

    async fn list_subfolders(&self, folder_id: FolderId) -> AppResult<Vec<Folder>> {
        let state = self.state.read().await;
        let mut children: Vec<&StoredFolder> = state
            .folders
            .values()
            .filter(|s| s.folder.parent_id == Some(folder_id))
            .collect();
        children.sort_by_key(|s| (s.folder.created_at, s.seq));
        Ok(children.into_iter().map(|s| s.folder.clone()).collect())
    }

    async fn list_files(&self, folder_id: FolderId) -> AppResult<Vec<File>> {
        let state = self.state.read().await;
        let mut files: Vec<&StoredFile> = state
            .files
            .values()
            .filter(|s| s.file.folder_id == folder_id)
            .collect();
        files.sort_by_key(|s| (s.file.created_at, s.seq));
        Ok(files.into_iter().map(|s| s.file.clone()).collect())
    }

    async fn insert_folder(&self, data: &CreateFolder) -> AppResult<Folder> {
        let mut state = self.state.write().await;

        // Revalidated under the write guard: a cascade that committed after
        // the caller's check must not leave a child pointing at a gone
        // parent.
        if let Some(parent_id) = data.parent_id {
            if state.folder_in_vault(data.vault_id, parent_id).is_none() {
                return Err(AppError::not_found("Parent folder not found"));
            }
        }

        let seq = state.next_seq();
        let folder = Folder {
            id: FolderId::new(),
            vault_id: data.vault_id,
            parent_id: data.parent_id,
            name: data.name.clone(),
            is_system_folder: false,
            created_at: Utc::now(),
        };
        state
            .folders
            .insert(folder.id, StoredFolder { folder: folder.clone(), seq });
        Ok(folder)
    }

    async fn rename_folder(
        &self,
        vault_id: VaultId,
        folder_id: FolderId,
        new_name: &str,
    ) -> AppResult<Option<Folder>> {
        let mut state = self.state.write().await;
        let Some(stored) = state.folders.get_mut(&folder_id) else {
            return Ok(None);
        };
        if stored.folder.vault_id != vault_id || stored.folder.is_system_folder {
            return Ok(None);
        }
        stored.folder.name = new_name.to_string();
        Ok(Some(stored.folder.clone()))
    }

    async fn delete_folder_cascade(
        &self,
        vault_id: VaultId,
        folder_id: FolderId,
    ) -> AppResult<Option<CascadeOutcome>> {
        let mut state = self.state.write().await;

        let matches = state
            .folder_in_vault(vault_id, folder_id)
            .is_some_and(|f| !f.is_system_folder);
        if !matches {
            return Ok(None);
        }
        // Fail before any structural removal so an unavailable ledger can
        // never leave a half-deleted subtree.
        if !state.vaults.contains_key(&vault_id) {
            return Err(AppError::storage_unavailable("Vault row missing"));
        }

        let subtree = state.subtree(folder_id);

        let doomed_files: Vec<FileId> = state
            .files
            .values()
            .filter(|s| subtree.contains(&s.file.folder_id))
            .map(|s| s.file.id)
            .collect();

        let mut bytes_released = 0i64;
        for file_id in &doomed_files {
            if let Some(removed) = state.files.remove(file_id) {
                bytes_released += removed.file.size_bytes;
            }
        }
        for folder_id in &subtree {
            state.folders.remove(folder_id);
        }

        let vault = state
            .vaults
            .get_mut(&vault_id)
            .ok_or_else(|| AppError::storage_unavailable("Vault row missing"))?;
        vault.storage_used = (vault.storage_used - bytes_released).max(0);

        Ok(Some(CascadeOutcome {
            folders_removed: subtree.len() as u64,
            files_removed: doomed_files.len() as u64,
            bytes_released,
        }))
    }

    async fn insert_file(&self, vault_id: VaultId, data: &CreateFile) -> AppResult<File> {
        let mut state = self.state.write().await;

        if state.folder_in_vault(vault_id, data.folder_id).is_none() {
            return Err(AppError::not_found("Folder not found"));
        }

        let vault = state
            .vaults
            .get(&vault_id)
            .ok_or_else(|| AppError::storage_unavailable("Vault row missing"))?;
        if vault.storage_used + data.size_bytes > vault.storage_limit {
            return Err(AppError::quota_exceeded(format!(
                "Recording {} bytes would exceed the vault storage limit",
                data.size_bytes
            )));
        }

        let seq = state.next_seq();
        let file = File {
            id: FileId::new(),
            folder_id: data.folder_id,
            name: data.name.clone(),
            size_bytes: data.size_bytes,
            mime_type: data.mime_type.clone(),
            created_at: Utc::now(),
        };
        state
            .files
            .insert(file.id, StoredFile { file: file.clone(), seq });
        let vault = state
            .vaults
            .get_mut(&vault_id)
            .ok_or_else(|| AppError::storage_unavailable("Vault row missing"))?;
        vault.storage_used += file.size_bytes;

        Ok(file)
    }

    async fn delete_file(&self, vault_id: VaultId, file_id: FileId) -> AppResult<Option<File>> {
        let mut state = self.state.write().await;

        let owned = state
            .files
            .get(&file_id)
            .is_some_and(|s| state.folder_in_vault(vault_id, s.file.folder_id).is_some());
        if !owned {
            return Ok(None);
        }
        if !state.vaults.contains_key(&vault_id) {
            return Err(AppError::storage_unavailable("Vault row missing"));
        }

        let removed = state
            .files
            .remove(&file_id)
            .ok_or_else(|| AppError::storage_unavailable("File row vanished mid-delete"))?;
        let vault = state
            .vaults
            .get_mut(&vault_id)
            .ok_or_else(|| AppError::storage_unavailable("Vault row missing"))?;
        vault.storage_used = (vault.storage_used - removed.file.size_bytes).max(0);

        Ok(Some(removed.file))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use vault_core::error::ErrorKind;

    use super::*;

    const LIMIT: i64 = 500_000_000;

    #[tokio::test]
    async fn test_resolve_vault_is_idempotent() {
        let store = MemoryVaultStore::new();
        let owner = UserId::new();

        let first = store.resolve_vault(owner, LIMIT).await.unwrap();
        let second = store.resolve_vault(owner, LIMIT).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.storage_used, 0);

        let roots = store.list_roots(first.id).await.unwrap();
        let system_folders: Vec<_> = roots.iter().filter(|f| f.is_system_folder).collect();
        assert_eq!(system_folders.len(), 1);
        assert_eq!(system_folders[0].name, SYSTEM_FOLDER_NAME);
    }

    #[tokio::test]
    async fn test_insert_file_claims_quota() {
        let store = MemoryVaultStore::new();
        let vault = store.resolve_vault(UserId::new(), LIMIT).await.unwrap();
        let folder = store
            .insert_folder(&CreateFolder {
                vault_id: vault.id,
                parent_id: None,
                name: "Notes".to_string(),
            })
            .await
            .unwrap();

        store
            .insert_file(
                vault.id,
                &CreateFile {
                    folder_id: folder.id,
                    name: "notes.txt".to_string(),
                    size_bytes: 1_000_000,
                    mime_type: Some("text/plain".to_string()),
                },
            )
            .await
            .unwrap();

        let vault = store.resolve_vault(vault.owner_id, LIMIT).await.unwrap();
        assert_eq!(vault.storage_used, 1_000_000);
        assert_eq!(vault.remaining_bytes(), 499_000_000);
    }

    #[tokio::test]
    async fn test_insert_file_over_quota_writes_nothing() {
        let store = MemoryVaultStore::new();
        let vault = store.resolve_vault(UserId::new(), 100).await.unwrap();
        let folder = store
            .insert_folder(&CreateFolder {
                vault_id: vault.id,
                parent_id: None,
                name: "Notes".to_string(),
            })
            .await
            .unwrap();

        let err = store
            .insert_file(
                vault.id,
                &CreateFile {
                    folder_id: folder.id,
                    name: "big.bin".to_string(),
                    size_bytes: 101,
                    mime_type: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::QuotaExceeded);

        assert!(store.list_files(folder.id).await.unwrap().is_empty());
        let vault = store.resolve_vault(vault.owner_id, 100).await.unwrap();
        assert_eq!(vault.storage_used, 0);
    }

    #[tokio::test]
    async fn test_concurrent_deletes_compose() {
        let store = Arc::new(MemoryVaultStore::new());
        let owner = UserId::new();
        let vault = store.resolve_vault(owner, LIMIT).await.unwrap();
        let folder = store
            .insert_folder(&CreateFolder {
                vault_id: vault.id,
                parent_id: None,
                name: "Inbox".to_string(),
            })
            .await
            .unwrap();

        let a = store
            .insert_file(
                vault.id,
                &CreateFile {
                    folder_id: folder.id,
                    name: "a".to_string(),
                    size_bytes: 300,
                    mime_type: None,
                },
            )
            .await
            .unwrap();
        let b = store
            .insert_file(
                vault.id,
                &CreateFile {
                    folder_id: folder.id,
                    name: "b".to_string(),
                    size_bytes: 200,
                    mime_type: None,
                },
            )
            .await
            .unwrap();

        let t1 = tokio::spawn({
            let store = Arc::clone(&store);
            let vault_id = vault.id;
            async move { store.delete_file(vault_id, a.id).await }
        });
        let t2 = tokio::spawn({
            let store = Arc::clone(&store);
            let vault_id = vault.id;
            async move { store.delete_file(vault_id, b.id).await }
        });
        t1.await.unwrap().unwrap().unwrap();
        t2.await.unwrap().unwrap().unwrap();

        let vault = store.resolve_vault(owner, LIMIT).await.unwrap();
        assert_eq!(vault.storage_used, 0);
    }

    #[tokio::test]
    async fn test_insert_folder_rejects_parent_deleted_after_check() {
        let store = MemoryVaultStore::new();
        let vault = store.resolve_vault(UserId::new(), LIMIT).await.unwrap();
        let parent = store
            .insert_folder(&CreateFolder {
                vault_id: vault.id,
                parent_id: None,
                name: "Parent".to_string(),
            })
            .await
            .unwrap();

        // A cascade lands between the caller's parent check and the insert.
        store
            .delete_folder_cascade(vault.id, parent.id)
            .await
            .unwrap()
            .expect("folder should be deletable");

        let err = store
            .insert_folder(&CreateFolder {
                vault_id: vault.id,
                parent_id: Some(parent.id),
                name: "Child".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        // No orphan row exists anywhere in the tree.
        assert!(store.list_subfolders(parent.id).await.unwrap().is_empty());
        let roots = store.list_roots(vault.id).await.unwrap();
        assert!(roots.iter().all(|f| f.is_system_folder));
    }

    #[tokio::test]
    async fn test_failed_cascade_leaves_no_partial_removal() {
        let store = MemoryVaultStore::new();
        // A subtree whose vault row is absent: the ledger step cannot
        // succeed, so the cascade must not remove anything.
        let orphan_vault = VaultId::new();
        let top = store
            .insert_folder(&CreateFolder {
                vault_id: orphan_vault,
                parent_id: None,
                name: "Doomed".to_string(),
            })
            .await
            .unwrap();
        let nested = store
            .insert_folder(&CreateFolder {
                vault_id: orphan_vault,
                parent_id: Some(top.id),
                name: "Inner".to_string(),
            })
            .await
            .unwrap();

        let err = store
            .delete_folder_cascade(orphan_vault, top.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::StorageUnavailable);

        // Both folders survive intact.
        assert!(store.find_folder(orphan_vault, top.id).await.unwrap().is_some());
        assert!(store.find_folder(orphan_vault, nested.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_cascade_outcome_counts_subtree() {
        let store = MemoryVaultStore::new();
        let vault = store.resolve_vault(UserId::new(), LIMIT).await.unwrap();
        let top = store
            .insert_folder(&CreateFolder {
                vault_id: vault.id,
                parent_id: None,
                name: "Projects".to_string(),
            })
            .await
            .unwrap();
        let nested = store
            .insert_folder(&CreateFolder {
                vault_id: vault.id,
                parent_id: Some(top.id),
                name: "Alpha".to_string(),
            })
            .await
            .unwrap();
        for (name, size) in [("x", 10), ("y", 20)] {
            store
                .insert_file(
                    vault.id,
                    &CreateFile {
                        folder_id: nested.id,
                        name: name.to_string(),
                        size_bytes: size,
                        mime_type: None,
                    },
                )
                .await
                .unwrap();
        }

        let outcome = store
            .delete_folder_cascade(vault.id, top.id)
            .await
            .unwrap()
            .expect("folder should be deletable");
        assert_eq!(outcome.folders_removed, 2);
        assert_eq!(outcome.files_removed, 2);
        assert_eq!(outcome.bytes_released, 30);

        assert!(store.find_folder(vault.id, nested.id).await.unwrap().is_none());
        let vault = store.resolve_vault(vault.owner_id, LIMIT).await.unwrap();
        assert_eq!(vault.storage_used, 0);
    }
}
