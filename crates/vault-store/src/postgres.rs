//! PostgreSQL implementation of the [`VaultStore`] contract.
//!
//! Atomicity relies on the database: every size-affecting mutation runs
//! inside one transaction, and ledger deltas are expressed as SQL
//! arithmetic on the vault row (`storage_used = storage_used ± n`), so
//! concurrent deltas against the same vault compose correctly.

use async_trait::async_trait;
use sqlx::PgPool;

use vault_core::error::{AppError, ErrorKind};
use vault_core::result::AppResult;
use vault_core::types::{FileId, FolderId, UserId, VaultId};
use vault_entity::file::{CreateFile, File};
use vault_entity::folder::{CreateFolder, Folder};
use vault_entity::vault::{SYSTEM_FOLDER_NAME, Vault};

use crate::store::{CascadeOutcome, VaultStore};

/// Vault store backed by a PostgreSQL database.
#[derive(Debug, Clone)]
pub struct PostgresVaultStore {
    pool: PgPool,
}

impl PostgresVaultStore {
    /// Create a new store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VaultStore for PostgresVaultStore {
    async fn resolve_vault(&self, owner_id: UserId, default_limit_bytes: i64) -> AppResult<Vault> {
        // Get-or-insert against the owner uniqueness constraint; a losing
        // concurrent insert falls through to the SELECT below.
        sqlx::query(
            "INSERT INTO vaults (owner_id, storage_used, storage_limit) VALUES ($1, 0, $2) \
             ON CONFLICT (owner_id) DO NOTHING",
        )
        .bind(owner_id)
        .bind(default_limit_bytes)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::StorageUnavailable, "Failed to provision vault", e)
        })?;

        let vault = sqlx::query_as::<_, Vault>("SELECT * FROM vaults WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::StorageUnavailable, "Failed to find vault", e)
            })?
            .ok_or_else(|| {
                AppError::storage_unavailable("Vault row missing after provisioning")
            })?;

        // Same get-or-insert shape for the reserved system folder, keyed on
        // the partial unique index over root-level system folders.
        sqlx::query(
            "INSERT INTO folders (vault_id, parent_id, name, is_system_folder) \
             VALUES ($1, NULL, $2, TRUE) \
             ON CONFLICT (vault_id) WHERE is_system_folder AND parent_id IS NULL DO NOTHING",
        )
        .bind(vault.id)
        .bind(SYSTEM_FOLDER_NAME)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::StorageUnavailable,
                "Failed to provision system folder",
                e,
            )
        })?;

        Ok(vault)
    }

    async fn find_folder(
        &self,
        vault_id: VaultId,
        folder_id: FolderId,
    ) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>("SELECT * FROM folders WHERE id = $1 AND vault_id = $2")
            .bind(folder_id)
            .bind(vault_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::StorageUnavailable, "Failed to find folder", e)
            })
    }

    async fn list_roots(&self, vault_id: VaultId) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders WHERE vault_id = $1 AND parent_id IS NULL \
             ORDER BY created_at ASC, seq ASC",
        )
        .bind(vault_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::StorageUnavailable, "Failed to list root folders", e)
        })
    }

    async fn list_subfolders(&self, folder_id: FolderId) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders WHERE parent_id = $1 ORDER BY created_at ASC, seq ASC",
        )
        .bind(folder_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::StorageUnavailable, "Failed to list subfolders", e)
        })
    }

    async fn list_files(&self, folder_id: FolderId) -> AppResult<Vec<File>> {
        sqlx::query_as::<_, File>(
            "SELECT * FROM files WHERE folder_id = $1 ORDER BY created_at ASC, seq ASC",
        )
        .bind(folder_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::StorageUnavailable, "Failed to list files", e)
        })
    }

    async fn insert_folder(&self, data: &CreateFolder) -> AppResult<Folder> {
        sqlx::query_as::<_, Folder>(
            "INSERT INTO folders (vault_id, parent_id, name, is_system_folder) \
             VALUES ($1, $2, $3, FALSE) RETURNING *",
        )
        .bind(data.vault_id)
        .bind(data.parent_id)
        .bind(&data.name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            // The parent FK fires when a cascade removed the parent after
            // the caller's existence check.
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                AppError::not_found("Parent folder not found")
            }
            _ => AppError::with_source(ErrorKind::StorageUnavailable, "Failed to create folder", e),
        })
    }

    async fn rename_folder(
        &self,
        vault_id: VaultId,
        folder_id: FolderId,
        new_name: &str,
    ) -> AppResult<Option<Folder>> {
        // System folders are excluded by predicate as a backstop; the
        // service layer reports Forbidden before reaching this point.
        sqlx::query_as::<_, Folder>(
            "UPDATE folders SET name = $3 \
             WHERE id = $1 AND vault_id = $2 AND NOT is_system_folder RETURNING *",
        )
        .bind(folder_id)
        .bind(vault_id)
        .bind(new_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::StorageUnavailable, "Failed to rename folder", e)
        })
    }

    async fn delete_folder_cascade(
        &self,
        vault_id: VaultId,
        folder_id: FolderId,
    ) -> AppResult<Option<CascadeOutcome>> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::StorageUnavailable, "Failed to begin transaction", e)
        })?;

        let root = sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders \
             WHERE id = $1 AND vault_id = $2 AND NOT is_system_folder FOR UPDATE",
        )
        .bind(folder_id)
        .bind(vault_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::StorageUnavailable, "Failed to find folder", e)
        })?;

        if root.is_none() {
            // Dropping the transaction rolls it back.
            return Ok(None);
        }

        // Lock every folder in the subtree before measuring it. A racing
        // file insert takes FOR SHARE on its target folder and a racing
        // child-folder insert validates the parent FK, so both wait for
        // the cascade to commit; the measured sum cannot go stale.
        sqlx::query(
            "WITH RECURSIVE subtree AS ( \
                SELECT id FROM folders WHERE id = $1 \
                UNION ALL \
                SELECT f.id FROM folders f INNER JOIN subtree s ON f.parent_id = s.id \
             ) \
             SELECT id FROM folders WHERE id IN (SELECT id FROM subtree) FOR UPDATE",
        )
        .bind(folder_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::StorageUnavailable, "Failed to lock subtree", e)
        })?;

        let (folder_count, file_count, bytes): (i64, i64, i64) = sqlx::query_as(
            "WITH RECURSIVE subtree AS ( \
                SELECT id FROM folders WHERE id = $1 \
                UNION ALL \
                SELECT f.id FROM folders f INNER JOIN subtree s ON f.parent_id = s.id \
             ) \
             SELECT (SELECT COUNT(*) FROM subtree), COUNT(fi.id), \
                    COALESCE(SUM(fi.size_bytes), 0)::BIGINT \
             FROM subtree s LEFT JOIN files fi ON fi.folder_id = s.id",
        )
        .bind(folder_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::StorageUnavailable, "Failed to measure subtree", e)
        })?;

        // The FK cascade removes descendant folders and files with the root.
        sqlx::query("DELETE FROM folders WHERE id = $1")
            .bind(folder_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::StorageUnavailable, "Failed to delete folder", e)
            })?;

        sqlx::query("UPDATE vaults SET storage_used = GREATEST(storage_used - $2, 0) WHERE id = $1")
            .bind(vault_id)
            .bind(bytes)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::StorageUnavailable,
                    "Failed to release quota bytes",
                    e,
                )
            })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::StorageUnavailable, "Failed to commit cascade", e)
        })?;

        Ok(Some(CascadeOutcome {
            folders_removed: folder_count as u64,
            files_removed: file_count as u64,
            bytes_released: bytes,
        }))
    }

    async fn insert_file(&self, vault_id: VaultId, data: &CreateFile) -> AppResult<File> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::StorageUnavailable, "Failed to begin transaction", e)
        })?;

        // Hold the folder row so a racing cascade delete cannot strand the
        // new file.
        let folder_present: Option<i32> = sqlx::query_scalar(
            "SELECT 1 FROM folders WHERE id = $1 AND vault_id = $2 FOR SHARE",
        )
        .bind(data.folder_id)
        .bind(vault_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::StorageUnavailable, "Failed to find folder", e)
        })?;

        if folder_present.is_none() {
            return Err(AppError::not_found("Folder not found"));
        }

        // Conditional ledger claim: rejected entirely when it would pass
        // the limit, so the file row below is never written over quota.
        let claimed = sqlx::query(
            "UPDATE vaults SET storage_used = storage_used + $2 \
             WHERE id = $1 AND storage_used + $2 <= storage_limit",
        )
        .bind(vault_id)
        .bind(data.size_bytes)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::StorageUnavailable, "Failed to claim quota bytes", e)
        })?;

        if claimed.rows_affected() == 0 {
            return Err(AppError::quota_exceeded(format!(
                "Recording {} bytes would exceed the vault storage limit",
                data.size_bytes
            )));
        }

        let file = sqlx::query_as::<_, File>(
            "INSERT INTO files (folder_id, name, size_bytes, mime_type) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(data.folder_id)
        .bind(&data.name)
        .bind(data.size_bytes)
        .bind(&data.mime_type)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::StorageUnavailable, "Failed to create file", e)
        })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::StorageUnavailable, "Failed to commit file record", e)
        })?;

        Ok(file)
    }

    async fn delete_file(&self, vault_id: VaultId, file_id: FileId) -> AppResult<Option<File>> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::StorageUnavailable, "Failed to begin transaction", e)
        })?;

        let file = sqlx::query_as::<_, File>(
            "DELETE FROM files fi USING folders fo \
             WHERE fi.id = $1 AND fi.folder_id = fo.id AND fo.vault_id = $2 \
             RETURNING fi.id, fi.folder_id, fi.name, fi.size_bytes, fi.mime_type, fi.created_at",
        )
        .bind(file_id)
        .bind(vault_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::StorageUnavailable, "Failed to delete file", e)
        })?;

        let Some(file) = file else {
            return Ok(None);
        };

        sqlx::query("UPDATE vaults SET storage_used = GREATEST(storage_used - $2, 0) WHERE id = $1")
            .bind(vault_id)
            .bind(file.size_bytes)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::StorageUnavailable,
                    "Failed to release quota bytes",
                    e,
                )
            })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::StorageUnavailable, "Failed to commit file delete", e)
        })?;

        Ok(Some(file))
    }
}
