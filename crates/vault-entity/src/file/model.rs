//! File entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use vault_core::types::{FileId, FolderId};

/// A file entry in a vault folder.
///
/// The vault core tracks metadata only; the byte content lives in an
/// external object store. `size_bytes` is the file's claim against its
/// vault's `storage_used` ledger.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct File {
    /// Unique file identifier.
    pub id: FileId,
    /// The folder containing this file.
    pub folder_id: FolderId,
    /// The file name (including extension).
    pub name: String,
    /// File size in bytes, as reported at upload completion.
    pub size_bytes: i64,
    /// MIME type of the file, if known.
    pub mime_type: Option<String>,
    /// When the file record was created.
    pub created_at: DateTime<Utc>,
}

/// Data required to record a newly uploaded file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFile {
    /// The folder to place the file in.
    pub folder_id: FolderId,
    /// The file name.
    pub name: String,
    /// File size in bytes.
    pub size_bytes: i64,
    /// MIME type, if known.
    pub mime_type: Option<String>,
}
