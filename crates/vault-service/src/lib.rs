//! # vault-service
//!
//! Operations surface for the per-user storage vault. Each service takes
//! an already-authenticated user identity, resolves (or lazily provisions)
//! that user's vault through [`VaultService`], and dispatches to the
//! backing store. Size-affecting mutations and their quota-ledger deltas
//! are atomic by the store contract.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references.

pub mod file;
pub mod folder;
pub mod vault;

pub use file::{FileService, RecordFileRequest};
pub use folder::{FolderContents, FolderService};
pub use vault::{VaultService, VaultSummary};
