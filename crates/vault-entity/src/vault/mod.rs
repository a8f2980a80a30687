//! Vault entity and quota accounting.

pub mod model;
pub mod usage;

pub use model::{SYSTEM_FOLDER_NAME, Vault};
pub use usage::VaultUsage;
