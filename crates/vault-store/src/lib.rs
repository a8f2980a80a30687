//! # vault-store
//!
//! Backing-store implementations for the per-user storage vault. The
//! [`VaultStore`] trait defines the transactional contract every backend
//! honors: structural mutations and their quota-ledger deltas commit as
//! one atomic unit, or not at all.
//!
//! Two backends are provided:
//! - [`PostgresVaultStore`]: sqlx/PostgreSQL, the production backend.
//! - [`MemoryVaultStore`]: in-process state behind a single lock, used
//!   by test suites and embedded setups.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod postgres;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryVaultStore;
pub use postgres::PostgresVaultStore;
pub use store::{CascadeOutcome, VaultStore};
