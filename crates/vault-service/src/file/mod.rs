//! File registry operations.

pub mod service;

pub use service::{FileService, RecordFileRequest};
