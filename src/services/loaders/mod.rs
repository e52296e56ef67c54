//! Bulk loaders for CSV exports dropped on disk.

pub mod error;
pub mod file_reader;
pub mod metadata;
pub mod series_files;

pub use error::LoadError;
