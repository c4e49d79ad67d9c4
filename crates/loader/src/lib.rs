//! # Cockpit Loader
//!
//! Reads files from disk for the engine's artifact pool. Applies the
//! ingestion policy (extensions, excluded names, size and count limits)
//! and hands back already-decoded text.

pub mod policy;
pub mod walker;

pub use policy::{IngestPolicy, expand_tilde};
pub use walker::{LoadedFile, load_path};

use std::path::PathBuf;

/// Failures of a whole load request.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Path not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to walk {}: {reason}", path.display())]
    Walk { path: PathBuf, reason: String },
}
