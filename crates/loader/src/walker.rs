//! Recursive file loading.

use crate::policy::{IngestPolicy, expand_tilde};
use crate::LoadError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

/// One eligible file and what happened when reading it.
#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub path: String,
    /// File content, or the reason it could not be read.
    pub outcome: Result<String, String>,
}

impl LoadedFile {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    /// `(path, outcome)` pair in the shape the session ingests.
    pub fn into_pair(self) -> (String, Result<String, String>) {
        (self.path, self.outcome)
    }
}

/// Load a file or walk a directory according to `policy`.
///
/// Per-file failures are entries with an `Err` outcome. Only a missing
/// root or a failing walk of the root itself is an error.
pub fn load_path(path: &str, policy: &IngestPolicy) -> Result<Vec<LoadedFile>, LoadError> {
    let root = PathBuf::from(expand_tilde(path.trim()));
    if !root.exists() {
        return Err(LoadError::NotFound { path: root });
    }

    if root.is_file() {
        return Ok(load_file(&root, policy).into_iter().collect());
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(&root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || !e.file_type().is_dir()
                || !policy.is_excluded_dir(&e.file_name().to_string_lossy())
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(LoadError::Walk {
                    path: root,
                    reason: e.to_string(),
                });
            }
            Err(e) => {
                debug!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };

        if files.len() >= policy.max_files {
            debug!(max_files = policy.max_files, "File limit reached");
            break;
        }
        if entry.file_type().is_file()
            && let Some(file) = load_file(entry.path(), policy)
        {
            files.push(file);
        }
    }

    debug!(root = %root.display(), files = files.len(), "Directory loaded");
    Ok(files)
}

/// `None` when the policy skips the file silently.
fn load_file(path: &Path, policy: &IngestPolicy) -> Option<LoadedFile> {
    if !policy.accepts_file(path) {
        trace!(path = %path.display(), "Not eligible");
        return None;
    }

    let display = path.to_string_lossy().into_owned();
    let outcome = match fs::metadata(path) {
        Ok(meta) if meta.len() > policy.max_file_size => {
            Err(format!("too large (>{} MB)", policy.max_file_size_mb()))
        }
        Ok(_) => fs::read(path)
            .map(|bytes| decode_lossy(&bytes))
            .map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };

    Some(LoadedFile {
        path: display,
        outcome,
    })
}

/// UTF-8 decode, dropping invalid sequences.
fn decode_lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).replace(char::REPLACEMENT_CHARACTER, "")
}
