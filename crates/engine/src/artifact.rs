//! Artifacts and the pool that holds them.
//!
//! An artifact is either `Loaded` (content, preview, counts) or `Failed`
//! (identity and a reason). Scoring and assembly only ever see the
//! `Loaded` variant, so a failed record cannot leak into a request.

use crate::context::summary;
use crate::context::token;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// A successfully ingested text unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadedArtifact {
    /// Unique key in the pool.
    pub path: String,
    /// Display name (file name); not unique.
    pub name: String,
    /// Full text.
    pub content: String,
    /// Preview derived at ingest time; never longer than `content`.
    pub summary: String,
    /// Number of `\n`-separated lines.
    pub lines: usize,
    /// Approximate token count of `content`.
    pub tokens: usize,
}

/// An artifact that could not be read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedArtifact {
    pub path: String,
    pub name: String,
    pub reason: String,
}

/// One pool entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Artifact {
    Loaded(LoadedArtifact),
    Failed(FailedArtifact),
}

impl Artifact {
    /// Build a loaded artifact, deriving name, preview and counts.
    pub fn from_content(path: impl Into<String>, content: impl Into<String>) -> Self {
        let path = path.into();
        let content = content.into();
        Self::Loaded(LoadedArtifact {
            name: display_name(&path),
            summary: summary::summarize(&content),
            lines: summary::line_count(&content),
            tokens: token::estimate_tokens(&content),
            path,
            content,
        })
    }

    /// Build an error record.
    pub fn from_error(path: impl Into<String>, reason: impl Into<String>) -> Self {
        let path = path.into();
        Self::Failed(FailedArtifact {
            name: display_name(&path),
            path,
            reason: reason.into(),
        })
    }

    pub fn path(&self) -> &str {
        match self {
            Self::Loaded(a) => &a.path,
            Self::Failed(a) => &a.path,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Loaded(a) => &a.name,
            Self::Failed(a) => &a.name,
        }
    }

    pub fn as_loaded(&self) -> Option<&LoadedArtifact> {
        match self {
            Self::Loaded(a) => Some(a),
            Self::Failed(_) => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// File name of `path`, or the whole path when it has none.
fn display_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

/// Path-keyed artifact store.
///
/// Iteration is in path order, which makes ties in scoring resolve the
/// same way on every run.
#[derive(Debug, Clone, Default)]
pub struct ArtifactPool {
    entries: BTreeMap<String, Artifact>,
}

impl ArtifactPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record for the artifact's path.
    pub fn insert(&mut self, artifact: Artifact) -> &Artifact {
        let key = artifact.path().to_string();
        self.entries.insert(key.clone(), artifact);
        &self.entries[&key]
    }

    pub fn get(&self, path: &str) -> Option<&Artifact> {
        self.entries.get(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// All records, failed ones included.
    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        self.entries.values()
    }

    /// Records eligible for scoring and assembly.
    pub fn loaded(&self) -> impl Iterator<Item = &LoadedArtifact> {
        self.entries.values().filter_map(Artifact::as_loaded)
    }

    pub fn failed_count(&self) -> usize {
        self.entries.values().filter(|a| a.is_failed()).count()
    }

    /// Sum of token estimates over loaded artifacts.
    pub fn total_tokens(&self) -> usize {
        self.loaded().map(|a| a.tokens).sum()
    }
}

/// Names or paths the user marked as always relevant.
///
/// Independent of the pool: a pin that matches nothing is simply inert.
#[derive(Debug, Clone, Default)]
pub struct PinSet {
    pins: BTreeSet<String>,
}

impl PinSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the identifier was not pinned before.
    pub fn pin(&mut self, identifier: impl Into<String>) -> bool {
        self.pins.insert(identifier.into())
    }

    /// Remove every pin, returning how many there were.
    pub fn clear(&mut self) -> usize {
        let count = self.pins.len();
        self.pins.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.pins.contains(identifier)
    }

    /// Pinned by display name or by path.
    pub fn matches(&self, artifact: &LoadedArtifact) -> bool {
        self.contains(&artifact.name) || self.contains(&artifact.path)
    }
}
