//! Context assembly: ranked artifacts in, one budgeted text block out.
//!
//! # Algorithm
//!
//! 1. Visit artifacts by score, highest first (ties in pool order)
//! 2. Pick the content form from the conversation mode and the score
//! 3. If the form does not fit, fall back to a strictly shorter summary
//! 4. If nothing fits, emit a skip marker and move on
//! 5. Close the block with a trailer (files included, tokens used)
//!
//! Budget pressure is never an error. Nothing is truncated mid-content:
//! an artifact is either included whole (full or summary) or skipped.

use crate::context::relevance::ScoredArtifact;
use crate::context::token;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ── Types ─────────────────────────────────────────────────────────────────

/// How much of each artifact goes into the context block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextMode {
    /// Full content above the relevance threshold, summary below it.
    #[default]
    Smart,
    /// Always full content.
    Full,
    /// Always the summary.
    Summary,
}

impl ContextMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Smart => "smart",
            Self::Full => "full",
            Self::Summary => "summary",
        }
    }
}

impl fmt::Display for ContextMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for unknown mode names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown mode '{0}' (expected smart, full or summary)")]
pub struct UnknownMode(pub String);

impl FromStr for ContextMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "smart" => Ok(Self::Smart),
            "full" => Ok(Self::Full),
            "summary" => Ok(Self::Summary),
            other => Err(UnknownMode(other.to_string())),
        }
    }
}

/// Which representation of an artifact made it into the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentForm {
    Full,
    Summary,
}

/// One artifact that was included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncludedArtifact {
    pub path: String,
    pub name: String,
    pub score: u32,
    pub form: ContentForm,
    pub tokens: usize,
}

/// The assembled context block and what went into it.
#[derive(Debug, Clone, Default)]
pub struct AssembledContext {
    /// The block injected before the user question; empty when no
    /// artifact was eligible.
    pub text: String,
    pub included: Vec<IncludedArtifact>,
    /// Names of artifacts skipped for budget reasons.
    pub skipped: Vec<String>,
    /// Sum of the token estimates of the included blocks.
    pub used_tokens: usize,
}

impl AssembledContext {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

// ── Assembler ─────────────────────────────────────────────────────────────

/// Default context budget in tokens.
pub const DEFAULT_CONTEXT_BUDGET: usize = 8000;
/// Default score above which `smart` mode sends full content.
pub const DEFAULT_RELEVANCE_THRESHOLD: u32 = 40;

const HEADER: &str = "=== PROVIDED CODE CONTEXT ===";

/// The context assembler. Stateless; create one and reuse it.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    budget: usize,
    relevance_threshold: u32,
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT_BUDGET, DEFAULT_RELEVANCE_THRESHOLD)
    }
}

impl ContextAssembler {
    pub fn new(budget: usize, relevance_threshold: u32) -> Self {
        Self {
            budget,
            relevance_threshold,
        }
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Assemble the context block from scored artifacts.
    ///
    /// `scored` is expected in rank order (see `score_artifacts`). Returns an
    /// empty context when `scored` is empty.
    pub fn assemble(&self, scored: &[ScoredArtifact<'_>], mode: ContextMode) -> AssembledContext {
        if scored.is_empty() {
            return AssembledContext::default();
        }

        let mut parts: Vec<String> = vec![HEADER.to_string()];
        let mut included = Vec::new();
        let mut skipped = Vec::new();
        let mut remaining = self.budget;

        for entry in scored {
            let artifact = entry.artifact;
            let use_full = match mode {
                ContextMode::Full => true,
                ContextMode::Smart => entry.score > self.relevance_threshold,
                ContextMode::Summary => false,
            };

            let (mut form, mut content) = if use_full {
                (ContentForm::Full, artifact.content.as_str())
            } else {
                (ContentForm::Summary, artifact.summary.as_str())
            };
            let mut tokens = token::estimate_tokens(content);

            if tokens > remaining
                && form == ContentForm::Full
                && artifact.summary.len() < artifact.content.len()
            {
                form = ContentForm::Summary;
                content = artifact.summary.as_str();
                tokens = token::estimate_tokens(content);
            }

            if tokens > remaining {
                tracing::debug!(artifact = %artifact.name, tokens, remaining, "Skipping artifact, budget exhausted");
                parts.push(format!("\n[Skipped: {} - budget exhausted]", artifact.name));
                skipped.push(artifact.name.clone());
                continue;
            }

            parts.push(format!(
                "\n--- FILE: {} (relevance: {}) ---\n{}\n",
                artifact.name, entry.score, content
            ));
            remaining -= tokens;
            included.push(IncludedArtifact {
                path: artifact.path.clone(),
                name: artifact.name.clone(),
                score: entry.score,
                form,
                tokens,
            });
        }

        let used_tokens = self.budget - remaining;
        parts.push(format!(
            "\n=== END CONTEXT ({} files, ~{} tokens) ===",
            included.len(),
            used_tokens
        ));

        tracing::debug!(
            included = included.len(),
            skipped = skipped.len(),
            used_tokens,
            budget = self.budget,
            %mode,
            "Context assembled"
        );

        AssembledContext {
            text: parts.join("\n"),
            included,
            skipped,
            used_tokens,
        }
    }
}
