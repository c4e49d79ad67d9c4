//! Generation lifecycle and stream consumption.
//!
//! ```text
//! Idle → Assembling → Streaming → {Completed | Aborted | Failed} → Idle
//! ```
//!
//! Cancellation is cooperative: the token is checked before each received
//! chunk is consumed, and while waiting for the next one. A chunk that has
//! already been appended is never taken back.

use cockpit_core::error::ProviderError;
use cockpit_core::provider::{ChunkReceiver, Usage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Appended to the partial text when a generation is cancelled.
pub const ABORT_MARKER: &str = "\n\n[ABORTED]";

/// Session-level generation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationState {
    #[default]
    Idle,
    Assembling,
    Streaming,
}

impl GenerationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Assembling => "assembling",
            Self::Streaming => "streaming",
        }
    }
}

impl fmt::Display for GenerationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal state of one generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Completed,
    Aborted,
    Failed,
}

impl GenerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Aborted => "aborted",
            Self::Failed => "failed",
        }
    }

    /// Completed and aborted replies go into history; failed ones do not.
    pub fn is_recorded(&self) -> bool {
        matches!(self, Self::Completed | Self::Aborted)
    }
}

impl fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What came out of consuming one reply stream.
#[derive(Debug, Clone)]
pub struct StreamResult {
    pub status: GenerationStatus,
    /// Received text plus the abort marker or error annotation, if any.
    pub text: String,
    /// Number of content deltas consumed.
    pub chunks: usize,
    /// Usage reported by the backend on the final chunk.
    pub usage: Option<Usage>,
    pub error: Option<ProviderError>,
}

/// The full result of `Session::generate`.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub status: GenerationStatus,
    pub text: String,
    pub error: Option<ProviderError>,
    /// Estimated tokens over every composed message.
    pub tokens_in: usize,
    /// Estimated tokens of the reply text.
    pub tokens_out: usize,
    pub elapsed: Duration,
    pub usage: Option<Usage>,
}

/// Annotation appended to the partial text when the transport fails.
pub fn error_annotation(error: &ProviderError) -> String {
    format!("\n\n[ERROR: {error}]")
}

/// Drain `rx`, forwarding each delta to `on_delta`, until the stream ends,
/// fails, or `cancel` fires.
pub async fn consume_stream<F>(
    mut rx: ChunkReceiver,
    cancel: &CancellationToken,
    mut on_delta: F,
) -> StreamResult
where
    F: FnMut(&str),
{
    let mut text = String::new();
    let mut chunks = 0usize;
    let mut usage = None;

    loop {
        if cancel.is_cancelled() {
            return aborted(text, chunks, usage);
        }

        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return aborted(text, chunks, usage),
            next = rx.recv() => next,
        };

        match next {
            Some(Ok(chunk)) => {
                if let Some(delta) = chunk.content.as_deref().filter(|d| !d.is_empty()) {
                    text.push_str(delta);
                    chunks += 1;
                    on_delta(delta);
                }
                if chunk.usage.is_some() {
                    usage = chunk.usage;
                }
                if chunk.done {
                    break;
                }
            }
            Some(Err(e)) => {
                tracing::debug!(error = %e, chunks, "Stream failed");
                text.push_str(&error_annotation(&e));
                return StreamResult {
                    status: GenerationStatus::Failed,
                    text,
                    chunks,
                    usage,
                    error: Some(e),
                };
            }
            // Sender dropped without a final chunk: treat as the natural end.
            None => break,
        }
    }

    StreamResult {
        status: GenerationStatus::Completed,
        text,
        chunks,
        usage,
        error: None,
    }
}

fn aborted(mut text: String, chunks: usize, usage: Option<Usage>) -> StreamResult {
    tracing::debug!(chunks, "Stream cancelled");
    text.push_str(ABORT_MARKER);
    StreamResult {
        status: GenerationStatus::Aborted,
        text,
        chunks,
        usage,
        error: None,
    }
}
