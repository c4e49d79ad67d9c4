//! The context assembly and budget engine.
//!
//! Per request:
//!
//! 1. **Score** every loaded artifact against the query (pins dominate)
//! 2. **Assemble** a context block under the context budget
//! 3. **Trim** history to the newest turns that fit the history budget
//! 4. **Compose** preamble + history + context + question
//! 5. **Stream** the reply, observing cancellation between chunks
//!
//! Steps 1–4 are synchronous and never fail on budget pressure. The engine
//! performs no I/O of its own; artifacts arrive as already-read text and
//! the transport is any [`cockpit_core::Provider`].

pub mod artifact;
pub mod composer;
pub mod context;
pub mod generation;
pub mod search;
pub mod session;

pub use artifact::{Artifact, ArtifactPool, FailedArtifact, LoadedArtifact, PinSet};
pub use context::{AssembledContext, ContextAssembler, ContextMode, ScoringWeights};
pub use generation::{
    ABORT_MARKER, GenerationOutcome, GenerationState, GenerationStatus, consume_stream,
};
pub use search::{SearchHit, search_pool};
pub use session::{
    ComposedRequest, EngineSettings, IngestReport, InventoryEntry, PoolInventory, Session,
};
pub use tokio_util::sync::CancellationToken;
