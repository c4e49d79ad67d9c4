//! Budgeted context pipeline.
//!
//! Everything here is synchronous and pure over in-memory state.
//!
//! | Stage | Input | Budget behaviour |
//! |-------|-------|------------------|
//! | Token estimate | text | chars / 3.5, floored |
//! | Summary | content | head 40 + marker + tail 20 above 6000 chars |
//! | Relevance | query, pool, pins | none |
//! | Assembly | ranked artifacts, mode | full → summary → skip marker |
//! | History | turns | newest suffix that fits |

pub mod assembler;
pub mod history;
pub mod relevance;
pub mod summary;
pub mod token;

pub use assembler::{
    AssembledContext, ContentForm, ContextAssembler, ContextMode, IncludedArtifact, UnknownMode,
};
pub use history::trim_history;
pub use relevance::{ScoredArtifact, ScoringWeights, score_artifacts};
pub use token::estimate_tokens;
