//! Completion backends for Cockpit.
//!
//! All providers implement the `cockpit_core::Provider` streaming trait.
//! The router selects the configured one.

pub mod openai_compat;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use router::{ProviderRouter, build_from_config};
