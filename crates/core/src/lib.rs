//! # Cockpit Core
//!
//! Domain types, traits, and error definitions for the Cockpit assistant.
//! This crate has **no framework dependencies** — it defines the vocabulary
//! that the engine, the providers and the CLI all speak.
//!
//! ## Design Philosophy
//!
//! The completion backend is defined as a trait here and implemented in
//! `cockpit-providers`. This keeps the engine testable with scripted
//! providers and keeps the dependency graph pointing inward.

pub mod error;
pub mod event;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, Result, SessionError};
pub use event::{DomainEvent, EventBus};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, StreamChunk, Usage};
