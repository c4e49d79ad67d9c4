//! The conversation session: pool, pins, mode, history and the generation
//! state machine.
//!
//! Every engine operation goes through a `Session`. Mutation needs
//! `&mut self`, so one session cannot run two generations at once.

use crate::artifact::{Artifact, ArtifactPool, PinSet};
use crate::composer;
use crate::context::assembler::{AssembledContext, ContextAssembler, ContextMode};
use crate::context::history::trim_history;
use crate::context::relevance::{ScoringWeights, score_artifacts};
use crate::context::token;
use crate::generation::{
    GenerationOutcome, GenerationState, GenerationStatus, consume_stream, error_annotation,
};
use chrono::{Local, Utc};
use cockpit_config::AppConfig;
use cockpit_core::error::SessionError;
use cockpit_core::event::{DomainEvent, EventBus};
use cockpit_core::message::Message;
use cockpit_core::provider::{Provider, ProviderRequest};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Budgets, weights and request settings for a session.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub context_budget: usize,
    pub history_budget: usize,
    pub relevance_threshold: u32,
    pub weights: ScoringWeights,
    /// Preamble template; `{time}` is substituted per request.
    pub system_template: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            context_budget: crate::context::assembler::DEFAULT_CONTEXT_BUDGET,
            history_budget: crate::context::history::DEFAULT_HISTORY_BUDGET,
            relevance_threshold: crate::context::assembler::DEFAULT_RELEVANCE_THRESHOLD,
            weights: ScoringWeights::default(),
            system_template: composer::DEFAULT_SYSTEM_TEMPLATE.to_string(),
            temperature: 0.7,
            max_tokens: None,
        }
    }
}

impl EngineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            context_budget: config.context.max_context_tokens,
            history_budget: config.context.max_history_tokens,
            relevance_threshold: config.context.relevance_threshold,
            weights: ScoringWeights::default(),
            system_template: config
                .context
                .system_prompt
                .clone()
                .unwrap_or_else(|| composer::DEFAULT_SYSTEM_TEMPLATE.to_string()),
            temperature: config.default_temperature,
            max_tokens: config.default_max_tokens,
        }
    }
}

/// Result of a batch ingestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub loaded: usize,
    pub failed: usize,
    /// Pool size after the batch.
    pub pool_size: usize,
}

/// One line of the pool listing.
#[derive(Debug, Clone)]
pub struct InventoryEntry {
    pub path: String,
    pub name: String,
    pub lines: usize,
    pub tokens: usize,
    pub pinned: bool,
}

/// Snapshot of the pool for display.
#[derive(Debug, Clone, Default)]
pub struct PoolInventory {
    /// Loaded artifacts in pool order.
    pub entries: Vec<InventoryEntry>,
    pub failed: usize,
    pub total_tokens: usize,
}

/// A composed request and the context that went into it.
#[derive(Debug, Clone)]
pub struct ComposedRequest {
    pub messages: Vec<Message>,
    pub context: AssembledContext,
    /// History turns that survived trimming.
    pub history_turns: usize,
    /// Estimated tokens over all messages.
    pub tokens_in: usize,
}

/// One conversation's state.
pub struct Session {
    settings: EngineSettings,
    assembler: ContextAssembler,
    pool: ArtifactPool,
    pins: PinSet,
    mode: ContextMode,
    history: Vec<Message>,
    state: GenerationState,
    events: Option<Arc<EventBus>>,
}

impl Session {
    pub fn new(settings: EngineSettings) -> Self {
        let assembler = ContextAssembler::new(settings.context_budget, settings.relevance_threshold);
        Self {
            settings,
            assembler,
            pool: ArtifactPool::new(),
            pins: PinSet::new(),
            mode: ContextMode::default(),
            history: Vec::new(),
            state: GenerationState::Idle,
            events: None,
        }
    }

    /// Build a session from the application config, including its mode.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut session = Self::new(EngineSettings::from_config(config));
        match config.context.mode.parse::<ContextMode>() {
            Ok(mode) => session.mode = mode,
            Err(e) => warn!(error = %e, "Falling back to smart mode"),
        }
        session
    }

    /// Publish domain events on `bus`.
    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.events = Some(bus);
        self
    }

    fn publish(&self, event: DomainEvent) {
        if let Some(bus) = &self.events {
            bus.publish(event);
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn pool(&self) -> &ArtifactPool {
        &self.pool
    }

    pub fn pins(&self) -> &PinSet {
        &self.pins
    }

    pub fn mode(&self) -> ContextMode {
        self.mode
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn state(&self) -> GenerationState {
        self.state
    }

    // ── Ingestion ─────────────────────────────────────────────────────────

    /// Add (or replace) an artifact built from already-read content.
    pub fn ingest_artifact(&mut self, path: impl Into<String>, content: impl Into<String>) -> &Artifact {
        self.pool.insert(Artifact::from_content(path, content))
    }

    /// Record an artifact that could not be read.
    pub fn ingest_failure(&mut self, path: impl Into<String>, reason: impl Into<String>) -> &Artifact {
        self.pool.insert(Artifact::from_error(path, reason))
    }

    /// Ingest a batch of `(path, content or failure reason)` pairs.
    pub fn ingest_all<I>(&mut self, items: I) -> IngestReport
    where
        I: IntoIterator<Item = (String, Result<String, String>)>,
    {
        let mut report = IngestReport::default();
        for (path, outcome) in items {
            match outcome {
                Ok(content) => {
                    self.ingest_artifact(path, content);
                    report.loaded += 1;
                }
                Err(reason) => {
                    debug!(%path, %reason, "Recording failed artifact");
                    self.ingest_failure(path, reason);
                    report.failed += 1;
                }
            }
        }
        report.pool_size = self.pool.len();

        debug!(loaded = report.loaded, failed = report.failed, pool = report.pool_size, "Batch ingested");
        self.publish(DomainEvent::ArtifactsIngested {
            loaded: report.loaded,
            failed: report.failed,
            pool_size: report.pool_size,
            timestamp: Utc::now(),
        });
        report
    }

    // ── Pins and mode ─────────────────────────────────────────────────────

    /// Pin a name or path. Returns `false` if it was already pinned.
    pub fn pin(&mut self, identifier: impl Into<String>) -> bool {
        let added = self.pins.pin(identifier);
        if added {
            self.pins_changed();
        }
        added
    }

    /// Pin every loaded artifact whose name contains `pattern`
    /// (case-insensitive). Returns the names that matched.
    pub fn focus(&mut self, pattern: &str) -> Vec<String> {
        let needle = pattern.to_lowercase();
        let matched: Vec<(String, String)> = self
            .pool
            .loaded()
            .filter(|a| a.name.to_lowercase().contains(&needle))
            .map(|a| (a.name.clone(), a.path.clone()))
            .collect();

        for (_, path) in &matched {
            self.pins.pin(path.clone());
        }
        if !matched.is_empty() {
            self.pins_changed();
        }
        matched.into_iter().map(|(name, _)| name).collect()
    }

    /// Drop every pin. Returns how many were removed.
    pub fn clear_pins(&mut self) -> usize {
        let removed = self.pins.clear();
        if removed > 0 {
            self.pins_changed();
        }
        removed
    }

    fn pins_changed(&self) {
        debug!(pinned = self.pins.len(), "Pins changed");
        self.publish(DomainEvent::PinsChanged {
            pinned: self.pins.len(),
            timestamp: Utc::now(),
        });
    }

    pub fn set_mode(&mut self, mode: ContextMode) {
        if self.mode == mode {
            return;
        }
        debug!(from = %self.mode, to = %mode, "Mode changed");
        self.mode = mode;
        self.publish(DomainEvent::ModeChanged {
            mode: mode.to_string(),
            timestamp: Utc::now(),
        });
    }

    /// Listing of the pool for display.
    pub fn inventory(&self) -> PoolInventory {
        PoolInventory {
            entries: self
                .pool
                .loaded()
                .map(|a| InventoryEntry {
                    path: a.path.clone(),
                    name: a.name.clone(),
                    lines: a.lines,
                    tokens: a.tokens,
                    pinned: self.pins.matches(a),
                })
                .collect(),
            failed: self.pool.failed_count(),
            total_tokens: self.pool.total_tokens(),
        }
    }

    // ── Requests ──────────────────────────────────────────────────────────

    /// Score, assemble, trim and compose the request for `query`.
    pub fn assemble_request(&self, query: &str) -> Result<ComposedRequest, SessionError> {
        self.check_ready(query)?;
        Ok(self.compose_request(query))
    }

    fn check_ready(&self, query: &str) -> Result<(), SessionError> {
        if self.state != GenerationState::Idle {
            return Err(SessionError::Busy {
                state: self.state.to_string(),
            });
        }
        if query.trim().is_empty() {
            return Err(SessionError::EmptyQuery);
        }
        Ok(())
    }

    /// Leave `Idle` for `Assembling` and compose the request for `query`.
    /// The session stays in `Assembling` until the stream opens.
    fn begin_generation(&mut self, query: &str) -> Result<ComposedRequest, SessionError> {
        self.check_ready(query)?;
        self.state = GenerationState::Assembling;
        Ok(self.compose_request(query))
    }

    fn compose_request(&self, query: &str) -> ComposedRequest {
        let scored = score_artifacts(query, &self.pool, &self.pins, &self.settings.weights);
        let context = self.assembler.assemble(&scored, self.mode);
        let history = trim_history(&self.history, self.settings.history_budget);
        let preamble = composer::render_preamble(&self.settings.system_template, Local::now());
        let messages = composer::compose(preamble, history, &context.text, query);
        let tokens_in = token::estimate_messages_tokens(&messages);

        ComposedRequest {
            history_turns: history.len(),
            messages,
            context,
            tokens_in,
        }
    }

    /// Append a finished exchange to history.
    pub fn record_completed_turn(&mut self, query: impl Into<String>, reply: impl Into<String>) {
        self.history.push(Message::user(query));
        self.history.push(Message::assistant(reply));
    }

    /// Clear pool, pins and history together.
    pub fn reset_session(&mut self) {
        self.pool.clear();
        self.pins.clear();
        self.history.clear();
        debug!("Session reset");
        self.publish(DomainEvent::SessionReset { timestamp: Utc::now() });
    }

    /// Run one generation end to end.
    ///
    /// Completed and aborted replies are recorded in history; failed ones
    /// are not. The session is back to `Idle` when this returns.
    pub async fn generate<F>(
        &mut self,
        provider: &dyn Provider,
        model: &str,
        query: &str,
        cancel: &CancellationToken,
        on_delta: F,
    ) -> Result<GenerationOutcome, SessionError>
    where
        F: FnMut(&str),
    {
        let started = Instant::now();
        let composed = self.begin_generation(query)?;

        self.publish(DomainEvent::GenerationStarted {
            query_preview: query.chars().take(80).collect(),
            context_tokens: composed.context.used_tokens,
            history_turns: composed.history_turns,
            timestamp: Utc::now(),
        });

        let mut request = ProviderRequest::new(model, composed.messages);
        request.temperature = self.settings.temperature;
        request.max_tokens = self.settings.max_tokens;

        debug!(
            provider = provider.name(),
            model,
            tokens_in = composed.tokens_in,
            included = composed.context.included.len(),
            "Sending request"
        );

        let outcome = match provider.stream(request).await {
            Ok(rx) => {
                self.state = GenerationState::Streaming;
                let result = consume_stream(rx, cancel, on_delta).await;
                GenerationOutcome {
                    status: result.status,
                    tokens_out: token::estimate_tokens(&result.text),
                    text: result.text,
                    error: result.error,
                    tokens_in: composed.tokens_in,
                    elapsed: started.elapsed(),
                    usage: result.usage,
                }
            }
            Err(e) => GenerationOutcome {
                status: GenerationStatus::Failed,
                text: error_annotation(&e),
                error: Some(e),
                tokens_in: composed.tokens_in,
                tokens_out: 0,
                elapsed: started.elapsed(),
                usage: None,
            },
        };

        if outcome.status.is_recorded() {
            self.record_completed_turn(query, outcome.text.clone());
        }
        self.state = GenerationState::Idle;

        debug!(
            status = %outcome.status,
            tokens_out = outcome.tokens_out,
            elapsed_ms = outcome.elapsed.as_millis() as u64,
            "Generation finished"
        );
        self.publish(DomainEvent::GenerationFinished {
            status: outcome.status.to_string(),
            tokens_out: outcome.tokens_out,
            duration_ms: outcome.elapsed.as_millis() as u64,
            timestamp: Utc::now(),
        });

        Ok(outcome)
    }
}
