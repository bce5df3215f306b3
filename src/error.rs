//! Error handling for SpikeViz-RS
//!
//! This module defines the crate error type, a Result alias, and the
//! diagnostics list that collects recoverable problems found while
//! resolving connectivity, generating layouts and building scene geometry.
//!
//! Nothing on the render path returns a fatal error: callers convert
//! [`SpikeVizError`] values into [`Diagnostic`] entries and carry on with
//! the next entity or frame.

use crate::model::EntityId;
use thiserror::Error;

/// Main error type for SpikeViz-RS operations
#[derive(Error, Debug)]
pub enum SpikeVizError {
    /// A pattern cannot be applied to the given layouts
    #[error("Pattern mismatch: {0}")]
    PatternMismatch(String),

    /// An explicit link refers to a neuron outside the current layout
    #[error("Link {src} -> {dst} out of range (source size {src_len}, destination size {dst_len})")]
    LinkOutOfRange {
        src: u32,
        dst: u32,
        src_len: usize,
        dst_len: usize,
    },

    /// An entity reference no longer resolves in the network model
    #[error("Stale entity reference {0:?}")]
    StaleEntity(EntityId),

    /// The entity exists but has the wrong kind for the operation
    #[error("Entity {id:?} is not a {expected}")]
    WrongKind { id: EntityId, expected: &'static str },

    /// Layout generation reported a problem
    #[error("Layout error: {0}")]
    Layout(String),

    /// A connection generator failed to regenerate its list
    #[error("Generator error: {0}")]
    Generator(String),

    /// The user declined a regeneration request
    #[error("Regeneration declined for {0:?}")]
    GenerationDeclined(EntityId),

    /// Errors related to Rhai script execution
    #[error("Script error: {0}")]
    Script(String),

    /// A recorded log could not be read or does not fit its population
    #[error("Log error: {0}")]
    Log(String),

    /// Errors related to curve metadata documents
    #[error("Metadata error: {0}")]
    Metadata(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors related to channel communication
    #[error("Channel error: {0}")]
    Channel(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<SpikeVizError>,
    },
}

impl SpikeVizError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        SpikeVizError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create a script error from a Rhai error
    pub fn from_rhai_error(err: Box<rhai::EvalAltResult>) -> Self {
        SpikeVizError::Script(err.to_string())
    }

    /// Severity used when this error is recorded as a diagnostic
    pub fn severity(&self) -> Severity {
        match self {
            SpikeVizError::StaleEntity(_) | SpikeVizError::GenerationDeclined(_) => Severity::Info,
            SpikeVizError::PatternMismatch(_)
            | SpikeVizError::LinkOutOfRange { .. }
            | SpikeVizError::Layout(_)
            | SpikeVizError::Log(_) => Severity::Warning,
            SpikeVizError::WithContext { source, .. } => source.severity(),
            _ => Severity::Error,
        }
    }
}

/// Result type alias for SpikeViz-RS operations
pub type Result<T> = std::result::Result<T, SpikeVizError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, Box<rhai::EvalAltResult>> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| SpikeVizError::from_rhai_error(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| SpikeVizError::from_rhai_error(e).with_context(f()))
    }
}

// ==================== Diagnostics ====================

/// How serious a recorded problem is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// One recoverable problem, routed to the status surface
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// Entity the problem was found on, if any
    pub entity: Option<EntityId>,
}

/// Accumulated diagnostics for one load/resolve/render pass.
///
/// Replaces any global warning channel: every operation that can degrade
/// gracefully takes `&mut Diagnostics` or returns one.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
    skipped_links: usize,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error as a diagnostic
    pub fn push_error(&mut self, entity: Option<EntityId>, err: &SpikeVizError) {
        self.push(err.severity(), entity, err.to_string());
    }

    /// Record a plain message
    pub fn push(&mut self, severity: Severity, entity: Option<EntityId>, message: impl Into<String>) {
        let message = message.into();
        match severity {
            Severity::Info => tracing::debug!("{}", message),
            Severity::Warning => tracing::warn!("{}", message),
            Severity::Error => tracing::error!("{}", message),
        }
        self.entries.push(Diagnostic {
            severity,
            message,
            entity,
        });
    }

    /// Count links that were dropped because an index was out of range
    pub fn add_skipped_links(&mut self, count: usize) {
        self.skipped_links += count;
    }

    /// Total number of links skipped since the last clear
    pub fn skipped_links(&self) -> usize {
        self.skipped_links
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.skipped_links == 0
    }

    /// Move all entries of `other` into `self`
    pub fn merge(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
        self.skipped_links += other.skipped_links;
    }

    /// Drain the entries for display, keeping the skipped count
    pub fn drain(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.entries)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.skipped_links = 0;
    }
}
