//! Error types.
//!
//! Two tiers: [`ParseError`] is fatal and ends a run, [`Diagnostic`] is a
//! recoverable markup problem that is logged and counted while processing
//! continues with a best-effort fallback.

use thiserror::Error;
use tracing::warn;

use crate::scanner::Group;

/// Fatal errors: the input cannot be read or its framing is broken.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("broken entry framing at line {line}: {message}")]
    Framing { line: usize, message: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to serialize document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Recoverable, per-line markup problems.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    #[error("unterminated {group} region starting at byte {offset}")]
    UnterminatedRegion { group: Group, offset: usize },

    #[error("label qualifier {0:?} has no label after it")]
    DanglingQualifier(String),

    #[error("label combiner {0:?} has no label after it")]
    DanglingCombiner(String),

    #[error("unrecognized annotation {0:?}")]
    UnknownAnnotation(String),

    #[error("definition line has no gloss text: {0:?}")]
    EmptyDefinition(String),
}

/// Accumulates diagnostics for the entry currently being processed.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        warn!("{}", diagnostic);
        self.entries.push(diagnostic);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Empty the accumulator, returning how many diagnostics it held.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }
}
