//! Non-fatal diagnostics raised while normalizing a configuration.

use std::sync::Mutex;

/// Identifies the kind of diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticCode {
    /// `base` was inferred from the pathname of `site`.
    BaseInferredFromSite,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BaseInferredFromSite => "base-inferred-from-site",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub message: String,
}

/// Receives warnings emitted during normalization.
///
/// Sinks are held across the PostCSS lookup, so they must be shareable between
/// threads for the resolution future to be `Send`.
pub trait DiagnosticSink: Send + Sync {
    fn warn(&self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to `tracing` at WARN level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn warn(&self, diagnostic: Diagnostic) {
        tracing::warn!(code = diagnostic.code.as_str(), "{}", diagnostic.message);
    }
}

/// Keeps diagnostics in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything received so far.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics
            .lock()
            .map(|d| d.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl DiagnosticSink for MemorySink {
    fn warn(&self, diagnostic: Diagnostic) {
        match self.diagnostics.lock() {
            Ok(mut d) => d.push(diagnostic),
            Err(poisoned) => poisoned.into_inner().push(diagnostic),
        }
    }
}
