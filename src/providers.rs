//! Capability interfaces for the external model collaborators.
//!
//! The fusion core consumes a scalar probability and a small entity-signal
//! record; how those are produced (tokenization, inference, tagging) lives
//! behind these traits. Deterministic stand-ins ship under [`crate::models`];
//! tests use fixed stubs.

use eyre::Result;

use crate::signals::EntitySignals;

/// Estimates the probability that a text contains PII, in [0,1].
///
/// May be computationally expensive. Implementations must not mutate the
/// input and should be pure for a fixed model snapshot — the fusion engine's
/// determinism guarantee is only as good as its providers'.
pub trait ProbabilityProvider: Send + Sync {
    fn score(&self, text: &str) -> Result<f64>;
}

/// Extracts named-entity signals (person, location, organization) from a
/// text. The most expensive collaborator; the fusion engine calls it lazily.
pub trait EntitySignalProvider: Send + Sync {
    fn signals(&self, text: &str) -> Result<EntitySignals>;

    /// Batch variant for throughput when entity signals are needed for many
    /// texts at once. The default maps sequentially; implementations backed
    /// by a batching runtime should override it.
    fn signals_batch(&self, texts: &[&str]) -> Result<Vec<EntitySignals>> {
        texts.iter().map(|t| self.signals(t)).collect()
    }
}
