//! Deterministic stand-in providers.
//!
//! These implement the provider traits from surface features alone so the
//! pipeline runs without a model runtime. They are stand-ins for the trained
//! context model and the entity tagger, not reimplementations of them.

pub mod context_score;
pub mod entity_lexicon;

pub use context_score::ContextScorer;
pub use entity_lexicon::LexiconTagger;
