//! Signal-fusion decision engine.
//!
//! Combines pattern signals, a context-model probability, and named-entity
//! signals into one verdict through an ordered rule policy. Rule 1
//! guarantees recall on checksummed evidence regardless of model quality;
//! rules 2-4 let the probabilistic signal recover contextual PII that regex
//! cannot express, gated so that spurious model confidence needs
//! corroboration. The entity provider is the most expensive call and is
//! invoked lazily, only once rules 1 and 2 have failed and the probability
//! clears the moderate bar.

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::providers::{EntitySignalProvider, ProbabilityProvider};
use crate::signals::{EntitySignals, Reason, SignalBundle, Verdict};
use crate::validator::PatternValidator;

// ---------------------------------------------------------------------------
// Rule constants
// ---------------------------------------------------------------------------

/// Above this, the model is trusted on its own (rule 2).
pub const HIGH_CONFIDENCE_THRESHOLD: f64 = 0.8;
/// Above this, the model's vote counts if an entity corroborates it (rule 3).
pub const MODERATE_THRESHOLD: f64 = 0.4;
/// Minimum model support for a phone-shaped match to be trusted (rule 4).
pub const PHONE_MIN_THRESHOLD: f64 = 0.3;
/// Fallback decision threshold (rule 5) when the caller supplies none.
pub const DEFAULT_THRESHOLD: f64 = 0.5;
/// Fixed confidence reported for a corroborated phone match.
pub const PHONE_CONFIDENCE: f64 = 0.85;
/// Confidence boost applied on the entity-corroboration path. Deliberately
/// not clamped to 1.0.
pub const ENTITY_SUPPORT_BOOST: f64 = 0.1;
/// Substitute probability when the provider faults on a text.
pub const PROBABILITY_FALLBACK: f64 = 0.0;

/// The four tunable thresholds plus the fixed phone confidence, as one
/// immutable value handed to the engine at startup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionThresholds {
    pub high_confidence: f64,
    pub moderate: f64,
    pub phone_min: f64,
    pub decision: f64,
    pub phone_confidence: f64,
}

impl Default for FusionThresholds {
    fn default() -> Self {
        Self {
            high_confidence: HIGH_CONFIDENCE_THRESHOLD,
            moderate: MODERATE_THRESHOLD,
            phone_min: PHONE_MIN_THRESHOLD,
            decision: DEFAULT_THRESHOLD,
            phone_confidence: PHONE_CONFIDENCE,
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Orchestrates the validator and the two providers. Holds no mutable
/// cross-call state: identical inputs and provider outputs yield
/// bit-identical verdicts.
pub struct FusionEngine<P, E> {
    validator: PatternValidator,
    scorer: P,
    tagger: E,
    thresholds: FusionThresholds,
}

impl<P, E> FusionEngine<P, E>
where
    P: ProbabilityProvider,
    E: EntitySignalProvider,
{
    pub fn new(validator: PatternValidator, scorer: P, tagger: E) -> Self {
        Self::with_thresholds(validator, scorer, tagger, FusionThresholds::default())
    }

    pub fn with_thresholds(
        validator: PatternValidator,
        scorer: P,
        tagger: E,
        thresholds: FusionThresholds,
    ) -> Self {
        Self {
            validator,
            scorer,
            tagger,
            thresholds,
        }
    }

    pub fn thresholds(&self) -> &FusionThresholds {
        &self.thresholds
    }

    /// Classify one text with the engine's default decision threshold.
    pub fn classify(&self, text: &str) -> Verdict {
        self.classify_with_threshold(text, self.thresholds.decision)
    }

    /// Classify one text. `threshold` affects only the rule-5 fallback; all
    /// other rules are threshold-independent.
    pub fn classify_with_threshold(&self, text: &str, threshold: f64) -> Verdict {
        // Rule 1 — strong deterministic evidence wins outright. Cheapest
        // check first; neither provider is consulted on this path.
        let pattern = self.validator.validate_all(text);
        if pattern.strong_match() {
            debug!(reason = %Reason::StrongPatternMatch, "verdict");
            return Verdict {
                is_pii: true,
                confidence: 1.0,
                reason: Reason::StrongPatternMatch,
                signals: SignalBundle {
                    pattern: Some(pattern),
                    probability: None,
                    entity: None,
                },
            };
        }

        let probability = self.probability_or_fallback(text);

        // Rule 2 — the model alone, when very confident.
        if probability > self.thresholds.high_confidence {
            debug!(probability, reason = %Reason::HighModelConfidence, "verdict");
            return Verdict {
                is_pii: true,
                confidence: probability,
                reason: Reason::HighModelConfidence,
                signals: SignalBundle {
                    pattern: Some(pattern),
                    probability: Some(probability),
                    entity: None,
                },
            };
        }

        // Rule 3 — moderate model confidence, corroborated by a person or
        // location entity. Entity extraction is deferred to this point.
        let mut entity: Option<EntitySignals> = None;
        if probability > self.thresholds.moderate {
            let signals = self.entities_or_fallback(text);
            if signals.has_person_or_location() {
                debug!(probability, reason = %Reason::ModerateModelEntitySupport, "verdict");
                return Verdict {
                    is_pii: true,
                    confidence: probability + ENTITY_SUPPORT_BOOST,
                    reason: Reason::ModerateModelEntitySupport,
                    signals: SignalBundle {
                        pattern: Some(pattern),
                        probability: Some(probability),
                        entity: Some(signals),
                    },
                };
            }
            entity = Some(signals);
        }

        // Rule 4 — phone-shaped digit runs are easily confused with dates;
        // they need minimal model support before being trusted.
        if pattern.has_phone && probability > self.thresholds.phone_min {
            debug!(probability, reason = %Reason::PhonePatternWeakContext, "verdict");
            return Verdict {
                is_pii: true,
                confidence: self.thresholds.phone_confidence,
                reason: Reason::PhonePatternWeakContext,
                signals: SignalBundle {
                    pattern: Some(pattern),
                    probability: Some(probability),
                    entity,
                },
            };
        }

        // Rule 5 — fallback to the plain threshold comparison.
        let is_pii = probability >= threshold;
        debug!(probability, is_pii, reason = %Reason::ThresholdDecision, "verdict");
        Verdict {
            is_pii,
            confidence: probability,
            reason: Reason::ThresholdDecision,
            signals: SignalBundle {
                pattern: Some(pattern),
                probability: Some(probability),
                entity,
            },
        }
    }

    /// Parallel map over many texts. The validator is pure and the engine
    /// holds no mutable state, so texts are independent.
    pub fn classify_batch(&self, texts: &[String], threshold: f64) -> Vec<Verdict> {
        texts
            .par_iter()
            .map(|t| self.classify_with_threshold(t, threshold))
            .collect()
    }

    /// One faulting provider call must never abort classification of a text:
    /// a fault, an out-of-range value, or NaN degrades to the neutral
    /// fallback and evaluation continues.
    fn probability_or_fallback(&self, text: &str) -> f64 {
        match self.scorer.score(text) {
            Ok(p) if (0.0..=1.0).contains(&p) => p,
            Ok(p) => {
                warn!(probability = p, "probability out of [0,1], using fallback");
                PROBABILITY_FALLBACK
            }
            Err(e) => {
                warn!(error = %e, "probability provider failed, using fallback");
                PROBABILITY_FALLBACK
            }
        }
    }

    fn entities_or_fallback(&self, text: &str) -> EntitySignals {
        match self.tagger.signals(text) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "entity provider failed, using empty signals");
                EntitySignals::default()
            }
        }
    }
}
