//! Signal records and the final verdict type produced by the fusion engine.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Pattern signals
// ---------------------------------------------------------------------------

/// One boolean per pattern detector. Produced fresh per call by
/// [`crate::validator::PatternValidator::validate_all`]; never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternSignals {
    pub has_cpf: bool,
    pub has_cnpj: bool,
    pub has_email: bool,
    pub has_phone: bool,
    pub has_rg: bool,
}

impl PatternSignals {
    /// Strong deterministic evidence: checksummed or shape-unambiguous
    /// document patterns. Phone is deliberately excluded — bare digit runs
    /// are too easily confused with dates and need model corroboration.
    pub fn strong_match(&self) -> bool {
        self.has_cpf || self.has_cnpj || self.has_email || self.has_rg
    }

    pub fn any(&self) -> bool {
        self.strong_match() || self.has_phone
    }
}

// ---------------------------------------------------------------------------
// Entity signals
// ---------------------------------------------------------------------------

/// Named-entity signals from the external entity provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySignals {
    pub has_person_entity: bool,
    pub has_location_entity: bool,
    pub has_organization_entity: bool,
    pub person_entity_count: usize,
    pub location_entity_count: usize,
    pub organization_entity_count: usize,
    pub total_entities: usize,
}

impl EntitySignals {
    pub fn has_person_or_location(&self) -> bool {
        self.has_person_entity || self.has_location_entity
    }
}

// ---------------------------------------------------------------------------
// Reason tags
// ---------------------------------------------------------------------------

/// Which fusion rule produced the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    StrongPatternMatch,
    HighModelConfidence,
    ModerateModelEntitySupport,
    PhonePatternWeakContext,
    ThresholdDecision,
}

impl Reason {
    /// Human-readable justification tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StrongPatternMatch => "strong pattern match",
            Self::HighModelConfidence => "high model confidence",
            Self::ModerateModelEntitySupport => "moderate model + entity support",
            Self::PhonePatternWeakContext => "phone pattern + weak model context",
            Self::ThresholdDecision => "threshold decision",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

/// The raw signals that were actually computed for one classification.
/// Lazily-evaluated sources stay `None` when a rule short-circuited before
/// they were needed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalBundle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<PatternSignals>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<EntitySignals>,
}

/// Final output of the fusion engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub is_pii: bool,
    pub confidence: f64,
    pub reason: Reason,
    pub signals: SignalBundle,
}
