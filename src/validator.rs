//! Bounded, fail-closed pattern validation.
//!
//! Every detector is wrapped twice: input is truncated to a maximum length
//! before any matching, and each individual search runs under a hard
//! deadline on a watchdog thread. A search that times out or panics degrades
//! that one pattern to "not detected" — validator faults never reach the
//! caller.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::checksum;
use crate::patterns::{
    any_bounded_match, digit_bounded, CNPJ_RE, CPF_RE, EMAIL_RE, PHONE_BR_RE, RG_RE,
};
use crate::signals::PatternSignals;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Defensive cap on how many characters of a text are ever scanned.
pub const DEFAULT_MAX_TEXT_LENGTH: usize = 50_000;

/// Per-pattern search deadline. The matcher is linear-time, so this is a
/// safety net, not the primary defense.
pub const DEFAULT_SEARCH_DEADLINE: Duration = Duration::from_secs(1);

/// Static, process-lifetime validator configuration. Built once at startup
/// and never mutated afterwards; safe to share across threads.
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    pub max_text_length: usize,
    pub search_deadline: Duration,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_text_length: DEFAULT_MAX_TEXT_LENGTH,
            search_deadline: DEFAULT_SEARCH_DEADLINE,
        }
    }
}

// ---------------------------------------------------------------------------
// Validator
// ---------------------------------------------------------------------------

/// Runs the fixed detector set over a text. Stateless apart from the
/// read-only config; pure function of its input.
#[derive(Debug, Clone, Default)]
pub struct PatternValidator {
    config: ValidatorConfig,
}

impl PatternValidator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Run all five detectors. All booleans are always present; any internal
    /// failure (deadline, panic) yields `false` for that pattern only.
    pub fn validate_all(&self, text: &str) -> PatternSignals {
        if text.is_empty() {
            return PatternSignals::default();
        }

        let text: Arc<str> = Arc::from(truncate_chars(text, self.config.max_text_length));

        PatternSignals {
            has_cpf: self.guarded("cpf", &text, |t| contains_cpf(t)),
            has_cnpj: self.guarded("cnpj", &text, |t| any_bounded_match(&CNPJ_RE, t)),
            has_email: self.guarded("email", &text, |t| EMAIL_RE.is_match(t)),
            has_phone: self.guarded("phone", &text, |t| any_bounded_match(&PHONE_BR_RE, t)),
            has_rg: self.guarded("rg", &text, |t| any_bounded_match(&RG_RE, t)),
        }
    }

    /// Run one search on a watchdog thread and await the result under the
    /// deadline. The matcher cannot be interrupted cooperatively, so a
    /// timed-out search is abandoned; its thread finishes on its own and the
    /// send into the disconnected channel is discarded. A panicked search
    /// drops the sender, which surfaces here as a disconnect — both cases
    /// degrade to `false`.
    fn guarded(&self, name: &'static str, text: &Arc<str>, search: fn(&str) -> bool) -> bool {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let text = Arc::clone(text);
        std::thread::spawn(move || {
            let _ = tx.send(search(&text));
        });
        match rx.recv_timeout(self.config.search_deadline) {
            Ok(found) => found,
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                warn!(pattern = name, "pattern search deadline exceeded, degrading to not-detected");
                false
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                warn!(pattern = name, "pattern search failed, degrading to not-detected");
                false
            }
        }
    }
}

/// Truncate to at most `max` characters without splitting a UTF-8 boundary.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// ---------------------------------------------------------------------------
// Detectors
// ---------------------------------------------------------------------------

/// A CPF is present only if a shape match, bounded by non-digits, also
/// passes the mod-11 checksum. Numeric validity is mandatory here.
fn contains_cpf(text: &str) -> bool {
    CPF_RE.find_iter(text).any(|m| {
        if !digit_bounded(text, &m) {
            return false;
        }
        let digits: Vec<u8> = m
            .as_str()
            .bytes()
            .filter(u8::is_ascii_digit)
            .map(|b| b - b'0')
            .collect();
        checksum::valid_cpf(&digits)
    })
}
