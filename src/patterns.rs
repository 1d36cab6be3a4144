//! Pre-compiled regex patterns for the PII detectors.
//!
//! All patterns are compiled once per process via `LazyLock` and shared
//! read-only across calls. The `regex` crate has no lookaround, so the
//! non-digit boundary the document patterns need ("must not sit inside a
//! longer digit run") is enforced separately via [`digit_bounded`].

use regex::{Match, Regex};
use std::sync::LazyLock;

// ---------------------------------------------------------------------------
// Document patterns
// ---------------------------------------------------------------------------

/// CPF: 11 digits, optionally grouped xxx.xxx.xxx-xx. Matches are candidates
/// only — the mod-11 checksum decides acceptance.
pub static CPF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{3}\.?\d{3}\.?\d{3}-?\d{2}").unwrap());

/// CNPJ: 14 digits, canonical xx.xxx.xxx/xxxx-xx or contiguous. Pattern-only.
pub static CNPJ_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{2}\.?\d{3}\.?\d{3}/?\d{4}-?\d{2}").unwrap());

/// RG (heuristic): dd.ddd.ddd with an optional check character (digit or X).
pub static RG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{1,2}\.?\d{3}\.?\d{3}(?:-?[0-9Xx])?").unwrap());

// ---------------------------------------------------------------------------
// Contact patterns
// ---------------------------------------------------------------------------

/// RFC-light email: bounded local part (1-64 chars), dot-separated labels,
/// alphabetic TLD of 2-63 chars.
pub static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@(?:[a-z0-9-]+\.)+[a-z]{2,63}\b")
        .unwrap()
});

/// Brazilian phone. Two forms:
/// with area code — optional +55, optional (xx), then mobile 9xxxx-xxxx or
/// landline xxxx-xxxx; without area code — mobile only.
pub static PHONE_BR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:(?:\+?55\s?)?\(?\d{2}\)?[\s.-]?(?:9\d{4}[-.\s]?\d{4}|\d{4}[-.]\d{4})|9\d{4}[-.\s]?\d{4})",
    )
    .unwrap()
});

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// True when the match is not embedded in a longer digit run: the byte just
/// before the match start and the byte just after the match end must not be
/// ASCII digits. Byte-level checks are safe here because no UTF-8
/// continuation byte is an ASCII digit.
pub fn digit_bounded(text: &str, m: &Match<'_>) -> bool {
    let bytes = text.as_bytes();
    let before_ok = m.start() == 0 || !bytes[m.start() - 1].is_ascii_digit();
    let after_ok = m.end() == bytes.len() || !bytes[m.end()].is_ascii_digit();
    before_ok && after_ok
}

/// Does `re` have at least one match that is bounded by non-digits?
pub fn any_bounded_match(re: &Regex, text: &str) -> bool {
    re.find_iter(text).any(|m| digit_bounded(text, &m))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpf_pattern_shapes() {
        assert!(CPF_RE.is_match("123.456.789-09"));
        assert!(CPF_RE.is_match("12345678909"));
        assert!(CPF_RE.is_match("123456789-09"));
        assert!(!CPF_RE.is_match("123.456.78"));
    }

    #[test]
    fn test_cnpj_pattern_shapes() {
        assert!(CNPJ_RE.is_match("12.345.678/0001-95"));
        assert!(CNPJ_RE.is_match("12345678000195"));
        assert!(!CNPJ_RE.is_match("12.345.678"));
    }

    #[test]
    fn test_email_pattern() {
        assert!(EMAIL_RE.is_match("maria.silva@example.com.br"));
        assert!(EMAIL_RE.is_match("USER+tag@EXAMPLE.ORG"));
        assert!(!EMAIL_RE.is_match("invalid@"));
        assert!(!EMAIL_RE.is_match("@example.com"));
    }

    #[test]
    fn test_phone_pattern_with_area_code() {
        assert!(PHONE_BR_RE.is_match("(61) 98888-7777"));
        assert!(PHONE_BR_RE.is_match("+55 61 98888-7777"));
        assert!(PHONE_BR_RE.is_match("61 3333-4444"));
    }

    #[test]
    fn test_phone_pattern_mobile_without_area_code() {
        assert!(PHONE_BR_RE.is_match("98888-7777"));
        // Landline without area code is not accepted as a phone on its own.
        assert!(!PHONE_BR_RE.is_match("3333-4444"));
    }

    #[test]
    fn test_rg_pattern() {
        assert!(RG_RE.is_match("12.345.678-9"));
        assert!(RG_RE.is_match("12.345.678-X"));
        assert!(RG_RE.is_match("1.234.567"));
    }

    #[test]
    fn test_digit_bounded_rejects_embedded_runs() {
        let text = "9912345678909";
        let m = CPF_RE.find(text).unwrap();
        assert!(!digit_bounded(text, &m), "match inside a digit run");
        assert!(!any_bounded_match(&CPF_RE, text));

        let text = "cpf: 12345678909.";
        assert!(any_bounded_match(&CPF_RE, text));
    }

    #[test]
    fn test_digit_bounded_at_string_edges() {
        let text = "12345678909";
        let m = CPF_RE.find(text).unwrap();
        assert!(digit_bounded(text, &m));
    }
}
