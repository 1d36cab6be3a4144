//! Surface-feature context scorer.
//!
//! A deterministic [`ProbabilityProvider`] built from the same surface
//! features a feature-encoded classifier would see: digit density, PII cue
//! keywords, possessive phrasing, and a text-length bucket, combined into a
//! weighted score in [0,1].

use eyre::Result;

use crate::providers::ProbabilityProvider;

const DIGIT_DENSITY_WEIGHT: f64 = 0.35;
const CUE_KEYWORD_WEIGHT: f64 = 0.3;
const POSSESSIVE_WEIGHT: f64 = 0.15;
const LONG_TEXT_WEIGHT: f64 = 0.1;

/// Portuguese cue words that commonly introduce personal data.
const CUE_KEYWORDS: &[&str] = &[
    "cpf",
    "cnpj",
    "rg",
    "telefone",
    "celular",
    "email",
    "e-mail",
    "endereço",
    "endereco",
    "nascimento",
    "nome completo",
    "senha",
];

const POSSESSIVES: &[&str] = &["meu ", "minha ", "meus ", "minhas "];

#[derive(Debug, Clone, Copy, Default)]
pub struct ContextScorer;

impl ProbabilityProvider for ContextScorer {
    fn score(&self, text: &str) -> Result<f64> {
        if text.is_empty() {
            return Ok(0.0);
        }
        let lower = text.to_lowercase();

        let digit_count = text.chars().filter(char::is_ascii_digit).count();
        let density = digit_count as f64 / text.chars().count() as f64;

        let mut score = density * DIGIT_DENSITY_WEIGHT;
        if CUE_KEYWORDS.iter().any(|k| lower.contains(k)) {
            score += CUE_KEYWORD_WEIGHT;
        }
        if POSSESSIVES.iter().any(|p| lower.contains(p)) {
            score += POSSESSIVE_WEIGHT;
        }
        score += match text.chars().count() {
            0..=50 => 0.0,
            51..=200 => LONG_TEXT_WEIGHT / 2.0,
            _ => LONG_TEXT_WEIGHT,
        };

        Ok(score.clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_scheduling_text_scores_low() {
        let p = ContextScorer.score("Reunião às 14h").unwrap();
        assert!(p < 0.3, "got {}", p);
    }

    #[test]
    fn test_cue_plus_digits_scores_higher() {
        let low = ContextScorer.score("tudo bem com você hoje").unwrap();
        let high = ContextScorer
            .score("meu telefone é 98888-7777, pode anotar")
            .unwrap();
        assert!(high > low, "cues must raise the score: {} vs {}", high, low);
        assert!(high > 0.3);
    }

    #[test]
    fn test_empty_text_scores_zero() {
        assert_eq!(ContextScorer.score("").unwrap(), 0.0);
    }

    #[test]
    fn test_score_in_unit_interval() {
        let long_digits = "9".repeat(500);
        let texts = [
            "1234567890",
            "meu cpf, meu rg, minha senha: 111",
            long_digits.as_str(),
        ];
        for t in texts {
            let p = ContextScorer.score(t).unwrap();
            assert!((0.0..=1.0).contains(&p), "{} out of range for {:?}", p, t);
        }
    }
}
