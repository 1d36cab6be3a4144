//! Rule-based entity tagger.
//!
//! Person mentions are runs of two or more capitalized words (single
//! capitalized words are ignored — too easily confused with sentence starts
//! and common nouns). Locations and organizations come from small Portuguese
//! gazetteers of cue words.

use eyre::Result;

use crate::providers::EntitySignalProvider;
use crate::signals::EntitySignals;

/// Lowercase connectives allowed inside a name run ("João de Souza").
const NAME_CONNECTIVES: &[&str] = &["de", "da", "do", "das", "dos", "e"];

/// Words that are capitalized for grammatical reasons, never name parts.
const STOPWORDS: &[&str] = &[
    "o", "a", "os", "as", "um", "uma", "meu", "minha", "eu", "não", "sim", "em", "no", "na",
    "por", "para", "com", "sem", "que", "se",
];

const LOCATION_CUES: &[&str] = &[
    "rua ",
    "avenida ",
    "av. ",
    "bairro ",
    "cep ",
    "são paulo",
    "rio de janeiro",
    "brasília",
    "belo horizonte",
    "porto alegre",
    "salvador",
    "curitiba",
    "recife",
    "fortaleza",
];

const ORGANIZATION_CUES: &[&str] = &[
    "ltda",
    "s.a.",
    "s/a",
    "eireli",
    "prefeitura",
    "ministério",
    "secretaria",
    "universidade",
    "empresa",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconTagger;

impl EntitySignalProvider for LexiconTagger {
    fn signals(&self, text: &str) -> Result<EntitySignals> {
        let persons = count_name_runs(text);
        let lower = text.to_lowercase();
        let locations = count_cues(&lower, LOCATION_CUES);
        let organizations = count_cues(&lower, ORGANIZATION_CUES);

        Ok(EntitySignals {
            has_person_entity: persons > 0,
            has_location_entity: locations > 0,
            has_organization_entity: organizations > 0,
            person_entity_count: persons,
            location_entity_count: locations,
            organization_entity_count: organizations,
            total_entities: persons + locations + organizations,
        })
    }
}

fn count_cues(lower: &str, cues: &[&str]) -> usize {
    cues.iter().filter(|c| lower.contains(*c)).count()
}

/// Count maximal runs of >= 2 name-like words. All-caps tokens are treated
/// as acronyms, not names.
fn count_name_runs(text: &str) -> usize {
    let mut runs = 0;
    let mut current = 0;

    for raw in text.split_whitespace() {
        let word: String = raw.chars().filter(|c| c.is_alphabetic()).collect();
        if word.is_empty() {
            if current >= 2 {
                runs += 1;
            }
            current = 0;
            continue;
        }
        let lower = word.to_lowercase();
        if current > 0 && NAME_CONNECTIVES.contains(&lower.as_str()) {
            continue;
        }
        if is_name_like(&word) && !STOPWORDS.contains(&lower.as_str()) {
            current += 1;
        } else {
            if current >= 2 {
                runs += 1;
            }
            current = 0;
        }
    }
    if current >= 2 {
        runs += 1;
    }
    runs
}

fn is_name_like(word: &str) -> bool {
    let mut chars = word.chars();
    let first_upper = chars.next().is_some_and(|c| c.is_uppercase());
    let rest_lower = chars.all(|c| c.is_lowercase());
    first_upper && rest_lower && word.chars().count() >= 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_word_name_detected() {
        let sig = LexiconTagger.signals("Falei com João Silva ontem").unwrap();
        assert!(sig.has_person_entity);
        assert_eq!(sig.person_entity_count, 1);
    }

    #[test]
    fn test_name_with_connective_is_one_run() {
        let sig = LexiconTagger.signals("Maria de Souza compareceu").unwrap();
        assert_eq!(sig.person_entity_count, 1);
    }

    #[test]
    fn test_single_capitalized_word_ignored() {
        let sig = LexiconTagger.signals("Reunião amanhã cedo").unwrap();
        assert!(!sig.has_person_entity);
    }

    #[test]
    fn test_acronyms_not_names() {
        let sig = LexiconTagger.signals("Meu CPF está bloqueado").unwrap();
        assert!(!sig.has_person_entity, "possessive + acronym is not a name");
    }

    #[test]
    fn test_location_cues() {
        let sig = LexiconTagger
            .signals("moro na Rua das Flores, bairro Centro")
            .unwrap();
        assert!(sig.has_location_entity);
    }

    #[test]
    fn test_organization_cues() {
        let sig = LexiconTagger.signals("a empresa Acme Ltda respondeu").unwrap();
        assert!(sig.has_organization_entity);
    }

    #[test]
    fn test_empty_text_no_entities() {
        let sig = LexiconTagger.signals("").unwrap();
        assert_eq!(sig, EntitySignals::default());
        assert_eq!(sig.total_entities, 0);
    }
}
