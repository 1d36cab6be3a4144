//! piifuse — hybrid PII detection for Brazilian Portuguese free text.
//!
//! Three signal sources feed one decision: bounded regex validators (CPF
//! with mod-11 checksum, CNPJ, email, phone, RG), a context-model
//! probability, and named-entity signals. The [`fusion::FusionEngine`]
//! combines them through an ordered rule policy into a [`signals::Verdict`].

pub mod checksum;
pub mod fusion;
pub mod models;
pub mod patterns;
pub mod providers;
pub mod signals;
pub mod validator;

use eyre::{Result, WrapErr};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use fusion::FusionThresholds;
use validator::ValidatorConfig;

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

#[derive(Deserialize, Clone, Debug, Default)]
pub struct PipelineConfig {
    pub thresholds: Option<ThresholdsConfig>,
    pub validator: Option<ValidatorSettings>,
    pub settings: Option<SettingsConfig>,
}

/// Overrides for the fusion rule constants. Anything unset falls back to the
/// documented defaults.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct ThresholdsConfig {
    pub high_confidence: Option<f64>,
    pub moderate: Option<f64>,
    pub phone_min: Option<f64>,
    pub decision: Option<f64>,
    pub phone_confidence: Option<f64>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct ValidatorSettings {
    pub max_text_length: Option<usize>,
    pub search_deadline_ms: Option<u64>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct SettingsConfig {
    pub history_dir: Option<String>,
    /// Maximum history file size in bytes before rotation (default: 10MB).
    pub max_history_bytes: Option<u64>,
}

impl PipelineConfig {
    pub fn fusion_thresholds(&self) -> FusionThresholds {
        let defaults = FusionThresholds::default();
        let t = self.thresholds.clone().unwrap_or_default();
        FusionThresholds {
            high_confidence: t.high_confidence.unwrap_or(defaults.high_confidence),
            moderate: t.moderate.unwrap_or(defaults.moderate),
            phone_min: t.phone_min.unwrap_or(defaults.phone_min),
            decision: t.decision.unwrap_or(defaults.decision),
            phone_confidence: t.phone_confidence.unwrap_or(defaults.phone_confidence),
        }
    }

    pub fn validator_config(&self) -> ValidatorConfig {
        let defaults = ValidatorConfig::default();
        let v = self.validator.clone().unwrap_or_default();
        ValidatorConfig {
            max_text_length: v.max_text_length.unwrap_or(defaults.max_text_length),
            search_deadline: v
                .search_deadline_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.search_deadline),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".piifuse")
}

/// Load the optional config file. A missing file is fine (`None`); a file
/// that exists but does not parse is a startup error, not something to
/// silently ignore.
pub fn load_config() -> Result<Option<PipelineConfig>> {
    let config_path = config_dir().join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)
        .wrap_err_with(|| format!("failed to read {}", config_path.display()))?;
    let config: PipelineConfig = toml::from_str(&content)
        .wrap_err_with(|| format!("failed to parse {}", config_path.display()))?;
    Ok(Some(config))
}

/// Validate a config, returning a list of warnings and errors.
pub fn validate_config(config: &PipelineConfig) -> Vec<String> {
    let mut issues = Vec::new();

    if let Some(ref t) = config.thresholds {
        let named = [
            ("high_confidence", t.high_confidence),
            ("moderate", t.moderate),
            ("phone_min", t.phone_min),
            ("decision", t.decision),
            ("phone_confidence", t.phone_confidence),
        ];
        for (name, value) in named {
            if let Some(v) = value {
                if !(0.0..=1.0).contains(&v) {
                    issues.push(format!(
                        "ERROR: threshold '{}' is {}, expected a value in [0,1]",
                        name, v
                    ));
                }
            }
        }
        let resolved = config.fusion_thresholds();
        if resolved.moderate >= resolved.high_confidence {
            issues.push(format!(
                "WARNING: moderate threshold {} >= high_confidence {}, rule 3 can never fire",
                resolved.moderate, resolved.high_confidence
            ));
        }
        if resolved.phone_min > resolved.moderate {
            issues.push(format!(
                "WARNING: phone_min {} > moderate {}",
                resolved.phone_min, resolved.moderate
            ));
        }
    }

    if let Some(ref v) = config.validator {
        if v.max_text_length == Some(0) {
            issues.push("ERROR: validator max_text_length must be > 0".to_string());
        }
        if v.search_deadline_ms == Some(0) {
            issues.push(
                "WARNING: search_deadline_ms of 0 degrades every pattern to not-detected"
                    .to_string(),
            );
        }
    }

    if let Some(ref s) = config.settings {
        if let Some(ref hd) = s.history_dir {
            let p = PathBuf::from(hd);
            if p.exists() && !p.is_dir() {
                issues.push(format!(
                    "ERROR: history_dir '{}' exists but is not a directory",
                    hd
                ));
            }
        }
    }

    issues
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

const DEFAULT_MAX_HISTORY_BYTES: u64 = 10 * 1024 * 1024; // 10 MB

pub fn history_path(config: Option<&PipelineConfig>) -> PathBuf {
    config
        .and_then(|c| c.settings.as_ref())
        .and_then(|s| s.history_dir.as_ref())
        .map(|p| PathBuf::from(p).join("history.jsonl"))
        .unwrap_or_else(|| config_dir().join("history.jsonl"))
}

/// Rotate the history file once it exceeds the configured max size: the
/// current file moves aside to a `.1` sidecar (replacing any previous
/// sidecar) and a fresh file starts on the next append. Rotation failures
/// are logged, not fatal — history is best-effort.
pub fn rotate_history_if_needed(config: Option<&PipelineConfig>) {
    let hist = history_path(config);
    let max_bytes = config
        .and_then(|c| c.settings.as_ref())
        .and_then(|s| s.max_history_bytes)
        .unwrap_or(DEFAULT_MAX_HISTORY_BYTES);

    let size = match fs::metadata(&hist) {
        Ok(m) => m.len(),
        Err(_) => return, // no history yet
    };
    if size <= max_bytes {
        return;
    }

    let sidecar = hist.with_extension("jsonl.1");
    match fs::rename(&hist, &sidecar) {
        Ok(()) => info!(archived = %sidecar.display(), bytes = size, "rotated history file"),
        Err(e) => warn!(error = %e, "failed to rotate history file"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_resolves_to_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.fusion_thresholds(), FusionThresholds::default());
        let v = config.validator_config();
        assert_eq!(v.max_text_length, validator::DEFAULT_MAX_TEXT_LENGTH);
        assert_eq!(v.search_deadline, validator::DEFAULT_SEARCH_DEADLINE);
    }

    #[test]
    fn test_partial_threshold_override() {
        let config = PipelineConfig {
            thresholds: Some(ThresholdsConfig {
                decision: Some(0.7),
                ..Default::default()
            }),
            ..Default::default()
        };
        let t = config.fusion_thresholds();
        assert_eq!(t.decision, 0.7);
        assert_eq!(t.high_confidence, fusion::HIGH_CONFIDENCE_THRESHOLD);
    }

    #[test]
    fn test_validate_config_accepts_defaults() {
        assert!(validate_config(&PipelineConfig::default()).is_empty());
    }

    #[test]
    fn test_validate_config_rejects_out_of_range_threshold() {
        let config = PipelineConfig {
            thresholds: Some(ThresholdsConfig {
                high_confidence: Some(1.5),
                ..Default::default()
            }),
            ..Default::default()
        };
        let issues = validate_config(&config);
        assert!(issues.iter().any(|i| i.starts_with("ERROR")), "{:?}", issues);
    }

    #[test]
    fn test_validate_config_warns_on_inverted_thresholds() {
        let config = PipelineConfig {
            thresholds: Some(ThresholdsConfig {
                moderate: Some(0.9),
                ..Default::default()
            }),
            ..Default::default()
        };
        let issues = validate_config(&config);
        assert!(issues.iter().any(|i| i.contains("rule 3")), "{:?}", issues);
    }

    #[test]
    fn test_history_rotation_archives_to_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            settings: Some(SettingsConfig {
                history_dir: Some(dir.path().to_string_lossy().into_owned()),
                max_history_bytes: Some(64),
            }),
            ..Default::default()
        };
        let hist = history_path(Some(&config));
        let mut content = String::new();
        for i in 0..10 {
            content.push_str(&format!("{{\"entry\":{}}}\n", i));
        }
        fs::write(&hist, &content).unwrap();

        rotate_history_if_needed(Some(&config));
        assert!(!hist.exists(), "oversized file must be moved aside");
        let sidecar = hist.with_extension("jsonl.1");
        assert_eq!(
            fs::read_to_string(&sidecar).unwrap(),
            content,
            "archived entries must be intact"
        );

        // Under the limit nothing moves, and a missing file is a no-op.
        fs::write(&hist, "{\"entry\":0}\n").unwrap();
        rotate_history_if_needed(Some(&config));
        assert!(hist.exists());
    }

    #[test]
    fn test_toml_parse() {
        let toml_src = r#"
            [thresholds]
            decision = 0.6

            [validator]
            max_text_length = 1000
            search_deadline_ms = 250
        "#;
        let config: PipelineConfig = toml::from_str(toml_src).unwrap();
        assert_eq!(config.fusion_thresholds().decision, 0.6);
        let v = config.validator_config();
        assert_eq!(v.max_text_length, 1000);
        assert_eq!(v.search_deadline, Duration::from_millis(250));
    }
}
