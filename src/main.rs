use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use eyre::{bail, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use piifuse::fusion::FusionEngine;
use piifuse::models::{ContextScorer, LexiconTagger};
use piifuse::signals::Verdict;
use piifuse::validator::PatternValidator;
use piifuse::{
    config_dir, history_path, load_config, rotate_history_if_needed, validate_config,
    PipelineConfig,
};

#[derive(Parser)]
#[command(
    name = "piifuse",
    about = "Detect PII in Brazilian Portuguese text by fusing pattern validators, a context score, and entity signals."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a single text and print the verdict as JSON
    Check {
        /// Text to classify
        #[arg(long)]
        text: String,

        /// Decision threshold for the fallback rule
        #[arg(long)]
        threshold: Option<f64>,

        /// Append the verdict (without the text) to the decision history
        #[arg(long, default_value_t = false)]
        record: bool,
    },

    /// Classify one text per line from a file ("-" for stdin), JSONL out
    Batch {
        /// Input file path, or "-" to read stdin
        #[arg(long)]
        input: String,

        /// Output file path; stdout when omitted
        #[arg(long)]
        output: Option<PathBuf>,

        /// Decision threshold for the fallback rule
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// Run only the pattern validators and print the signals as JSON
    Patterns {
        /// Text to scan
        #[arg(long)]
        text: String,
    },

    /// Show recent decision history
    History {
        /// Number of entries to show
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Validate the config file and report any issues
    ConfigCheck,
}

/// History never stores the classified text itself — only verdict metadata.
#[derive(Serialize, Deserialize)]
struct HistoryEntry {
    timestamp: DateTime<Utc>,
    text_chars: usize,
    is_pii: bool,
    confidence: f64,
    reason: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Configuration problems are fatal before any classification happens.
    // `config-check` is exempt so it can report the issues instead.
    let config = load_config()?;
    let is_config_check = matches!(cli.command, Commands::ConfigCheck);
    if let Some(c) = config.as_ref() {
        if !is_config_check {
            let errors: Vec<String> = validate_config(c)
                .into_iter()
                .filter(|i| i.starts_with("ERROR"))
                .collect();
            if !errors.is_empty() {
                bail!("invalid config:\n{}", errors.join("\n"));
            }
        }
    }

    match cli.command {
        Commands::Check {
            text,
            threshold,
            record,
        } => check(&text, threshold, record, config.as_ref()),
        Commands::Batch {
            input,
            output,
            threshold,
        } => batch(&input, output.as_deref(), threshold, config.as_ref()),
        Commands::Patterns { text } => patterns(&text, config.as_ref()),
        Commands::History { limit } => history(limit, config.as_ref()),
        Commands::ConfigCheck => config_check(config.as_ref()),
    }
}

fn build_engine(config: Option<&PipelineConfig>) -> FusionEngine<ContextScorer, LexiconTagger> {
    let config = config.cloned().unwrap_or_default();
    FusionEngine::with_thresholds(
        PatternValidator::new(config.validator_config()),
        ContextScorer,
        LexiconTagger,
        config.fusion_thresholds(),
    )
}

fn check(
    text: &str,
    threshold: Option<f64>,
    record: bool,
    config: Option<&PipelineConfig>,
) -> Result<()> {
    let engine = build_engine(config);
    let verdict = match threshold {
        Some(t) => engine.classify_with_threshold(text, t),
        None => engine.classify(text),
    };
    println!("{}", serde_json::to_string_pretty(&verdict)?);

    if record {
        append_history(text, &verdict, config)?;
    }
    Ok(())
}

fn batch(
    input: &str,
    output: Option<&std::path::Path>,
    threshold: Option<f64>,
    config: Option<&PipelineConfig>,
) -> Result<()> {
    let texts: Vec<String> = if input == "-" {
        std::io::stdin()
            .lock()
            .lines()
            .collect::<std::io::Result<Vec<_>>>()
            .wrap_err("failed to read stdin")?
    } else {
        fs::read_to_string(input)
            .wrap_err_with(|| format!("failed to read {}", input))?
            .lines()
            .map(str::to_owned)
            .collect()
    };
    let texts: Vec<String> = texts.into_iter().filter(|l| !l.trim().is_empty()).collect();

    let engine = build_engine(config);
    let threshold = threshold.unwrap_or(engine.thresholds().decision);
    let verdicts = engine.classify_batch(&texts, threshold);

    let mut out: Box<dyn Write> = match output {
        Some(path) => Box::new(
            fs::File::create(path).wrap_err_with(|| format!("failed to create {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout().lock()),
    };
    for verdict in &verdicts {
        writeln!(out, "{}", serde_json::to_string(verdict)?)?;
    }
    Ok(())
}

fn patterns(text: &str, config: Option<&PipelineConfig>) -> Result<()> {
    let validator = PatternValidator::new(
        config.cloned().unwrap_or_default().validator_config(),
    );
    let signals = validator.validate_all(text);
    println!("{}", serde_json::to_string_pretty(&signals)?);
    Ok(())
}

fn append_history(text: &str, verdict: &Verdict, config: Option<&PipelineConfig>) -> Result<()> {
    rotate_history_if_needed(config);
    let path = history_path(config);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .wrap_err_with(|| format!("failed to create {}", parent.display()))?;
    }
    let entry = HistoryEntry {
        timestamp: Utc::now(),
        text_chars: text.chars().count(),
        is_pii: verdict.is_pii,
        confidence: verdict.confidence,
        reason: verdict.reason.to_string(),
    };
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .wrap_err_with(|| format!("failed to open {}", path.display()))?;
    writeln!(file, "{}", serde_json::to_string(&entry)?)?;
    Ok(())
}

fn history(limit: usize, config: Option<&PipelineConfig>) -> Result<()> {
    let path = history_path(config);
    if !path.exists() {
        println!("No history yet at {}", path.display());
        return Ok(());
    }
    let content = fs::read_to_string(&path)?;
    let lines: Vec<&str> = content.lines().filter(|l| !l.is_empty()).collect();
    let start = lines.len().saturating_sub(limit);
    for line in &lines[start..] {
        match serde_json::from_str::<HistoryEntry>(line) {
            Ok(e) => println!(
                "{}  pii={}  confidence={:.2}  reason={}  ({} chars)",
                e.timestamp.format("%Y-%m-%d %H:%M:%S"),
                e.is_pii,
                e.confidence,
                e.reason,
                e.text_chars
            ),
            Err(_) => println!("{}", line),
        }
    }
    Ok(())
}

fn config_check(config: Option<&PipelineConfig>) -> Result<()> {
    let path = config_dir().join("config.toml");
    match config {
        None => {
            println!("No config file found at {} (defaults in effect)", path.display());
        }
        Some(c) => {
            println!("Config path: {}", path.display());
            let issues = validate_config(c);
            if issues.is_empty() {
                println!("All checks passed");
            } else {
                for issue in &issues {
                    println!("{}", issue);
                }
                if issues.iter().any(|i| i.starts_with("ERROR")) {
                    bail!("config has errors");
                }
            }
        }
    }
    Ok(())
}
