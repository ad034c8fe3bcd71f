//! Footprint CLI
//!
//! Scores captured digital-footprint findings for one subject or a
//! directory of cases.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use footprint_core::Subject;
use footprint_engine::{EngineConfig, FootprintEngine};
use footprint_runtime::{run_batch, Investigation, InvestigationOutcome};
use footprint_sources::{CaseDirectorySource, CollectorConfig, JsonFileSource};

#[derive(Parser)]
#[command(name = "footprint")]
#[command(author, version, about = "Digital footprint evidence scoring", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (0-3)
    #[arg(short, long, default_value = "1")]
    verbose: u8,

    /// Engine configuration file (TOML)
    #[arg(long, global = true, env = "FOOTPRINT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Score findings for one subject
    Score {
        /// Email, domain or username under investigation
        #[arg(short, long)]
        subject: String,

        /// Findings files (JSON); each file is one source
        #[arg(short, long, required = true, num_args = 1..)]
        findings: Vec<PathBuf>,

        /// Reference time (RFC 3339) for evidence timestamps and domain age
        #[arg(long)]
        at: Option<String>,

        /// Only report evidence at or above this confidence
        #[arg(long)]
        min_confidence: Option<f64>,

        /// Write the JSON report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Per-source lookup timeout in seconds
        #[arg(long, default_value = "30")]
        timeout: u64,
    },

    /// Score every case file in a directory
    Batch {
        /// Directory of `{subject, findings}` JSON case files
        #[arg(short, long)]
        dir: PathBuf,

        /// Subjects scored concurrently
        #[arg(long, default_value = "4")]
        concurrency: usize,
    },

    /// Print the default engine configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    match cli.command {
        Commands::Score {
            subject,
            findings,
            at,
            min_confidence,
            output,
            timeout,
        } => {
            let engine = build_engine(cli.config.as_deref())?;
            run_score(engine, &subject, findings, at, min_confidence, output, timeout).await?;
        }
        Commands::Batch { dir, concurrency } => {
            let engine = build_engine(cli.config.as_deref())?;
            run_cases(engine, &dir, concurrency).await?;
        }
        Commands::Config => {
            let config = match cli.config.as_deref() {
                Some(path) => EngineConfig::load(path)?,
                None => EngineConfig::default(),
            };
            print!("{}", config.to_toml_string()?);
        }
    }

    Ok(())
}

fn build_engine(config_path: Option<&Path>) -> Result<FootprintEngine> {
    let config = match config_path {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading engine config from {}", path.display()))?,
        None => EngineConfig::default(),
    };
    Ok(FootprintEngine::new(config)?)
}

fn parse_reference_time(raw: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("--at expects an RFC 3339 timestamp, got {:?}", raw))?;
    Ok(parsed.with_timezone(&Utc))
}

async fn run_score(
    engine: FootprintEngine,
    subject: &str,
    findings: Vec<PathBuf>,
    at: Option<String>,
    min_confidence: Option<f64>,
    output: Option<PathBuf>,
    timeout: u64,
) -> Result<()> {
    let subject = Subject::parse(subject)?;

    let mut investigation = Investigation::new(engine)
        .with_collector(CollectorConfig::default().with_timeout(Duration::from_secs(timeout)));
    for path in findings {
        investigation = investigation.with_source(JsonFileSource::new(path));
    }
    if let Some(raw) = at.as_deref() {
        investigation = investigation.with_reference_time(parse_reference_time(raw)?);
    }

    let outcome = investigation.run(&subject).await?;
    for failure in &outcome.source_failures {
        eprintln!("⚠️  Source {} failed: {}", failure.source, failure.error);
    }

    let report = match min_confidence {
        Some(threshold) => outcome.report.retain_confident(threshold),
        None => outcome.report,
    };
    let json = serde_json::to_string_pretty(&report)?;

    match output {
        Some(path) => {
            fs::write(&path, &json)?;
            println!("🔎 Subject: {}", report.subject);
            println!(
                "📊 Risk: {:.2} ({}) | Privacy: {:.2} | Exposure: {}",
                report.score.risk_score,
                report.score.risk_level.as_str(),
                report.score.privacy_score,
                report.score.exposure_level.as_str()
            );
            println!("🧾 Evidence: {} | Rejected: {}", report.evidence.len(), report.rejected.len());
            for rec in report.recommendations.iter() {
                println!("   • {}", rec.text);
            }
            println!("📄 Report saved to: {}", path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}

async fn run_cases(engine: FootprintEngine, dir: &Path, concurrency: usize) -> Result<()> {
    let source = CaseDirectorySource::new(dir);
    let mut subjects = Vec::new();
    for raw in source.subjects().await? {
        match Subject::parse(&raw) {
            Ok(subject) => subjects.push(subject),
            Err(e) => eprintln!("⚠️  Skipping subject {:?}: {}", raw, e),
        }
    }

    if subjects.is_empty() {
        println!("No case files with a subject found in {}", dir.display());
        return Ok(());
    }

    println!("🗂️  Scoring {} subjects from {}\n", subjects.len(), dir.display());

    let investigation = Investigation::new(engine).with_source(source);
    let results = run_batch(&investigation, &subjects, concurrency).await;

    for (subject, result) in subjects.iter().zip(results) {
        match result {
            Ok(outcome) => {
                println!("{}", summary_line(&outcome));
                for failure in &outcome.source_failures {
                    println!("{:<32}    ↳ source {} failed: {}", "", failure.source, failure.error);
                }
            }
            Err(e) => println!("{:<32} ❌ {}", subject.identifier, e),
        }
    }

    Ok(())
}

/// One batch line, flagged when any source failed
fn summary_line(outcome: &InvestigationOutcome) -> String {
    let report = &outcome.report;
    let score = &report.score;
    let marker = if outcome.is_partial() { " ⚠️  partial" } else { "" };
    format!(
        "{:<32} risk {:.2} {:<6} privacy {:.2} exposure {:<6} facts {}{}",
        report.subject.identifier,
        score.risk_score,
        score.risk_level.as_str(),
        score.privacy_score,
        score.exposure_level.as_str(),
        report.evidence.len(),
        marker
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_score() {
        let cli = Cli::try_parse_from([
            "footprint",
            "score",
            "--subject",
            "alice@example.com",
            "--findings",
            "hibp.json",
            "whois.json",
            "--min-confidence",
            "0.5",
        ])
        .unwrap();

        match cli.command {
            Commands::Score {
                findings,
                min_confidence,
                ..
            } => {
                assert_eq!(findings.len(), 2);
                assert_eq!(min_confidence, Some(0.5));
            }
            _ => panic!("expected score command"),
        }
    }

    #[test]
    fn test_reference_time() {
        let at = parse_reference_time("2024-06-01T00:00:00+02:00").unwrap();
        assert_eq!(at.to_rfc3339(), "2024-05-31T22:00:00+00:00");
        assert!(parse_reference_time("yesterday").is_err());
    }

    #[test]
    fn test_default_engine() {
        assert!(build_engine(None).is_ok());
    }

    #[test]
    fn test_summary_line_flags_partial_outcome() {
        let engine = build_engine(None).unwrap();
        let subject = Subject::parse("alice@example.com").unwrap();
        let mut outcome = InvestigationOutcome {
            report: engine.score_subject(&subject, &[]),
            source_failures: Vec::new(),
        };
        assert!(!summary_line(&outcome).contains("partial"));

        outcome.source_failures.push(footprint_sources::SourceFailure {
            source: "cases".to_string(),
            error: "Parse error: key must be a string".to_string(),
        });
        let line = summary_line(&outcome);
        assert!(line.starts_with("alice@example.com"));
        assert!(line.contains("risk 0.00"));
        assert!(line.ends_with("partial"));
    }
}
