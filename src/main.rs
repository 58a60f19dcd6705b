//! fraud-detect — stream a transaction file through the rule engine.
//!
//! Reads CSV / JSON / JSON-lines records, evaluates each valid transaction,
//! logs alerts, writes flagged rows to a CSV file and logs a summary.

use anyhow::{Context, Result};
use clap::Parser;
use fraud_stream_engine::ingest::{self, SourceKind};
use fraud_stream_engine::{
    format_flags, AlertWriter, DetectionReport, EngineConfig, EvaluationResult,
};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Rule-based fraud detection over a transaction file.
#[derive(Parser, Debug)]
#[command(name = "fraud-detect", version, about)]
struct Cli {
    /// Transaction source file
    #[arg(long, short)]
    input: PathBuf,

    /// Source format: csv, json or jsonl (inferred from the extension if omitted)
    #[arg(long)]
    format: Option<SourceKind>,

    /// Path to a TOML config file (built-in rule set if omitted)
    #[arg(long, env = "FRAUD_DETECT_CONFIG")]
    config: Option<PathBuf>,

    /// Alerts CSV output (overrides the config file)
    #[arg(long)]
    alerts: Option<PathBuf>,
}

/// Filter with the configured level as the default for every target.
/// `directives` (normally `RUST_LOG`) refine it when non-empty.
fn log_filter(level: &str, directives: &str) -> Result<EnvFilter> {
    let level: LevelFilter = level
        .parse()
        .with_context(|| format!("Invalid log level {:?}", level))?;
    Ok(EnvFilter::builder()
        .with_default_directive(level.into())
        .parse_lossy(directives))
}

fn log_alert(result: &EvaluationResult) {
    warn!(
        "ALERT txn={} user={} flags={}",
        result.transaction_id,
        result.user_id,
        format_flags(&result.flags)
    );
}

fn log_run_finished(report: &DetectionReport, elapsed: Duration) {
    info!(
        total = report.total,
        flagged = report.flagged,
        elapsed_ms = elapsed.as_millis() as u64,
        "Detection pass finished in {:.3}s",
        elapsed.as_secs_f64()
    );
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let directives = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(&config.logging.level, &directives)?)
        .init();

    let kind = match cli.format.or_else(|| SourceKind::from_path(&cli.input)) {
        Some(kind) => kind,
        None => anyhow::bail!(
            "Cannot infer source format of {}, pass --format",
            cli.input.display()
        ),
    };

    let mut detector = config
        .build_detector()
        .context("Failed to build rule set")?;
    info!(rules = ?detector.rule_names(), "Detector ready");

    let records = ingest::read_source(&cli.input, kind)
        .with_context(|| format!("Failed to open {}", cli.input.display()))?;

    let started = Instant::now();
    let mut report = DetectionReport::new();
    let mut alerts = AlertWriter::new();

    for transaction in ingest::valid_transactions(records) {
        let (result, outcomes) = detector.evaluate_with_outcomes(&transaction);
        report.record_outcomes(&result, &outcomes);

        if alerts.push(&result) {
            log_alert(&result);
        }
    }
    log_run_finished(&report, started.elapsed());

    let alerts_path = cli.alerts.unwrap_or_else(|| config.output.alerts_csv.clone());
    alerts
        .finish(&alerts_path)
        .with_context(|| format!("Failed to write alerts to {}", alerts_path.display()))?;

    report.log_summary(config.output.top_users);
    if let Some(profiles) = detector.profiles() {
        if let Ok(profiles) = profiles.read() {
            info!("Profiled users: {}", profiles.len());
        }
    }

    Ok(())
}
