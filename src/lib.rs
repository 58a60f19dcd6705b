// src/lib.rs
//! # Fraud Stream Engine
//!
//! A streaming, rule-based fraud detector. Validated transactions are pushed
//! one at a time through a fixed set of heuristic rules; every rule that
//! fires contributes a flag to the transaction's [`EvaluationResult`].
//! Some rules keep per-user state (a rolling window of recent timestamps, or
//! a running spending profile), so transactions for the same user must be
//! evaluated in arrival order.
//!
//! ## Example
//!
//! ```rust
//! use fraud_stream_engine::{
//!     Detector, LargeTransactionRule, RapidTransactionsRule, Rule, Transaction,
//! };
//! use chrono::{Duration, TimeZone, Utc};
//!
//! let rules: Vec<Box<dyn Rule>> = vec![
//!     Box::new(RapidTransactionsRule::new(1, Duration::seconds(60)).unwrap()),
//!     Box::new(LargeTransactionRule::new(100.0).unwrap()),
//! ];
//! let mut detector = Detector::new(rules);
//!
//! let t0 = Utc.with_ymd_and_hms(2025, 9, 16, 10, 0, 0).unwrap();
//! let first = Transaction::new("1", "u1", "m1", 50.0, t0).unwrap();
//! let second = Transaction::new("2", "u1", "m1", 200.0, t0 + Duration::seconds(10)).unwrap();
//!
//! assert!(!detector.evaluate(&first).is_fraud);
//!
//! let result = detector.evaluate(&second);
//! assert!(result.is_fraud);
//! assert_eq!(result.flags, vec!["RapidTransactionsRule", "LargeTransactionRule"]);
//! ```

pub mod config;
pub mod detector;
pub mod ingest;
#[cfg(feature = "async")]
pub mod partition;
pub mod profile;
pub mod report;
pub mod rules;
pub mod sink;
pub mod transaction;

use thiserror::Error;

pub use config::{EngineConfig, RuleConfig};
pub use detector::{Detector, EvaluationResult, RuleOutcome};
pub use ingest::SourceKind;
pub use profile::{ProfileEngine, Profiler, SharedProfiles, UserProfile};
pub use report::{format_flags, DetectionReport};
pub use rules::{
    DynamicLargeTransactionRule, LargeTransactionRule, RapidTransactionsRule, Rule, ThresholdRule,
};
pub use sink::AlertWriter;
pub use transaction::{RawTransaction, Transaction};

/// A source record that cannot become a [`Transaction`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Empty field: {0}")]
    EmptyField(&'static str),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Malformed record: {0}")]
    Malformed(String),
}

/// A rule that could not reach a verdict
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleError {
    #[error("Rule {rule} failed: {reason}")]
    Fault { rule: String, reason: String },
}

impl RuleError {
    pub fn fault(rule: impl Into<String>, reason: impl Into<String>) -> Self {
        RuleError::Fault {
            rule: rule.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while building rules, before any transaction is processed
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid parameter for {rule}: {reason}")]
    InvalidParameter { rule: &'static str, reason: String },

    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Failures of a whole source or sink (not of a single record)
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported source format: {0}")]
    UnsupportedFormat(String),
}
