// src/ingest/mod.rs
//! Ingestion boundary
//!
//! Sources yield one `Result<Transaction, ValidationError>` per record.
//! [`valid_transactions`] drops the malformed ones (logging each) so the
//! detector only ever sees validated records.

pub mod sources;

use crate::{IngestError, Transaction, ValidationError};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::warn;

pub use sources::{read_csv, read_json, read_json_lines};

/// Boxed per-record stream returned by [`read_source`]
pub type RecordStream = Box<dyn Iterator<Item = Result<Transaction, ValidationError>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Csv,
    /// A single JSON array of records
    Json,
    /// One JSON object per line
    JsonLines,
}

impl SourceKind {
    /// Guess the kind from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        ext.parse().ok()
    }
}

impl FromStr for SourceKind {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(SourceKind::Csv),
            "json" => Ok(SourceKind::Json),
            "jsonl" | "ndjson" | "json_lines" => Ok(SourceKind::JsonLines),
            other => Err(IngestError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Csv => write!(f, "csv"),
            SourceKind::Json => write!(f, "json"),
            SourceKind::JsonLines => write!(f, "jsonl"),
        }
    }
}

/// Open `path` and stream its records.
pub fn read_source(path: impl AsRef<Path>, kind: SourceKind) -> Result<RecordStream, IngestError> {
    let file = std::fs::File::open(path.as_ref())?;

    let stream: RecordStream = match kind {
        SourceKind::Csv => Box::new(read_csv(file)),
        SourceKind::Json => Box::new(read_json(file)?),
        SourceKind::JsonLines => Box::new(read_json_lines(std::io::BufReader::new(file))),
    };
    Ok(stream)
}

/// Keep the records that validated, logging and skipping the rest.
pub fn valid_transactions<I>(records: I) -> impl Iterator<Item = Transaction>
where
    I: IntoIterator<Item = Result<Transaction, ValidationError>>,
{
    records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match record {
            Ok(txn) => Some(txn),
            Err(e) => {
                warn!(record = index + 1, error = %e, "Skipping invalid record");
                None
            }
        })
}
