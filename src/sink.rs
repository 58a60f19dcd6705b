// src/sink.rs
//! CSV alert output

use crate::detector::EvaluationResult;
use crate::report::format_flags;
use crate::IngestError;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize)]
struct AlertRow {
    transaction_id: String,
    user_id: String,
    flags: String,
}

/// Buffers flagged results and writes them as
/// `transaction_id,user_id,flags` rows.
#[derive(Debug, Default)]
pub struct AlertWriter {
    rows: Vec<AlertRow>,
}

impl AlertWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer `result` if it was flagged. Returns whether it was kept.
    pub fn push(&mut self, result: &EvaluationResult) -> bool {
        if !result.is_fraud {
            return false;
        }
        self.rows.push(AlertRow {
            transaction_id: result.transaction_id.clone(),
            user_id: result.user_id.clone(),
            flags: format_flags(&result.flags),
        });
        true
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write all buffered alerts, with header, to `writer`.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<usize, IngestError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        if self.rows.is_empty() {
            csv_writer.write_record(["transaction_id", "user_id", "flags"])?;
        }
        for row in &self.rows {
            csv_writer.serialize(row)?;
        }
        csv_writer.flush()?;
        Ok(self.rows.len())
    }

    /// Write the alerts file, creating parent directories. No file is
    /// created when nothing was flagged.
    pub fn finish(self, path: impl AsRef<Path>) -> Result<usize, IngestError> {
        let path = path.as_ref();
        if self.rows.is_empty() {
            info!("No flagged transactions to write.");
            return Ok(0);
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let written = self.write_to(std::fs::File::create(path)?)?;
        info!("Wrote {} flagged transactions to: {}", written, path.display());
        Ok(written)
    }
}
