//! Batch report model and its incremental builder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

use super::types::{ConversionOutcome, FailureKind};

/// One failed file in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedConversion {
    /// File name the failure is reported under.
    pub file_name: String,
    /// Diagnostic message.
    pub message: String,
    /// Failure category.
    pub kind: FailureKind,
}

/// Aggregate of all outcomes of one batch.
///
/// `successes` and `failures` are in completion order, which is not the
/// submission order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Identifier for log correlation.
    pub batch_id: Uuid,
    /// When dispatch began.
    pub started_at: DateTime<Utc>,
    /// Number of inputs in the batch.
    pub total: usize,
    /// File names converted successfully.
    pub successes: Vec<String>,
    /// Files that failed, with their diagnostics.
    pub failures: Vec<FailedConversion>,
    /// Wall-clock time from dispatch start to the last outcome.
    pub elapsed: Duration,
    /// Whether the batch was cancelled before every task could start.
    pub cancelled: bool,
}

impl BatchReport {
    /// Every task has been accounted for.
    pub fn is_complete(&self) -> bool {
        self.successes.len() + self.failures.len() == self.total
    }

    /// Every task succeeded (trivially true for an empty batch).
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty() && self.is_complete()
    }

    /// One-line human summary: counts and duration.
    pub fn summary(&self) -> String {
        format!(
            "Conversions finished in {:.2}s. Successful: {}, Failed: {} (of {})",
            self.elapsed.as_secs_f64(),
            self.successes.len(),
            self.failures.len(),
            self.total
        )
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Conversion Report ---")?;
        writeln!(f, "Total files selected: {}", self.total)?;
        writeln!(f, "Successfully converted: {}", self.successes.len())?;
        writeln!(f, "Failed to convert: {}", self.failures.len())?;
        writeln!(
            f,
            "Total processing time: {:.2} seconds",
            self.elapsed.as_secs_f64()
        )?;
        if self.cancelled {
            writeln!(f, "Batch was cancelled; files not started are listed as failed.")?;
        }

        writeln!(f)?;
        writeln!(f, "--- Successful ---")?;
        if self.successes.is_empty() {
            writeln!(f, "None")?;
        }
        for name in &self.successes {
            writeln!(f, "{}", name)?;
        }

        writeln!(f)?;
        writeln!(f, "--- Failed ---")?;
        if self.failures.is_empty() {
            write!(f, "None")?;
        }
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}: {}", failure.file_name, failure.message)?;
        }

        Ok(())
    }
}

/// Accumulates outcomes into a [`BatchReport`]. Append-only.
#[derive(Debug)]
pub struct ReportBuilder {
    batch_id: Uuid,
    started_at: DateTime<Utc>,
    total: usize,
    successes: Vec<String>,
    failures: Vec<FailedConversion>,
}

impl ReportBuilder {
    /// Starts an empty report for `total` tasks.
    pub fn new(batch_id: Uuid, started_at: DateTime<Utc>, total: usize) -> Self {
        Self {
            batch_id,
            started_at,
            total,
            successes: Vec::with_capacity(total),
            failures: Vec::new(),
        }
    }

    /// Folds one outcome into the report.
    pub fn record(&mut self, outcome: ConversionOutcome) {
        if outcome.success {
            self.successes.push(outcome.file_name);
        } else {
            self.failures.push(FailedConversion {
                file_name: outcome.file_name,
                message: outcome.message,
                kind: outcome.failure_kind.unwrap_or(FailureKind::Fault),
            });
        }
    }

    /// Outcomes recorded so far.
    pub fn recorded(&self) -> usize {
        self.successes.len() + self.failures.len()
    }

    /// Finalizes the report.
    pub fn finish(self, elapsed: Duration) -> BatchReport {
        let cancelled = self
            .failures
            .iter()
            .any(|failure| failure.kind == FailureKind::Cancelled);

        BatchReport {
            batch_id: self.batch_id,
            started_at: self.started_at,
            total: self.total,
            successes: self.successes,
            failures: self.failures,
            elapsed,
            cancelled,
        }
    }
}
