//! Terminal progress output.

use std::io::Write;
use tracing::info;

use transcoda_core::{BatchReport, ProgressSink};

/// Prints batch progress to stderr, keeping stdout for the report.
pub struct ConsoleSink<W: Write + Send> {
    out: W,
}

impl ConsoleSink<std::io::Stderr> {
    pub fn stderr() -> Self {
        Self {
            out: std::io::stderr(),
        }
    }
}

impl<W: Write + Send> ConsoleSink<W> {
    #[cfg(test)]
    fn new(out: W) -> Self {
        Self { out }
    }

    // Progress output is best effort; a closed terminal must not fail the batch.
    fn line(&mut self, text: std::fmt::Arguments<'_>) {
        let _ = writeln!(self.out, "{}", text);
    }
}

impl<W: Write + Send> ProgressSink for ConsoleSink<W> {
    fn on_task_started(&mut self, file_name: &str) {
        self.line(format_args!("Processing: {}", file_name));
    }

    fn on_individual_progress(&mut self, _file_name: &str, _percent: f32) {}

    fn on_overall_progress(&mut self, completed: usize, total: usize) {
        let percent = if total == 0 {
            100.0
        } else {
            completed as f64 * 100.0 / total as f64
        };
        self.line(format_args!(
            "Overall: {}/{} ({:.0}%)",
            completed, total, percent
        ));
    }

    fn on_batch_complete(&mut self, report: &BatchReport) {
        info!(batch_id = %report.batch_id, "{}", report.summary());
    }
}
