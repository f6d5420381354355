//! Progress sink: the one-way event interface between a batch and whatever
//! presents it.

use serde::Serialize;
use tokio::sync::mpsc;

use super::report::BatchReport;

/// Receives progress and completion events for a batch.
///
/// All calls for one batch come from a single aggregation loop, in emission
/// order, never concurrently. Implementations must not assume which thread
/// that loop runs on.
pub trait ProgressSink: Send {
    /// A worker picked up `file_name`. Defaults to doing nothing.
    fn on_task_started(&mut self, file_name: &str) {
        let _ = file_name;
    }

    /// Per-file progress. Granularity is coarse: 0 at start, 100 when done.
    fn on_individual_progress(&mut self, file_name: &str, percent: f32);

    /// `completed` of `total` tasks have an outcome.
    fn on_overall_progress(&mut self, completed: usize, total: usize);

    /// The batch finished; `report` is final.
    fn on_batch_complete(&mut self, report: &BatchReport);
}

/// Sink that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn on_individual_progress(&mut self, _file_name: &str, _percent: f32) {}

    fn on_overall_progress(&mut self, _completed: usize, _total: usize) {}

    fn on_batch_complete(&mut self, _report: &BatchReport) {}
}

/// A progress event, as forwarded by [`ChannelSink`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BatchEvent {
    /// A worker picked up a file.
    TaskStarted { file_name: String },
    /// Per-file progress.
    IndividualProgress { file_name: String, percent: f32 },
    /// Overall progress.
    OverallProgress { completed: usize, total: usize },
    /// Final report.
    BatchComplete { report: BatchReport },
}

/// Sink that forwards events over an unbounded channel, so a presentation
/// layer can consume them from its own task. Never blocks the batch.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<BatchEvent>,
}

impl ChannelSink {
    /// Creates a sink and the receiving end of its event stream.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<BatchEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: BatchEvent) {
        // A dropped receiver just means nobody is watching.
        let _ = self.tx.send(event);
    }
}

impl ProgressSink for ChannelSink {
    fn on_task_started(&mut self, file_name: &str) {
        self.send(BatchEvent::TaskStarted {
            file_name: file_name.to_string(),
        });
    }

    fn on_individual_progress(&mut self, file_name: &str, percent: f32) {
        self.send(BatchEvent::IndividualProgress {
            file_name: file_name.to_string(),
            percent,
        });
    }

    fn on_overall_progress(&mut self, completed: usize, total: usize) {
        self.send(BatchEvent::OverallProgress { completed, total });
    }

    fn on_batch_complete(&mut self, report: &BatchReport) {
        self.send(BatchEvent::BatchComplete {
            report: report.clone(),
        });
    }
}
