//! Progress sink that records every event for assertions.

use crate::batch::{BatchEvent, BatchReport, ProgressSink};

/// Records every call as a [`BatchEvent`], in order.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    /// Everything received so far.
    pub events: Vec<BatchEvent>,
}

impl RecordingSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// File names from `on_task_started`, in order.
    pub fn started_files(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|event| match event {
                BatchEvent::TaskStarted { file_name } => Some(file_name.clone()),
                _ => None,
            })
            .collect()
    }

    /// `(completed, total)` pairs from `on_overall_progress`, in order.
    pub fn overall_progress(&self) -> Vec<(usize, usize)> {
        self.events
            .iter()
            .filter_map(|event| match event {
                BatchEvent::OverallProgress { completed, total } => Some((*completed, *total)),
                _ => None,
            })
            .collect()
    }

    /// `(file_name, percent)` pairs from `on_individual_progress`, in order.
    pub fn individual_progress(&self) -> Vec<(String, f32)> {
        self.events
            .iter()
            .filter_map(|event| match event {
                BatchEvent::IndividualProgress { file_name, percent } => {
                    Some((file_name.clone(), *percent))
                }
                _ => None,
            })
            .collect()
    }

    /// Reports passed to `on_batch_complete`.
    pub fn reports(&self) -> Vec<&BatchReport> {
        self.events
            .iter()
            .filter_map(|event| match event {
                BatchEvent::BatchComplete { report } => Some(report),
                _ => None,
            })
            .collect()
    }

    /// The final report, if the batch completed.
    pub fn report(&self) -> Option<&BatchReport> {
        self.reports().last().copied()
    }
}

impl ProgressSink for RecordingSink {
    fn on_task_started(&mut self, file_name: &str) {
        self.events.push(BatchEvent::TaskStarted {
            file_name: file_name.to_string(),
        });
    }

    fn on_individual_progress(&mut self, file_name: &str, percent: f32) {
        self.events.push(BatchEvent::IndividualProgress {
            file_name: file_name.to_string(),
            percent,
        });
    }

    fn on_overall_progress(&mut self, completed: usize, total: usize) {
        self.events
            .push(BatchEvent::OverallProgress { completed, total });
    }

    fn on_batch_complete(&mut self, report: &BatchReport) {
        self.events.push(BatchEvent::BatchComplete {
            report: report.clone(),
        });
    }
}
