//! Configuration for the batch module.

use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::time::Duration;

use crate::encoder::AudioFormat;

/// Configuration for a batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Maximum parallel conversions. `None` uses the host's available parallelism.
    #[serde(default)]
    pub max_workers: Option<usize>,

    /// Format every input is converted to.
    #[serde(default)]
    pub target_format: AudioFormat,

    /// Timeout for a single conversion in seconds. 0 disables the timeout.
    #[serde(default = "default_task_timeout")]
    pub task_timeout_secs: u64,

    /// Extensions picked up when a directory is given as input.
    #[serde(default = "default_input_extensions")]
    pub input_extensions: Vec<String>,
}

fn default_task_timeout() -> u64 {
    3600 // 1 hour
}

fn default_input_extensions() -> Vec<String> {
    vec!["opus".to_string()]
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_workers: None,
            target_format: AudioFormat::default(),
            task_timeout_secs: default_task_timeout(),
            input_extensions: default_input_extensions(),
        }
    }
}

impl BatchConfig {
    /// Sets the maximum parallel conversions.
    pub fn with_max_workers(mut self, max: usize) -> Self {
        self.max_workers = Some(max);
        self
    }

    /// Sets the target format.
    pub fn with_target_format(mut self, format: AudioFormat) -> Self {
        self.target_format = format;
        self
    }

    /// Sets the per-task timeout in seconds (0 disables it).
    pub fn with_task_timeout(mut self, timeout_secs: u64) -> Self {
        self.task_timeout_secs = timeout_secs;
        self
    }

    /// Number of workers to run: the configured count, or the host's
    /// available parallelism, never fewer than one.
    pub fn worker_count(&self) -> usize {
        self.max_workers
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(NonZeroUsize::get)
                    .unwrap_or(1)
            })
            .max(1)
    }

    /// Per-task timeout, if enabled.
    pub fn task_timeout(&self) -> Option<Duration> {
        (self.task_timeout_secs > 0).then(|| Duration::from_secs(self.task_timeout_secs))
    }
}
