//! Types for the batch module.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::encoder::{ConversionTask, EncoderError};

/// Lifecycle of one task: `Pending → Running → {Succeeded, Failed}`.
///
/// Tasks with a bad input, and tasks cancelled before a worker picked them
/// up, go straight from `Pending` to `Failed` and never reach `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Created, waiting for a worker.
    Pending,
    /// Holding a worker; the encoder call is in flight.
    Running,
    /// Finished successfully.
    Succeeded,
    /// Finished with a failure.
    Failed,
}

impl TaskState {
    /// Whether the task has produced its outcome.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// Why a task failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Input missing, unreadable, or without a usable file name.
    Input,
    /// The encoder ran (or could not be started) and reported failure.
    Conversion,
    /// The encoder call exceeded the per-task timeout.
    Timeout,
    /// The encoder panicked or the worker vanished.
    Fault,
    /// The batch was cancelled before this task started.
    Cancelled,
}

impl From<&EncoderError> for FailureKind {
    fn from(err: &EncoderError) -> Self {
        match err {
            EncoderError::Timeout { .. } => Self::Timeout,
            e if e.is_input_error() => Self::Input,
            _ => Self::Conversion,
        }
    }
}

/// The terminal result of one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionOutcome {
    /// Input path the task was created for.
    pub input_path: PathBuf,
    /// Label used in progress and reports (the output file name).
    pub file_name: String,
    /// Whether the conversion succeeded.
    pub success: bool,
    /// Failure category, `None` on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_kind: Option<FailureKind>,
    /// Confirmation on success, diagnostic on failure.
    pub message: String,
}

impl ConversionOutcome {
    /// Successful outcome for `task`.
    pub fn succeeded(task: &ConversionTask, message: impl Into<String>) -> Self {
        Self {
            input_path: task.input_path.clone(),
            file_name: task.file_name(),
            success: true,
            failure_kind: None,
            message: message.into(),
        }
    }

    /// Failed outcome for `task`.
    pub fn failed(task: &ConversionTask, kind: FailureKind, message: impl Into<String>) -> Self {
        Self::failed_input(&task.input_path, task.file_name(), kind, message)
    }

    /// Failed outcome for an input that never became a task.
    pub fn failed_input(
        input_path: &Path,
        file_name: impl Into<String>,
        kind: FailureKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            input_path: input_path.to_path_buf(),
            file_name: file_name.into(),
            success: false,
            failure_kind: Some(kind),
            message: message.into(),
        }
    }

    /// Failed outcome from an encoder error.
    pub fn from_error(task: &ConversionTask, err: &EncoderError) -> Self {
        Self::failed(task, FailureKind::from(err), err.to_string())
    }
}
