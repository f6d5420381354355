//! Batch orchestrator implementation.

use chrono::Utc;
use futures::FutureExt;
use std::any::Any;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::encoder::{AudioFormat, Bitrate, ConversionTask, Encoder, EncoderError};

use super::config::BatchConfig;
use super::report::{BatchReport, ReportBuilder};
use super::sink::ProgressSink;
use super::types::{ConversionOutcome, FailureKind, TaskState};

/// Error type for batch operations.
///
/// Per-file problems never surface here; they become failed outcomes.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// The worker pool could not be created.
    #[error("Cannot create a worker pool of {requested} workers (maximum {max})")]
    WorkerPool { requested: usize, max: usize },

    /// The encoder cannot produce the configured target format.
    #[error("Encoder {encoder} cannot produce {format} output")]
    UnsupportedFormat { format: AudioFormat, encoder: String },
}

/// Messages from workers to the aggregation loop.
#[derive(Debug)]
enum WorkerMessage {
    Started {
        index: usize,
    },
    Finished {
        index: usize,
        outcome: ConversionOutcome,
    },
}

/// Converts batches of files with bounded parallelism.
///
/// Each input becomes one task. Tasks wait on a semaphore sized to the
/// worker count, call the encoder, and send their outcome to a single
/// aggregation loop that owns the report and drives the sink.
pub struct BatchOrchestrator<E: Encoder> {
    config: BatchConfig,
    encoder: Arc<E>,
    cancel: CancellationToken,
}

impl<E: Encoder + 'static> BatchOrchestrator<E> {
    /// Creates a new orchestrator.
    pub fn new(config: BatchConfig, encoder: E) -> Self {
        Self::with_shared_encoder(config, Arc::new(encoder))
    }

    /// Creates an orchestrator around an encoder that is shared elsewhere.
    pub fn with_shared_encoder(config: BatchConfig, encoder: Arc<E>) -> Self {
        Self {
            config,
            encoder,
            cancel: CancellationToken::new(),
        }
    }

    /// Uses an externally owned cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that stops dispatch when cancelled.
    ///
    /// Cancelling lets running encoder calls finish; tasks still waiting for
    /// a worker are reported as cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Requests cancellation of the current and any later batch.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns the batch configuration.
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Converts every input into `output_dir` and returns the final report.
    ///
    /// Returns only once every input has an outcome. `output_dir` is not
    /// created; write failures show up as per-file failures. Inputs whose
    /// output path is already taken by an earlier input fail without an
    /// encoder call.
    pub async fn run_batch<S: ProgressSink + ?Sized>(
        &self,
        inputs: &[PathBuf],
        output_dir: &Path,
        bitrate: &Bitrate,
        sink: &mut S,
    ) -> Result<BatchReport, BatchError> {
        let workers = self.config.worker_count();
        if workers > Semaphore::MAX_PERMITS {
            return Err(BatchError::WorkerPool {
                requested: workers,
                max: Semaphore::MAX_PERMITS,
            });
        }

        let format = self.config.target_format;
        if !self.encoder.supported_output_formats().contains(&format) {
            return Err(BatchError::UnsupportedFormat {
                format,
                encoder: self.encoder.name().to_string(),
            });
        }

        let total = inputs.len();
        let batch_id = Uuid::new_v4();
        let started_at = Utc::now();
        let start = Instant::now();

        info!(
            %batch_id,
            total,
            workers,
            output_dir = %output_dir.display(),
            %bitrate,
            %format,
            encoder = self.encoder.name(),
            "Starting batch"
        );

        let semaphore = Arc::new(Semaphore::new(workers));
        let timeout = self.config.task_timeout();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut join_set = JoinSet::new();
        let mut states = vec![TaskState::Pending; total];
        let mut names = Vec::with_capacity(total);

        let mut planned = HashSet::with_capacity(total);

        for (index, input) in inputs.iter().enumerate() {
            let task = match ConversionTask::plan(input, output_dir, format, bitrate.clone()) {
                Ok(task) => task,
                Err(e) => {
                    let outcome = ConversionOutcome::failed_input(
                        input,
                        input_label(input),
                        FailureKind::Input,
                        e.to_string(),
                    );
                    names.push(outcome.file_name.clone());
                    let _ = tx.send(WorkerMessage::Finished { index, outcome });
                    continue;
                }
            };
            names.push(task.file_name());

            if !planned.insert(task.output_path.clone()) {
                let err = EncoderError::DuplicateOutput {
                    path: task.output_path.clone(),
                };
                let outcome = ConversionOutcome::from_error(&task, &err);
                let _ = tx.send(WorkerMessage::Finished { index, outcome });
                continue;
            }

            debug!(
                %batch_id,
                index,
                input = %task.input_path.display(),
                output = %task.output_path.display(),
                "Dispatching task"
            );
            join_set.spawn(run_task(
                index,
                task,
                Arc::clone(&self.encoder),
                Arc::clone(&semaphore),
                self.cancel.clone(),
                timeout,
                tx.clone(),
            ));
        }
        drop(tx);

        let mut builder = ReportBuilder::new(batch_id, started_at, total);

        while let Some(message) = rx.recv().await {
            match message {
                WorkerMessage::Started { index } => {
                    if states[index] == TaskState::Pending {
                        states[index] = TaskState::Running;
                    }
                    sink.on_task_started(&names[index]);
                    sink.on_individual_progress(&names[index], 0.0);
                }
                WorkerMessage::Finished { index, outcome } => {
                    fold(&mut states[index], outcome, &mut builder, sink, total);
                }
            }
        }

        while let Some(joined) = join_set.join_next().await {
            if let Err(e) = joined {
                error!(%batch_id, error = %e, "Worker task ended abnormally");
            }
        }

        // Workers report before exiting; a gap here means one died outside the guarded call.
        for (index, input) in inputs.iter().enumerate() {
            if !states[index].is_terminal() {
                let outcome = ConversionOutcome::failed_input(
                    input,
                    names[index].clone(),
                    FailureKind::Fault,
                    "Worker stopped without reporting an outcome",
                );
                fold(&mut states[index], outcome, &mut builder, sink, total);
            }
        }

        let report = builder.finish(start.elapsed());

        info!(
            %batch_id,
            total = report.total,
            succeeded = report.successes.len(),
            failed = report.failures.len(),
            cancelled = report.cancelled,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Batch finished"
        );

        sink.on_batch_complete(&report);
        Ok(report)
    }
}

/// Folds one outcome into the report and tells the sink.
fn fold<S: ProgressSink + ?Sized>(
    state: &mut TaskState,
    outcome: ConversionOutcome,
    builder: &mut ReportBuilder,
    sink: &mut S,
    total: usize,
) {
    if state.is_terminal() {
        warn!(file = %outcome.file_name, "Ignoring duplicate outcome");
        return;
    }

    if outcome.success {
        *state = TaskState::Succeeded;
        info!(file = %outcome.file_name, "Converted");
    } else {
        *state = TaskState::Failed;
        warn!(
            file = %outcome.file_name,
            kind = ?outcome.failure_kind,
            error = %outcome.message,
            "Conversion failed"
        );
    }

    let file_name = outcome.file_name.clone();
    builder.record(outcome);

    sink.on_individual_progress(&file_name, 100.0);
    sink.on_overall_progress(builder.recorded(), total);
}

/// Worker body: always sends exactly one `Finished` message.
async fn run_task<E: Encoder + 'static>(
    index: usize,
    task: ConversionTask,
    encoder: Arc<E>,
    semaphore: Arc<Semaphore>,
    cancel: CancellationToken,
    timeout: Option<Duration>,
    tx: mpsc::UnboundedSender<WorkerMessage>,
) {
    let outcome = execute(index, &task, encoder.as_ref(), semaphore, &cancel, timeout, &tx).await;
    let _ = tx.send(WorkerMessage::Finished { index, outcome });
}

async fn execute<E: Encoder>(
    index: usize,
    task: &ConversionTask,
    encoder: &E,
    semaphore: Arc<Semaphore>,
    cancel: &CancellationToken,
    timeout: Option<Duration>,
    tx: &mpsc::UnboundedSender<WorkerMessage>,
) -> ConversionOutcome {
    // Bad inputs fail here, before they take a worker.
    if let Err(err) = check_input(&task.input_path).await {
        return ConversionOutcome::failed(task, FailureKind::Input, err.to_string());
    }

    let _permit = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!(file = %task.file_name(), "Batch cancelled, not starting task");
            return ConversionOutcome::failed(
                task,
                FailureKind::Cancelled,
                "Batch cancelled before this file was started",
            );
        }
        permit = semaphore.acquire_owned() => match permit {
            Ok(permit) => permit,
            Err(_) => {
                return ConversionOutcome::failed(task, FailureKind::Fault, "Worker pool closed");
            }
        },
    };

    let _ = tx.send(WorkerMessage::Started { index });

    let call = AssertUnwindSafe(encoder.convert(task)).catch_unwind();
    let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => {
                let err = EncoderError::Timeout {
                    timeout_secs: limit.as_secs(),
                };
                return ConversionOutcome::from_error(task, &err);
            }
        },
        None => call.await,
    };

    match result {
        Ok(Ok(message)) => ConversionOutcome::succeeded(task, message),
        Ok(Err(err)) => ConversionOutcome::from_error(task, &err),
        Err(panic) => ConversionOutcome::failed(
            task,
            FailureKind::Fault,
            format!(
                "Unexpected fault during conversion: {}",
                panic_message(panic.as_ref())
            ),
        ),
    }
}

async fn check_input(input: &Path) -> Result<(), EncoderError> {
    match tokio::fs::metadata(input).await {
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) => Err(EncoderError::InputNotAFile {
            path: input.to_path_buf(),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(EncoderError::InputNotFound {
            path: input.to_path_buf(),
        }),
        Err(e) => Err(EncoderError::Io(e)),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn input_label(input: &Path) -> String {
    let label = input.display().to_string();
    if label.is_empty() {
        "<empty path>".to_string()
    } else {
        label
    }
}
