//! Batch module: parallel conversion of a list of files.
//!
//! [`BatchOrchestrator`] converts every input with bounded parallelism and
//! returns a [`BatchReport`] that accounts for each file exactly once.
//! Progress is pushed to a [`ProgressSink`] from a single aggregation loop,
//! so sinks never see concurrent calls.
//!
//! # Example
//!
//! ```ignore
//! use transcoda_core::batch::{BatchConfig, BatchOrchestrator, ChannelSink};
//! use transcoda_core::encoder::{Bitrate, FfmpegEncoder};
//!
//! let orchestrator = BatchOrchestrator::new(BatchConfig::default(), FfmpegEncoder::with_defaults());
//! let (mut sink, mut events) = ChannelSink::channel();
//!
//! tokio::spawn(async move {
//!     while let Some(event) = events.recv().await {
//!         println!("{:?}", event);
//!     }
//! });
//!
//! let report = orchestrator
//!     .run_batch(&inputs, Path::new("/music/out"), &Bitrate::default(), &mut sink)
//!     .await?;
//! println!("{}", report);
//! ```

mod config;
mod inputs;
mod orchestrator;
mod report;
mod sink;
mod types;

pub use config::BatchConfig;
pub use inputs::expand_inputs;
pub use orchestrator::{BatchError, BatchOrchestrator};
pub use report::{BatchReport, FailedConversion, ReportBuilder};
pub use sink::{BatchEvent, ChannelSink, NoopSink, ProgressSink};
pub use types::{ConversionOutcome, FailureKind, TaskState};
