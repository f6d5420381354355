//! Testing utilities: a controllable encoder and a recording progress sink.
//!
//! These let batches run end to end without ffmpeg installed.
//!
//! # Example
//!
//! ```rust,ignore
//! use transcoda_core::testing::{MockBehavior, MockEncoder, RecordingSink};
//!
//! let encoder = MockEncoder::new();
//! encoder.set_behavior("broken.opus", MockBehavior::Fail("bad data".into())).await;
//!
//! let mut sink = RecordingSink::new();
//! // Run a batch with encoder.clone() and &mut sink...
//! assert_eq!(sink.overall_progress().last(), Some(&(2, 2)));
//! ```

mod mock_encoder;
mod recording_sink;

pub use mock_encoder::{MockBehavior, MockEncoder};
pub use recording_sink::RecordingSink;
