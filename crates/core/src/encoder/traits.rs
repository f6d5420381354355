//! Trait definitions for the encoder module.

use async_trait::async_trait;

use super::error::EncoderError;
use super::types::{AudioFormat, ConversionTask};

/// An external encoder that converts one file per call.
///
/// Ordinary failures (missing tool, bad input, non-zero exit) come back as
/// `Err`; the error's display text is the diagnostic shown to the user.
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Returns the name of this encoder implementation.
    fn name(&self) -> &str;

    /// Converts `task.input_path` into `task.output_path`.
    ///
    /// On success returns a human-readable confirmation.
    async fn convert(&self, task: &ConversionTask) -> Result<String, EncoderError>;

    /// Checks that the encoder is installed and runnable.
    async fn validate(&self) -> Result<(), EncoderError>;

    /// Returns the formats this encoder can produce.
    fn supported_output_formats(&self) -> &[AudioFormat] {
        &AudioFormat::ALL
    }
}
