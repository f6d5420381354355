//! Error types for the encoder module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while preparing or running a conversion.
///
/// The `Display` text of each variant is the diagnostic that ends up in the
/// batch report, so tool output is carried through without decoration.
#[derive(Debug, Error)]
pub enum EncoderError {
    /// Encoder binary not found.
    #[error("{} not found. Please ensure it is installed and in your PATH.", path.display())]
    EncoderNotFound { path: PathBuf },

    /// Input file not found.
    #[error("Input file not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    /// Input path exists but is not a regular file.
    #[error("Input is not a regular file: {}", path.display())]
    InputNotAFile { path: PathBuf },

    /// No output file name can be derived from the input path.
    #[error("Cannot derive an output file name from input: {}", path.display())]
    InvalidInputPath { path: PathBuf },

    /// Another input in the same batch already writes this output file.
    #[error("Output path already used by another input in this batch: {}", path.display())]
    DuplicateOutput { path: PathBuf },

    /// Bitrate string could not be understood.
    #[error("Invalid bitrate: {value:?}")]
    InvalidBitrate { value: String },

    /// Target format name is not known.
    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    /// The encoder ran and reported failure. `message` is its own diagnostic.
    #[error("{message}")]
    ConversionFailed {
        message: String,
        exit_code: Option<i32>,
    },

    /// Conversion timed out.
    #[error("Conversion timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// I/O error while talking to the encoder.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EncoderError {
    /// Creates a conversion failure carrying the tool's diagnostic.
    pub fn conversion_failed(message: impl Into<String>, exit_code: Option<i32>) -> Self {
        Self::ConversionFailed {
            message: message.into(),
            exit_code,
        }
    }

    /// Whether the error is about the input itself rather than the encoder.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InputNotFound { .. }
                | Self::InputNotAFile { .. }
                | Self::InvalidInputPath { .. }
                | Self::DuplicateOutput { .. }
        )
    }
}
