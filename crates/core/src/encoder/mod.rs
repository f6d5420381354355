//! Encoder module: the boundary around the external conversion tool.
//!
//! An [`Encoder`] converts exactly one file per call and reports either a
//! confirmation message or an [`EncoderError`] whose text is the diagnostic
//! shown to the user. [`FfmpegEncoder`] is the production implementation.
//!
//! # Example
//!
//! ```ignore
//! use transcoda_core::encoder::{AudioFormat, Bitrate, ConversionTask, Encoder, FfmpegEncoder};
//!
//! let encoder = FfmpegEncoder::with_defaults();
//! encoder.validate().await?;
//!
//! let task = ConversionTask::plan(
//!     Path::new("/music/in/song.opus"),
//!     Path::new("/music/out"),
//!     AudioFormat::Mp3,
//!     Bitrate::parse("192kbps")?,
//! )?;
//! let message = encoder.convert(&task).await?;
//! ```

mod config;
mod error;
mod ffmpeg;
mod traits;
mod types;

pub use config::EncoderConfig;
pub use error::EncoderError;
pub use ffmpeg::FfmpegEncoder;
pub use traits::Encoder;
pub use types::{AudioFormat, Bitrate, ConversionTask};
