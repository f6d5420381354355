//! Types for the encoder module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::error::EncoderError;

/// Target audio format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioFormat {
    /// MPEG Audio Layer III
    #[default]
    Mp3,
    /// Advanced Audio Coding
    Aac,
    /// Ogg Vorbis
    OggVorbis,
    /// Opus
    Opus,
    /// Free Lossless Audio Codec (lossless)
    Flac,
    /// WAVE (uncompressed)
    Wav,
    /// Apple Lossless
    Alac,
}

impl AudioFormat {
    /// All formats, in the order they are listed to users.
    pub const ALL: [AudioFormat; 7] = [
        Self::Mp3,
        Self::Aac,
        Self::OggVorbis,
        Self::Opus,
        Self::Flac,
        Self::Wav,
        Self::Alac,
    ];

    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Aac => "m4a",
            Self::OggVorbis => "ogg",
            Self::Opus => "opus",
            Self::Flac => "flac",
            Self::Wav => "wav",
            Self::Alac => "m4a",
        }
    }

    /// Returns the ffmpeg codec name for this format.
    pub fn ffmpeg_codec(&self) -> &'static str {
        match self {
            Self::Mp3 => "libmp3lame",
            Self::Aac => "aac",
            Self::OggVorbis => "libvorbis",
            Self::Opus => "libopus",
            Self::Flac => "flac",
            Self::Wav => "pcm_s16le",
            Self::Alac => "alac",
        }
    }

    /// Whether this format is lossless (bitrate does not apply).
    pub fn is_lossless(&self) -> bool {
        matches!(self, Self::Flac | Self::Wav | Self::Alac)
    }

    /// Canonical configuration name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Aac => "aac",
            Self::OggVorbis => "ogg_vorbis",
            Self::Opus => "opus",
            Self::Flac => "flac",
            Self::Wav => "wav",
            Self::Alac => "alac",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AudioFormat {
    type Err = EncoderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mp3" => Ok(Self::Mp3),
            "aac" | "m4a" => Ok(Self::Aac),
            "ogg" | "vorbis" | "ogg_vorbis" => Ok(Self::OggVorbis),
            "opus" => Ok(Self::Opus),
            "flac" => Ok(Self::Flac),
            "wav" => Ok(Self::Wav),
            "alac" => Ok(Self::Alac),
            other => Err(EncoderError::UnsupportedFormat {
                format: other.to_string(),
            }),
        }
    }
}

/// An audio bitrate as entered by the user, e.g. `192kbps`.
///
/// The original spelling is kept so it round-trips through settings
/// unchanged; encoders ask for their own normalized form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Bitrate {
    raw: String,
    kbps: u32,
}

/// Unit suffixes accepted after the number (compared case-insensitively).
const KBPS_SUFFIXES: [&str; 6] = ["", "k", "kb", "kbps", "kb/s", "kbit/s"];

impl Bitrate {
    /// Presets offered to users.
    pub const PRESETS: [&'static str; 3] = ["128kbps", "192kbps", "320kbps"];

    /// Default bitrate.
    pub const DEFAULT: &'static str = "192kbps";

    /// Parses a bitrate such as `192kbps`, `192k`, `192 kb/s` or `192`.
    pub fn parse(value: &str) -> Result<Self, EncoderError> {
        let invalid = || EncoderError::InvalidBitrate {
            value: value.to_string(),
        };

        let trimmed = value.trim();
        let digits_end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        let (number, suffix) = trimmed.split_at(digits_end);

        let kbps: u32 = number.parse().map_err(|_| invalid())?;
        if kbps == 0 {
            return Err(invalid());
        }

        let suffix = suffix.trim().to_ascii_lowercase();
        if !KBPS_SUFFIXES.contains(&suffix.as_str()) {
            return Err(invalid());
        }

        Ok(Self {
            raw: trimmed.to_string(),
            kbps,
        })
    }

    /// The bitrate as the user wrote it.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Kilobits per second.
    pub fn kbps(&self) -> u32 {
        self.kbps
    }

    /// Whether this is one of the offered presets.
    pub fn is_preset(&self) -> bool {
        Self::PRESETS.contains(&self.raw.as_str())
    }
}

impl Default for Bitrate {
    fn default() -> Self {
        Self {
            raw: Self::DEFAULT.to_string(),
            kbps: 192,
        }
    }
}

impl fmt::Display for Bitrate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for Bitrate {
    type Err = EncoderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Bitrate {
    type Error = EncoderError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Bitrate> for String {
    fn from(bitrate: Bitrate) -> Self {
        bitrate.raw
    }
}

/// One file's conversion: the unit of work handed to an encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionTask {
    /// Input file path.
    pub input_path: PathBuf,
    /// Output file path.
    pub output_path: PathBuf,
    /// Target bitrate.
    pub bitrate: Bitrate,
    /// Target format.
    pub format: AudioFormat,
}

impl ConversionTask {
    /// Plans the conversion of `input` into `output_dir`.
    ///
    /// The output keeps the input's base name with the extension replaced by
    /// the target format's. Fails when the input has no usable file name.
    pub fn plan(
        input: &Path,
        output_dir: &Path,
        format: AudioFormat,
        bitrate: Bitrate,
    ) -> Result<Self, EncoderError> {
        let stem = input
            .file_stem()
            .filter(|stem| !stem.is_empty())
            .ok_or_else(|| EncoderError::InvalidInputPath {
                path: input.to_path_buf(),
            })?;

        let mut file_name = stem.to_os_string();
        file_name.push(".");
        file_name.push(format.extension());

        Ok(Self {
            input_path: input.to_path_buf(),
            output_path: output_dir.join(file_name),
            bitrate,
            format,
        })
    }

    /// Output file name, used to label this task in progress and reports.
    pub fn file_name(&self) -> String {
        self.output_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.output_path.display().to_string())
    }
}
