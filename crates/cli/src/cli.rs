//! Command-line argument definitions

use clap::{Args, Parser, Subcommand};
use std::num::NonZeroUsize;
use std::path::PathBuf;

use transcoda_core::{AudioFormat, Bitrate};

/// Batch audio converter
///
/// Converts audio files in parallel with ffmpeg and prints a report of
/// what succeeded and what failed.
#[derive(Parser, Debug)]
#[command(name = "transcoda")]
#[command(version)]
#[command(about = "Convert batches of audio files in parallel")]
pub struct Cli {
    /// Configuration file (TOML); a missing file means defaults
    #[arg(
        long,
        global = true,
        env = "TRANSCODA_CONFIG",
        default_value = "transcoda.toml"
    )]
    pub config: PathBuf,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert files (directories expand to matching files)
    Convert(ConvertArgs),
    /// Show or change remembered preferences
    #[command(subcommand)]
    Settings(SettingsCommand),
}

/// Arguments for the convert command
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Input files or directories
    pub inputs: Vec<PathBuf>,

    /// Output directory (default: remembered preference)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Bitrate such as 128kbps, 192k or 320 (default: remembered preference)
    #[arg(short, long)]
    pub bitrate: Option<Bitrate>,

    /// Maximum parallel conversions (default: from config, else CPU count)
    #[arg(short = 'j', long)]
    pub workers: Option<NonZeroUsize>,

    /// Target format: mp3, aac, ogg_vorbis, opus, flac, wav, alac
    #[arg(long)]
    pub format: Option<AudioFormat>,

    /// Per-file timeout in seconds, 0 to disable
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Remember the output directory and bitrate used
    #[arg(long)]
    pub remember: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Settings subcommands
#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    /// Print the remembered preferences
    Show {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change remembered preferences
    Set(SetArgs),
}

/// Arguments for settings set
#[derive(Args, Debug)]
pub struct SetArgs {
    /// New output directory
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// New bitrate
    #[arg(short, long)]
    pub bitrate: Option<Bitrate>,
}
