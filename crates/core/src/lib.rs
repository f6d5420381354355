pub mod batch;
pub mod config;
pub mod encoder;
pub mod settings;
pub mod testing;

pub use batch::{
    BatchConfig, BatchError, BatchEvent, BatchOrchestrator, BatchReport, ChannelSink,
    ConversionOutcome, FailureKind, NoopSink, ProgressSink,
};
pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, Config,
    ConfigError, LoggingConfig, SettingsConfig,
};
pub use encoder::{AudioFormat, Bitrate, ConversionTask, Encoder, EncoderConfig, EncoderError, FfmpegEncoder};
pub use settings::{Preferences, SettingsError, SettingsStore};
