//! JSON-file backed preference store.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::encoder::Bitrate;

const OUTPUT_DIRECTORY_KEY: &str = "output_directory";
const BITRATE_KEY: &str = "bitrate";

/// Errors from persisting preferences.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Reading or writing the settings file failed.
    #[error("Settings file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Preferences could not be serialized.
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The two user preferences remembered between runs.
///
/// An empty string means "not chosen", as in a fresh install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// Where converted files go.
    pub output_directory: String,
    /// Bitrate as the user picked it, e.g. `192kbps`.
    pub bitrate: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            output_directory: String::new(),
            bitrate: Bitrate::DEFAULT.to_string(),
        }
    }
}

impl Preferences {
    /// The output directory, if one has been chosen.
    pub fn output_directory(&self) -> Option<&Path> {
        (!self.output_directory.is_empty()).then(|| Path::new(&self.output_directory))
    }

    /// Builds preferences from an arbitrary JSON value. Each field falls back
    /// to its default on its own when missing or not a string.
    fn from_json(value: &Value) -> Self {
        let defaults = Self::default();
        let Some(object) = value.as_object() else {
            warn!("Settings file does not hold a JSON object, using defaults");
            return defaults;
        };

        Self {
            output_directory: string_field(object, OUTPUT_DIRECTORY_KEY)
                .unwrap_or(defaults.output_directory),
            bitrate: string_field(object, BITRATE_KEY).unwrap_or(defaults.bitrate),
        }
    }
}

fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key) {
        None => None,
        Some(Value::String(value)) => Some(value.clone()),
        Some(other) => {
            warn!(key, value = %other, "Settings field has the wrong type, using default");
            None
        }
    }
}

/// Loads and saves [`Preferences`] as a small JSON file.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Creates a store backed by `path`. Nothing is read until [`load`](Self::load).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads preferences. Never fails: a missing, unreadable, or malformed
    /// file gives defaults, and bad fields are defaulted one by one.
    pub fn load(&self) -> Preferences {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No settings file, using defaults");
                return Preferences::default();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Cannot read settings, using defaults");
                return Preferences::default();
            }
        };

        match serde_json::from_str::<Value>(&contents) {
            Ok(value) => Preferences::from_json(&value),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Corrupt settings file, using defaults");
                Preferences::default()
            }
        }
    }

    /// Saves preferences, logging instead of failing.
    pub fn save(&self, preferences: &Preferences) {
        match self.try_save(preferences) {
            Ok(()) => info!(path = %self.path.display(), "Settings saved"),
            Err(e) => warn!(error = %e, "Failed to save settings"),
        }
    }

    /// Saves preferences, returning any error to the caller.
    pub fn try_save(&self, preferences: &Preferences) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(preferences)?;
        std::fs::write(&self.path, json).map_err(|source| SettingsError::Io {
            path: self.path.clone(),
            source,
        })
    }
}
