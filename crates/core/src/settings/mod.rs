//! Settings module: the user's remembered output directory and bitrate.
//!
//! Preferences are read before a batch to fill in defaults and written back
//! when the user changes them. Loading never fails; saving failures are
//! logged.

mod store;

pub use store::{Preferences, SettingsError, SettingsStore};
