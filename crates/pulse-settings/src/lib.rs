//! # pulse-settings
//!
//! Configuration for the Pulse real-time layer.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`PulseSettings::default()`]
//! 2. **Settings file**: `~/.pulse/settings.json` (or an explicit path)
//! 3. **Environment variables**: `PULSE_<SECTION>__<FIELD>` (highest priority)
//!
//! ```no_run
//! use pulse_settings::load_settings;
//!
//! let settings = load_settings().unwrap_or_default();
//! println!("reconnect every {}ms", settings.connection.reconnect_interval_ms);
//! ```

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    ENV_PREFIX, load_required_settings, load_settings, load_settings_from_path, settings_path,
};
pub use types::*;
