//! Layered settings loading.
//!
//! Loading flow:
//! 1. Start with compiled [`PulseSettings::default()`]
//! 2. Merge `~/.pulse/settings.json` (or the given path) if it exists
//! 3. Merge `PULSE_<SECTION>__<FIELD>` environment variables
//! 4. Validate the result

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized};
use tracing::debug;

use crate::errors::{Result, SettingsError};
use crate::types::PulseSettings;

/// Prefix for environment overrides. Nested keys are separated by `__`,
/// e.g. `PULSE_CONNECTION__MAX_RECONNECT_ATTEMPTS=3`.
pub const ENV_PREFIX: &str = "PULSE_";

/// Resolve the path to the settings file (`~/.pulse/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".pulse").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<PulseSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file is treated as empty. A file that fails to parse is an
/// error.
pub fn load_settings_from_path(path: &Path) -> Result<PulseSettings> {
    if path.exists() {
        debug!(?path, "loading settings from file");
    } else {
        debug!(?path, "settings file not found, using defaults");
    }

    let settings: PulseSettings = Figment::from(Serialized::defaults(PulseSettings::default()))
        .merge(Json::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(Box::new)?;

    settings.validate()?;
    Ok(settings)
}

/// Like [`load_settings_from_path`] but the file must exist.
///
/// Used for paths the user named explicitly.
pub fn load_required_settings(path: &Path) -> Result<PulseSettings> {
    if !path.exists() {
        return Err(SettingsError::NotFound(path.to_path_buf()));
    }
    load_settings_from_path(path)
}
