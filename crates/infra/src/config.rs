//! Tuning configuration loading.
//!
//! Resolution order: the file named by `STOCKCAST_TUNING_FILE`, then the inline
//! JSON in `STOCKCAST_TUNING`, then built-in defaults.

use std::path::Path;

use anyhow::Context;
use tracing::info;

use stockcast_forecast::{PredictionTuningConfig, TUNING_ENV_VAR};

pub const TUNING_FILE_ENV_VAR: &str = "STOCKCAST_TUNING_FILE";

/// Read and validate a JSON tuning document from disk.
pub fn load_tuning_file(path: impl AsRef<Path>) -> anyhow::Result<PredictionTuningConfig> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading tuning file {}", path.display()))?;
    let tuning = PredictionTuningConfig::from_json_str(&raw)
        .with_context(|| format!("parsing tuning file {}", path.display()))?;
    info!(path = %path.display(), "tuning loaded from file");
    Ok(tuning)
}

/// A configured but unreadable file is an error; a bad inline value falls
/// back to defaults (see [`PredictionTuningConfig::from_env`]).
pub fn load_tuning() -> anyhow::Result<PredictionTuningConfig> {
    match std::env::var(TUNING_FILE_ENV_VAR) {
        Ok(path) => load_tuning_file(path),
        Err(_) => {
            if std::env::var_os(TUNING_ENV_VAR).is_some() {
                info!("tuning loaded from {TUNING_ENV_VAR}");
            }
            Ok(PredictionTuningConfig::from_env())
        }
    }
}
