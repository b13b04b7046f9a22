//! Installer settings from `SEED_*` environment variables.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::domain::config::InstallerSettings;

/// Raw `SEED_*` variables as read by `envy`.
#[derive(Debug, Default, Deserialize)]
struct SeedEnv {
    /// `SEED_HOME`: base path.
    home: Option<PathBuf>,
    /// `SEED_SOURCE`: package source.
    source: Option<String>,
    /// `SEED_BIN_DIR`: launcher directory.
    bin_dir: Option<PathBuf>,
}

/// Load settings from the process environment.
///
/// # Errors
///
/// Returns an error if the environment cannot be decoded, the home directory
/// is unknown, or `SEED_SOURCE` is malformed.
pub fn load_settings() -> Result<InstallerSettings> {
    let env: SeedEnv = envy::prefixed("SEED_")
        .from_env()
        .context("failed to read SEED_* environment variables")?;
    tracing::debug!(?env, "loaded environment settings");
    let settings = InstallerSettings::resolve(
        dirs::home_dir(),
        env.home,
        env.source.as_deref(),
        env.bin_dir,
    )?;
    Ok(settings)
}
