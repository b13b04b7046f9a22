//! Infrastructure implementation of the `InstallStateStore` port.
//!
//! `StateManager` provides async load/save using `tokio::task::spawn_blocking`
//! with atomic write (temp file + rename) to prevent state corruption. The
//! file is YAML so it stays readable and diffable by hand.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::InstallStateStore;
use crate::domain::resource::InstallationState;

/// State file manager: implements `InstallStateStore` for the infra layer.
pub struct StateManager {
    path: PathBuf,
}

impl StateManager {
    /// Create a state manager for an explicit path.
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Synchronous load, used internally by `load_async` via `spawn_blocking`.
    fn load_sync(&self) -> Result<Option<InstallationState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading state file {}", self.path.display()))?;
        let state: InstallationState = serde_yaml::from_str(&content)
            .with_context(|| format!("parsing state file {}", self.path.display()))?;
        Ok(Some(state))
    }

    /// Synchronous save, used internally by `save_async` via `spawn_blocking`.
    fn save_sync(&self, state: &InstallationState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        let content = serde_yaml::to_string(state).context("serializing state")?;

        let temp_path = self.path.with_extension("yaml.tmp");
        std::fs::write(&temp_path, &content)
            .with_context(|| format!("writing temp file {}", temp_path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("setting permissions on {}", temp_path.display()))?;
        }

        std::fs::rename(&temp_path, &self.path)
            .with_context(|| format!("finalizing state file {}", self.path.display()))?;

        Ok(())
    }

    /// Remove the state file.
    fn clear_sync(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)
                .with_context(|| format!("removing state file {}", self.path.display()))?;
        }
        Ok(())
    }
}

impl InstallStateStore for StateManager {
    async fn load_async(&self) -> Result<Option<InstallationState>> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || StateManager::with_path(path).load_sync())
            .await
            .context("state load task panicked")?
    }

    async fn save_async(&self, state: &InstallationState) -> Result<()> {
        let path = self.path.clone();
        let state = state.clone();
        tokio::task::spawn_blocking(move || StateManager::with_path(path).save_sync(&state))
            .await
            .context("state save task panicked")?
    }

    async fn clear_async(&self) -> Result<()> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || StateManager::with_path(path).clear_sync())
            .await
            .context("state clear task panicked")?
    }

    fn location(&self) -> &Path {
        &self.path
    }
}
