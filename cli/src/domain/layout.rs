//! Filesystem layout under the SEED base path.
//!
//! Pure path arithmetic; nothing here touches the disk.

use std::path::{Path, PathBuf};

/// Subdirectories created under the base path.
pub const SUBDIRECTORIES: &[&str] = &["config", "data", "cache", "logs", "agents"];

/// Installer state file name, relative to the base path.
pub const STATE_FILE: &str = "installer-state.yaml";

/// Name of the framework's console entry point.
pub const ENTRY_POINT: &str = "seed";

/// Paths derived from the base path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseLayout {
    root: PathBuf,
}

impl BaseLayout {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every subdirectory of the layout, in creation order.
    #[must_use]
    pub fn subdirectories(&self) -> Vec<PathBuf> {
        SUBDIRECTORIES.iter().map(|d| self.root.join(d)).collect()
    }

    #[must_use]
    pub fn config_file(&self) -> PathBuf {
        self.root.join("config").join("config.yaml")
    }

    #[must_use]
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    #[must_use]
    pub fn state_file(&self) -> PathBuf {
        self.root.join(STATE_FILE)
    }

    #[must_use]
    pub fn default_bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    #[must_use]
    pub fn venv_dir(&self) -> PathBuf {
        self.root.join("venv")
    }

    #[must_use]
    pub fn venv_python(&self) -> PathBuf {
        self.venv_dir().join("bin").join("python")
    }

    #[must_use]
    pub fn venv_activate(&self) -> PathBuf {
        self.venv_dir().join("bin").join("activate")
    }

    #[must_use]
    pub fn venv_entry_point(&self) -> PathBuf {
        self.venv_dir().join("bin").join(ENTRY_POINT)
    }
}
