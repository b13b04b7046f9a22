//! Application service: base directory layout and default configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::{LocalFs, ResourceRecorder};
use crate::domain::config::SeedConfig;
use crate::domain::layout::BaseLayout;
use crate::domain::plan::StageName;
use crate::domain::resource::{Resource, ResourceKind};

/// Permission bits of the generated config file.
pub const CONFIG_MODE: u32 = 0o600;

/// Directories the layout stage owns: the fixed subdirectories, plus the
/// launcher directory when it lives under the base path.
#[must_use]
pub fn owned_directories(layout: &BaseLayout, bin_dir: &Path) -> Vec<PathBuf> {
    let mut dirs = layout.subdirectories();
    let inside = bin_dir.starts_with(layout.root()) && bin_dir != layout.root();
    if inside && !dirs.iter().any(|d| d == bin_dir) {
        dirs.push(bin_dir.to_path_buf());
    }
    dirs
}

/// Whether the full layout and the config file already exist.
pub fn is_satisfied(fs: &impl LocalFs, layout: &BaseLayout, bin_dir: &Path) -> bool {
    fs.exists(layout.root())
        && owned_directories(layout, bin_dir).iter().all(|d| fs.exists(d))
        && fs.exists(&layout.config_file())
}

/// Human-readable list of what [`ensure_layout`] would create.
pub fn planned_changes(fs: &impl LocalFs, layout: &BaseLayout, bin_dir: &Path) -> Vec<String> {
    let mut changes = Vec::new();
    if !fs.exists(layout.root()) {
        changes.push(format!("create {}", layout.root().display()));
    }
    for dir in owned_directories(layout, bin_dir) {
        if !fs.exists(&dir) {
            changes.push(format!("create {}", dir.display()));
        }
    }
    if !fs.exists(&layout.config_file()) {
        changes.push(format!("write {}", layout.config_file().display()));
    }
    changes
}

/// Create the base path, its subdirectories, and the default config.
///
/// When the base path itself is new, only it is recorded: removing it takes
/// everything beneath with it. Otherwise each missing piece is recorded.
/// A `bin_dir` under the base path is created here so the launcher finds it
/// in place and records nothing for it.
///
/// # Errors
///
/// Returns an error if a directory or the config file cannot be created.
pub async fn ensure_layout(
    fs: &impl LocalFs,
    layout: &BaseLayout,
    bin_dir: &Path,
    recorder: &mut impl ResourceRecorder,
) -> Result<Vec<Resource>> {
    let mut recorded = Vec::new();
    let root_is_new = !fs.exists(layout.root());

    if root_is_new {
        let resource = Resource::new(ResourceKind::Directory, layout.root(), StageName::BaseLayout);
        recorder.record(resource.clone()).await?;
        recorded.push(resource);
        fs.create_dir_all(layout.root())?;
    }

    for dir in owned_directories(layout, bin_dir) {
        if fs.exists(&dir) {
            continue;
        }
        if !root_is_new {
            let resource = Resource::new(ResourceKind::Directory, &dir, StageName::BaseLayout);
            recorder.record(resource.clone()).await?;
            recorded.push(resource);
        }
        fs.create_dir_all(&dir)?;
    }

    let config_file = layout.config_file();
    if !fs.exists(&config_file) {
        if !root_is_new {
            let resource = Resource::new(ResourceKind::File, &config_file, StageName::BaseLayout);
            recorder.record(resource.clone()).await?;
            recorded.push(resource);
        }
        let yaml = serde_yaml::to_string(&SeedConfig::default())
            .context("cannot serialize default config")?;
        fs.write(&config_file, yaml)?;
        fs.set_permissions(&config_file, CONFIG_MODE)?;
    }

    tracing::info!(root = %layout.root().display(), recorded = recorded.len(), "base layout ready");
    Ok(recorded)
}
