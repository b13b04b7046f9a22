//! Application service: launcher shim and shell PATH configuration.
//!
//! Profile files are only ever appended to on the forward path. Removal of
//! the appended line is the rollback manager's job.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::application::ports::{LocalFs, ResourceRecorder};
use crate::domain::layout::{BaseLayout, ENTRY_POINT};
use crate::domain::plan::StageName;
use crate::domain::profile::{OsFamily, SystemProfile};
use crate::domain::resource::{Resource, ResourceKind};

/// Marker comment identifying a shim written by this installer.
pub const SHIM_MARKER: &str = "# seed launcher, managed by seed-installer";

/// Trailing marker on the PATH line appended to shell profiles.
pub const PATH_MARKER: &str = "# added by seed-installer";

/// Shell profile files considered on each OS family, in priority order.
#[must_use]
pub fn profile_candidates(os: OsFamily) -> &'static [&'static str] {
    match os {
        OsFamily::Linux => &[".bashrc", ".zshrc", ".profile"],
        OsFamily::Macos => &[".zshrc", ".bash_profile", ".profile"],
    }
}

/// Contents of the POSIX shim that activates the environment and execs the
/// entry point.
#[must_use]
pub fn shim_content(layout: &BaseLayout) -> String {
    format!(
        "#!/bin/sh\n{SHIM_MARKER}\n. \"{}\"\nexec \"{}\" \"$@\"\n",
        layout.venv_activate().display(),
        layout.venv_entry_point().display()
    )
}

/// The exact line appended to shell profiles.
#[must_use]
pub fn path_line(bin_dir: &Path) -> String {
    format!("export PATH=\"{}:$PATH\"  {PATH_MARKER}", bin_dir.display())
}

/// Profiles the PATH line goes into: every candidate that exists, or the
/// first candidate when none do.
pub fn target_profiles(fs: &impl LocalFs, os: OsFamily, home: &Path) -> Vec<PathBuf> {
    let candidates: Vec<PathBuf> = profile_candidates(os).iter().map(|f| home.join(f)).collect();
    let existing: Vec<PathBuf> = candidates.iter().filter(|p| fs.exists(p)).cloned().collect();
    if existing.is_empty() {
        candidates.into_iter().take(1).collect()
    } else {
        existing
    }
}

/// Whether `path` contains `line` verbatim as one of its lines.
pub fn has_line(fs: &impl LocalFs, path: &Path, line: &str) -> bool {
    fs.read_to_string(path)
        .is_ok_and(|content| content.lines().any(|l| l == line))
}

fn shim_is_current(fs: &impl LocalFs, shim: &Path, expected: &str) -> bool {
    fs.read_to_string(shim).is_ok_and(|c| c == expected) && fs.is_executable(shim)
}

/// Whether the shim is current and every target profile has the PATH line.
pub fn is_satisfied(
    fs: &impl LocalFs,
    profile: &SystemProfile,
    layout: &BaseLayout,
    bin_dir: &Path,
    home: &Path,
) -> bool {
    let line = path_line(bin_dir);
    shim_is_current(fs, &bin_dir.join(ENTRY_POINT), &shim_content(layout))
        && target_profiles(fs, profile.os_family, home)
            .iter()
            .all(|p| has_line(fs, p, &line))
}

/// Human-readable list of what [`deploy`] would change.
pub fn planned_changes(
    fs: &impl LocalFs,
    profile: &SystemProfile,
    layout: &BaseLayout,
    bin_dir: &Path,
    home: &Path,
) -> Vec<String> {
    let mut changes = Vec::new();
    if !fs.exists(bin_dir) {
        changes.push(format!("create {}", bin_dir.display()));
    }
    let shim = bin_dir.join(ENTRY_POINT);
    if !shim_is_current(fs, &shim, &shim_content(layout)) {
        changes.push(format!("write launcher {}", shim.display()));
    }
    let line = path_line(bin_dir);
    for target in target_profiles(fs, profile.os_family, home) {
        if !has_line(fs, &target, &line) {
            changes.push(format!("append PATH entry to {}", target.display()));
        }
    }
    changes
}

/// Write the shim and make `bin_dir` reachable from the user's shells.
///
/// Returns the shim (`file`) and every profile that was modified
/// (`path_entry`). A profile that did not exist yet is also recorded as a
/// `file` ahead of its entry, so rollback deletes it instead of leaving it
/// empty.
///
/// # Errors
///
/// Returns an error if the shim or a profile file cannot be written.
pub async fn deploy(
    fs: &impl LocalFs,
    profile: &SystemProfile,
    layout: &BaseLayout,
    bin_dir: &Path,
    home: &Path,
    recorder: &mut impl ResourceRecorder,
) -> Result<Vec<Resource>> {
    let mut deployed = Vec::new();

    if !fs.exists(bin_dir) {
        recorder
            .record(Resource::new(ResourceKind::Directory, bin_dir, StageName::Launcher))
            .await?;
        fs.create_dir_all(bin_dir)?;
    }

    let shim = bin_dir.join(ENTRY_POINT);
    let shim_resource = Resource::new(ResourceKind::File, &shim, StageName::Launcher);
    let content = shim_content(layout);
    if !shim_is_current(fs, &shim, &content) {
        recorder.record(shim_resource.clone()).await?;
        fs.write(&shim, content)?;
        fs.set_permissions(&shim, 0o755)?;
        tracing::info!(shim = %shim.display(), "launcher written");
    }
    deployed.push(shim_resource);

    let line = path_line(bin_dir);
    for target in target_profiles(fs, profile.os_family, home) {
        if has_line(fs, &target, &line) {
            continue;
        }
        if !fs.exists(&target) {
            recorder
                .record(Resource::new(ResourceKind::File, &target, StageName::Launcher))
                .await?;
        }
        let entry = Resource::path_entry(&target, &line, StageName::Launcher);
        recorder.record(entry.clone()).await?;
        fs.append_line(&target, &line)?;
        tracing::info!(profile = %target.display(), "PATH entry appended");
        deployed.push(entry);
    }

    Ok(deployed)
}
