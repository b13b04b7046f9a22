//! Application service: read-only installation audit.
//!
//! Every check degrades to a `warn`/`fail` entry instead of an error; the
//! only write is the report file itself.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::application::ports::{
    CommandRunner, HostInspector, InstallStateStore, LocalFs, NetworkProbe,
};
use crate::application::services::environment::{self, MIN_PYTHON};
use crate::application::services::launcher::{self, SHIM_MARKER};
use crate::application::services::requirements::{
    MIN_DISK_MB, NETWORK_TIMEOUT, REQUIRED_ENDPOINTS, REQUIRED_TOOLS, available_space_mb,
};
use crate::application::services::layout::CONFIG_MODE;
use crate::application::services::{package, probe};
use crate::domain::config::InstallerSettings;
use crate::domain::diagnostics::{DiagnosticCheck, DiagnosticReport, ReportFile};
use crate::domain::layout::{BaseLayout, ENTRY_POINT};
use crate::domain::profile::{OsFamily, SystemProfile};
use crate::domain::resource::{InstallationState, ResourceKind};

/// Audit the installation described by `settings`.
pub async fn diagnose(
    runner: &impl CommandRunner,
    host: &impl HostInspector,
    network: &impl NetworkProbe,
    fs: &impl LocalFs,
    store: &impl InstallStateStore,
    settings: &InstallerSettings,
    timestamp: DateTime<Utc>,
) -> DiagnosticReport {
    let layout = &settings.layout;
    let mut checks = Vec::new();

    let profile = match probe::probe(runner, host).await {
        Ok(p) => {
            checks.push(DiagnosticCheck::pass(
                "platform",
                format!(
                    "{} ({}, {})",
                    p.os_family,
                    p.distro_id.as_deref().unwrap_or("-"),
                    p.package_manager
                ),
            ));
            Some(p)
        }
        Err(e) => {
            checks.push(DiagnosticCheck::fail("platform", format!("{e:#}")));
            None
        }
    };

    let state = match store.load_async().await {
        Ok(Some(state)) => {
            checks.push(DiagnosticCheck::pass(
                "state",
                format!(
                    "{} stage(s) recorded, {} resource(s) in ledger",
                    state.completed_stages.len(),
                    state.resource_ledger.len()
                ),
            ));
            Some(state)
        }
        Ok(None) => {
            checks.push(DiagnosticCheck::warn(
                "state",
                format!("no installation state at {}", store.location().display()),
            ));
            None
        }
        Err(e) => {
            checks.push(DiagnosticCheck::fail("state", format!("{e:#}")));
            None
        }
    };
    if let Some(state) = &state {
        checks.push(check_resources(fs, state));
    }
    checks.push(check_permissions(fs, layout));

    checks.push(match environment::environment_version(runner, fs, layout).await {
        Some(v) if v >= MIN_PYTHON => DiagnosticCheck::pass("environment", format!("Python {v}")),
        Some(v) => DiagnosticCheck::fail(
            "environment",
            format!("Python {v} is older than {MIN_PYTHON}"),
        ),
        None => DiagnosticCheck::fail(
            "environment",
            format!("no working interpreter at {}", layout.venv_python().display()),
        ),
    });

    checks.push(match package::installed_version(runner, fs, layout).await {
        Some(version) => DiagnosticCheck::pass("package", version),
        None => DiagnosticCheck::fail(
            "package",
            format!("`{ENTRY_POINT} --version` did not succeed"),
        ),
    });

    checks.push(check_launcher(fs, settings));
    checks.push(check_path(fs, host, profile.as_ref(), settings));

    checks.push(match available_space_mb(runner, fs, layout.root()).await {
        Ok((path, mb)) if mb >= MIN_DISK_MB => {
            DiagnosticCheck::pass("disk", format!("{mb} MB free at {}", path.display()))
        }
        Ok((path, mb)) => DiagnosticCheck::warn(
            "disk",
            format!("{mb} MB free at {} (recommended {MIN_DISK_MB} MB)", path.display()),
        ),
        Err(e) => DiagnosticCheck::warn("disk", format!("{e:#}")),
    });

    let missing: Vec<&str> = REQUIRED_TOOLS
        .iter()
        .copied()
        .filter(|t| host.which(t).is_none())
        .collect();
    checks.push(if missing.is_empty() {
        DiagnosticCheck::pass("tools", REQUIRED_TOOLS.join(", "))
    } else {
        DiagnosticCheck::fail("tools", format!("not found: {}", missing.join(", ")))
    });

    let mut unreachable = Vec::new();
    for (host_name, port) in REQUIRED_ENDPOINTS {
        let ok = network
            .check_tcp_connectivity(host_name, *port, NETWORK_TIMEOUT)
            .await
            .unwrap_or(false);
        if !ok {
            unreachable.push(format!("{host_name}:{port}"));
        }
    }
    checks.push(if unreachable.is_empty() {
        DiagnosticCheck::pass("network", "all endpoints reachable")
    } else {
        DiagnosticCheck::warn("network", format!("unreachable: {}", unreachable.join(", ")))
    });

    DiagnosticReport {
        timestamp,
        profile,
        state_file: store.location().to_path_buf(),
        checks,
    }
}

fn check_resources(fs: &impl LocalFs, state: &InstallationState) -> DiagnosticCheck {
    let mut missing = Vec::new();
    let mut checked = 0usize;
    for resource in &state.resource_ledger {
        let present = match resource.kind {
            ResourceKind::SystemPackage => continue,
            ResourceKind::PathEntry => resource
                .line
                .as_deref()
                .is_some_and(|line| launcher::has_line(fs, &resource.location, line)),
            ResourceKind::Directory | ResourceKind::Venv | ResourceKind::File => {
                fs.exists(&resource.location)
            }
        };
        checked += 1;
        if !present {
            missing.push(resource.to_string());
        }
    }
    if missing.is_empty() {
        DiagnosticCheck::pass("resources", format!("all {checked} recorded resource(s) present"))
    } else {
        DiagnosticCheck::fail("resources", format!("missing: {}", missing.join("; ")))
    }
}

fn check_permissions(fs: &impl LocalFs, layout: &BaseLayout) -> DiagnosticCheck {
    if !fs.exists(layout.root()) {
        return DiagnosticCheck::warn(
            "permissions",
            format!("{} does not exist", layout.root().display()),
        );
    }

    let mut problems = Vec::new();
    let dirs = std::iter::once(layout.root().to_path_buf()).chain(layout.subdirectories());
    for dir in dirs {
        match fs.mode(&dir) {
            Some(mode) if mode & 0o200 != 0 => {}
            Some(mode) => problems.push(format!("{} is not writable ({mode:04o})", dir.display())),
            None => problems.push(format!("{} is missing", dir.display())),
        }
    }

    let config = layout.config_file();
    match fs.mode(&config) {
        Some(mode) if mode & 0o777 == CONFIG_MODE => {}
        Some(mode) => problems.push(format!(
            "{} has mode {:04o}, expected {CONFIG_MODE:04o}",
            config.display(),
            mode & 0o777
        )),
        None => problems.push(format!("{} is missing", config.display())),
    }

    if problems.is_empty() {
        DiagnosticCheck::pass(
            "permissions",
            format!("{} writable, config is {CONFIG_MODE:04o}", layout.root().display()),
        )
    } else {
        DiagnosticCheck::fail("permissions", problems.join("; "))
    }
}

fn check_launcher(fs: &impl LocalFs, settings: &InstallerSettings) -> DiagnosticCheck {
    let shim = settings.bin_dir.join(ENTRY_POINT);
    if !fs.exists(&shim) {
        return DiagnosticCheck::fail("launcher", format!("{} not found", shim.display()));
    }
    if !fs.is_executable(&shim) {
        return DiagnosticCheck::fail("launcher", format!("{} is not executable", shim.display()));
    }
    let managed = fs
        .read_to_string(&shim)
        .is_ok_and(|c| c.contains(SHIM_MARKER));
    if managed {
        DiagnosticCheck::pass("launcher", shim.display().to_string())
    } else {
        DiagnosticCheck::warn(
            "launcher",
            format!("{} was not written by this installer", shim.display()),
        )
    }
}

fn check_path(
    fs: &impl LocalFs,
    host: &impl HostInspector,
    profile: Option<&SystemProfile>,
    settings: &InstallerSettings,
) -> DiagnosticCheck {
    let bin_dir = &settings.bin_dir;
    if host.search_path().iter().any(|p| p == bin_dir) {
        return DiagnosticCheck::pass("path", format!("{} is on PATH", bin_dir.display()));
    }

    let line = launcher::path_line(bin_dir);
    let families: &[OsFamily] = match profile {
        Some(p) => std::slice::from_ref(&p.os_family),
        None => &[OsFamily::Linux, OsFamily::Macos],
    };
    let configured: Vec<PathBuf> = families
        .iter()
        .flat_map(|os| launcher::profile_candidates(*os))
        .map(|f| settings.user_home.join(f))
        .filter(|p| launcher::has_line(fs, p, &line))
        .collect();

    if configured.is_empty() {
        DiagnosticCheck::fail(
            "path",
            format!("{} is not on PATH and no shell profile adds it", bin_dir.display()),
        )
    } else {
        DiagnosticCheck::warn(
            "path",
            format!(
                "configured in {}; open a new shell to pick it up",
                configured
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        )
    }
}

/// Write the report as JSON under `<base>/logs/`.
///
/// Writes nothing when the logs directory does not exist: diagnosing never
/// creates installer-owned paths outside the ledger.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_report(
    fs: &impl LocalFs,
    layout: &BaseLayout,
    report: &DiagnosticReport,
) -> Result<ReportFile> {
    let logs = layout.logs_dir();
    if !fs.exists(&logs) {
        return Ok(ReportFile::NotWritten {
            reason: format!("{} does not exist; run `seed-install install` first", logs.display()),
        });
    }
    let path = logs.join(report.file_name());
    let json = serde_json::to_string_pretty(report).context("serializing diagnostic report")?;
    fs.write(&path, json)?;
    Ok(ReportFile::Written { path })
}
