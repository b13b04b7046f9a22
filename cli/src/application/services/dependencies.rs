//! Application service: system dependency installation.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! All I/O is routed through injected port traits.

use std::process::Output;
use std::time::Duration;

use anyhow::Result;

use crate::application::ports::{CommandRunner, HostInspector, ResourceRecorder};
use crate::domain::error::{CommandFailure, InstallError};
use crate::domain::packages::{
    Invocation, SYSTEM_DEPENDENCIES, SystemDependency, install_command, is_stale_index, lookup,
    refresh_command,
};
use crate::domain::plan::StageName;
use crate::domain::profile::SystemProfile;
use crate::domain::resource::{Resource, ResourceKind};

/// Upper bound for a single package-manager invocation.
pub const PACKAGE_MANAGER_TIMEOUT: Duration = Duration::from_secs(20 * 60);

/// Whether every dependency's executable is already resolvable.
pub fn is_satisfied(host: &impl HostInspector) -> bool {
    SYSTEM_DEPENDENCIES
        .iter()
        .all(|dep| host.which(dep.executable).is_some())
}

/// Human-readable list of the install commands that would run.
pub fn planned_changes(host: &impl HostInspector, profile: &SystemProfile) -> Vec<String> {
    SYSTEM_DEPENDENCIES
        .iter()
        .filter(|dep| host.which(dep.executable).is_none())
        .map(|dep| {
            install_command(
                profile.package_manager,
                dep.packages(profile.package_manager),
                profile.is_root,
            )
            .map_or_else(
                || format!("install {} (no package manager available)", dep.name),
                |cmd| format!("run `{cmd}`"),
            )
        })
        .collect()
}

/// Install every system dependency in table order.
///
/// # Errors
///
/// Returns the first [`InstallError::DependencyInstallFailed`] encountered.
pub async fn install_all(
    runner: &impl CommandRunner,
    host: &impl HostInspector,
    profile: &SystemProfile,
    recorder: &mut impl ResourceRecorder,
) -> Result<Vec<Resource>> {
    let mut installed = Vec::new();
    for dep in SYSTEM_DEPENDENCIES {
        if let Some(resource) = install(runner, host, profile, dep.name, recorder).await? {
            installed.push(resource);
        }
    }
    Ok(installed)
}

/// Idempotently install one logical dependency.
///
/// Returns `None` when the executable is already on the search path. On a
/// failure that looks like a stale package index, the index is refreshed and
/// the install retried exactly once.
///
/// # Errors
///
/// Returns [`InstallError::DependencyInstallFailed`] when the package manager
/// is missing or the install keeps failing.
pub async fn install(
    runner: &impl CommandRunner,
    host: &impl HostInspector,
    profile: &SystemProfile,
    logical_name: &str,
    recorder: &mut impl ResourceRecorder,
) -> Result<Option<Resource>> {
    let dep = lookup(logical_name)
        .ok_or_else(|| anyhow::anyhow!("unknown system dependency '{logical_name}'"))?;

    if let Some(path) = host.which(dep.executable) {
        tracing::debug!(dependency = dep.name, path = %path.display(), "already installed");
        return Ok(None);
    }

    let manager = profile.package_manager;
    let packages = dep.packages(manager);
    let Some(command) = install_command(manager, packages, profile.is_root) else {
        return Err(InstallError::DependencyInstallFailed {
            package: dep.name.to_string(),
            exit_status: None,
            detail: "no package manager available on this system".to_string(),
        }
        .into());
    };

    let resource = Resource::new(
        ResourceKind::SystemPackage,
        packages.join(" "),
        StageName::SystemDependencies,
    );
    recorder.record(resource.clone()).await?;

    let first = run_invocation(runner, &command).await?;
    if first.status.success() {
        tracing::info!(dependency = dep.name, "installed via {manager}");
        return Ok(Some(resource));
    }

    let combined = combined_output(&first);
    if !is_stale_index(manager, &combined) {
        return Err(install_failure(dep, &command, &first));
    }

    tracing::warn!(dependency = dep.name, "package index looks stale; refreshing and retrying once");
    if let Some(refresh) = refresh_command(manager, profile.is_root) {
        let refreshed = run_invocation(runner, &refresh).await?;
        if !refreshed.status.success() {
            return Err(install_failure(dep, &refresh, &refreshed));
        }
    }

    let second = run_invocation(runner, &command).await?;
    if second.status.success() {
        tracing::info!(dependency = dep.name, "installed via {manager} after index refresh");
        Ok(Some(resource))
    } else {
        Err(install_failure(dep, &command, &second))
    }
}

async fn run_invocation(runner: &impl CommandRunner, invocation: &Invocation) -> Result<Output> {
    tracing::debug!(command = %invocation, "running package manager");
    runner
        .run_with_timeout(
            &invocation.program,
            &invocation.arg_refs(),
            PACKAGE_MANAGER_TIMEOUT,
        )
        .await
}

fn combined_output(output: &Output) -> String {
    format!(
        "{}\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

fn install_failure(dep: &SystemDependency, invocation: &Invocation, output: &Output) -> anyhow::Error {
    let failure = CommandFailure::new(
        &invocation.program,
        &invocation.arg_refs(),
        output.status.code(),
        combined_output(output).trim().as_bytes(),
    );
    let detail = failure
        .stderr
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or_default()
        .to_string();
    anyhow::Error::new(failure).context(InstallError::DependencyInstallFailed {
        package: dep.name.to_string(),
        exit_status: output.status.code(),
        detail,
    })
}
