//! Application service: platform detection.
//!
//! Gathers raw host facts through ports and hands them to the pure resolver
//! in `crate::domain::profile`.

use anyhow::{Context, Result};

use crate::application::ports::{CommandRunner, HostInspector};
use crate::domain::profile::{HostFacts, SystemProfile, resolve_profile};

/// Probe the host once and resolve its [`SystemProfile`].
///
/// # Errors
///
/// Returns [`crate::domain::InstallError::PlatformUnsupported`] for hosts
/// outside the supported set, or an error if `uname` cannot be run.
pub async fn probe(runner: &impl CommandRunner, host: &impl HostInspector) -> Result<SystemProfile> {
    let uname = runner
        .run("uname", &["-s"])
        .await
        .context("failed to run uname")?;
    anyhow::ensure!(uname.status.success(), "uname -s exited with {}", uname.status);
    let kernel = String::from_utf8_lossy(&uname.stdout).trim().to_string();

    let facts = HostFacts {
        kernel,
        os_release: host.os_release(),
        brew_available: host.which("brew").is_some(),
        interactive: host.is_interactive(),
        is_root: effective_uid_is_root(runner).await,
    };
    tracing::debug!(kernel = %facts.kernel, brew = facts.brew_available, root = facts.is_root, "probed host");

    let profile = resolve_profile(&facts)?;
    tracing::info!(
        os = %profile.os_family,
        distro = profile.distro_id.as_deref().unwrap_or("-"),
        package_manager = %profile.package_manager,
        "resolved platform profile",
    );
    Ok(profile)
}

/// `id -u` reports 0. Any failure is treated as an unprivileged user.
async fn effective_uid_is_root(runner: &impl CommandRunner) -> bool {
    match runner.run("id", &["-u"]).await {
        Ok(out) if out.status.success() => String::from_utf8_lossy(&out.stdout).trim() == "0",
        _ => false,
    }
}
