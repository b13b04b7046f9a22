//! Application service: pre-flight requirement validation.
//!
//! Every check runs independently and all unmet requirements are reported
//! together, so the user can fix them in one pass.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::application::ports::{CommandRunner, HostInspector, LocalFs, NetworkProbe};
use crate::domain::error::{InstallError, RequirementUnmet};
use crate::domain::profile::SystemProfile;

/// Minimum free space at the base path.
pub const MIN_DISK_MB: u64 = 500;

/// Endpoints that must accept a TCP connection.
pub const REQUIRED_ENDPOINTS: &[(&str, u16)] = &[("github.com", 443), ("pypi.org", 443)];

/// Per-endpoint connect timeout.
pub const NETWORK_TIMEOUT: Duration = Duration::from_secs(5);

/// Executables that must be on the search path before anything is installed.
pub const REQUIRED_TOOLS: &[&str] = &["git", "curl"];

/// Validate disk, network, and tool requirements.
///
/// # Errors
///
/// Returns [`InstallError::RequirementUnmet`] listing every unmet requirement,
/// or an error if free space cannot be measured.
pub async fn validate(
    runner: &impl CommandRunner,
    host: &impl HostInspector,
    network: &impl NetworkProbe,
    fs: &impl LocalFs,
    profile: &SystemProfile,
    base: &Path,
) -> Result<()> {
    tracing::debug!(os = %profile.os_family, base = %base.display(), "validating requirements");
    let mut unmet = Vec::new();

    let (probed, available_mb) = available_space_mb(runner, fs, base).await?;
    if available_mb < MIN_DISK_MB {
        unmet.push(RequirementUnmet::Disk {
            path: probed,
            available_mb,
            required_mb: MIN_DISK_MB,
        });
    }

    for (host_name, port) in REQUIRED_ENDPOINTS {
        let reachable = network
            .check_tcp_connectivity(host_name, *port, NETWORK_TIMEOUT)
            .await
            .unwrap_or(false);
        if !reachable {
            unmet.push(RequirementUnmet::Network {
                endpoint: format!("{host_name}:{port}"),
            });
        }
    }

    for tool in REQUIRED_TOOLS {
        if host.which(tool).is_none() {
            unmet.push(RequirementUnmet::Tool {
                name: (*tool).to_string(),
            });
        }
    }

    if unmet.is_empty() {
        Ok(())
    } else {
        for req in &unmet {
            tracing::warn!(category = req.category(), "{req}");
        }
        Err(InstallError::RequirementUnmet(unmet).into())
    }
}

/// Free space in MB on the filesystem holding `path`.
///
/// `path` may not exist yet; the nearest existing ancestor is measured and
/// returned alongside the result.
///
/// # Errors
///
/// Returns an error if `df` cannot be run or its output cannot be parsed.
pub async fn available_space_mb(
    runner: &impl CommandRunner,
    fs: &impl LocalFs,
    path: &Path,
) -> Result<(PathBuf, u64)> {
    let probed = path
        .ancestors()
        .find(|p| !p.as_os_str().is_empty() && fs.exists(p))
        .unwrap_or_else(|| Path::new("/"))
        .to_path_buf();
    let probed_str = probed.to_string_lossy();
    let output = runner
        .run("df", &["-Pk", &probed_str])
        .await
        .context("failed to run df")?;
    anyhow::ensure!(
        output.status.success(),
        "df -Pk {probed_str} failed: {}",
        String::from_utf8_lossy(&output.stderr).trim()
    );
    let kb = parse_df_available_kb(&String::from_utf8_lossy(&output.stdout))
        .with_context(|| format!("unexpected df output for {probed_str}"))?;
    Ok((probed, kb / 1024))
}

/// Extract the "Available" column (in KiB) from POSIX `df -Pk` output.
#[must_use]
pub fn parse_df_available_kb(stdout: &str) -> Option<u64> {
    stdout
        .lines()
        .skip(1)
        .find(|l| !l.trim().is_empty())?
        .split_whitespace()
        .nth(3)?
        .parse()
        .ok()
}
