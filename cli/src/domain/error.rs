//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::domain::resource::Resource;

// ── Install taxonomy ──────────────────────────────────────────────────────────

/// Closed failure taxonomy of an install, rollback, or probe.
///
/// Every stage failure ends up as exactly one of these variants at the
/// sequencer boundary. `Unclassified` carries the raw command so nothing is
/// swallowed.
#[derive(Debug, Clone, Error)]
pub enum InstallError {
    #[error("Unsupported platform: {}", platform_label(.kernel, .distro.as_deref()))]
    PlatformUnsupported {
        kernel: String,
        distro: Option<String>,
    },

    #[error("{} requirement(s) not met: {}", .0.len(), join_requirements(.0))]
    RequirementUnmet(Vec<RequirementUnmet>),

    #[error("Failed to install system package '{package}' (exit status {}): {detail}", status_label(*.exit_status))]
    DependencyInstallFailed {
        package: String,
        exit_status: Option<i32>,
        detail: String,
    },

    #[error("Failed to provision the runtime environment: {detail}")]
    EnvironmentProvisionFailed { detail: String },

    #[error("Failed to install the framework package: {detail}")]
    PackageInstallFailed { detail: String },

    #[error("Failed to deploy the launcher: {detail}")]
    LauncherDeployFailed { detail: String },

    #[error("Installation cancelled at stage '{stage}'.")]
    UserCancelled { stage: String },

    #[error("Rollback left {} resource(s) in place", .unremoved.len())]
    RollbackPartialFailure { unremoved: Vec<Resource> },

    #[error("{}", unclassified_label(.command.as_deref(), *.exit_status, .detail))]
    Unclassified {
        command: Option<String>,
        exit_status: Option<i32>,
        detail: String,
    },
}

impl InstallError {
    /// Process exit code for this failure.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::PlatformUnsupported { .. } => 2,
            Self::RequirementUnmet(_) => 3,
            Self::UserCancelled { .. } => 4,
            _ => 1,
        }
    }

    /// Stable machine-readable code used by `--json` output.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::PlatformUnsupported { .. } => "PLATFORM_UNSUPPORTED",
            Self::RequirementUnmet(_) => "REQUIREMENT_UNMET",
            Self::DependencyInstallFailed { .. } => "DEPENDENCY_INSTALL_FAILED",
            Self::EnvironmentProvisionFailed { .. } => "ENVIRONMENT_PROVISION_FAILED",
            Self::PackageInstallFailed { .. } => "PACKAGE_INSTALL_FAILED",
            Self::LauncherDeployFailed { .. } => "LAUNCHER_DEPLOY_FAILED",
            Self::UserCancelled { .. } => "USER_CANCELLED",
            Self::RollbackPartialFailure { .. } => "ROLLBACK_PARTIAL_FAILURE",
            Self::Unclassified { .. } => "UNCLASSIFIED",
        }
    }
}

/// A single unmet installation prerequisite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequirementUnmet {
    /// Not enough free space under the base path.
    Disk {
        path: PathBuf,
        available_mb: u64,
        required_mb: u64,
    },
    /// An endpoint did not accept a TCP connection within the timeout.
    Network { endpoint: String },
    /// A required executable is not on the search path.
    Tool { name: String },
}

impl RequirementUnmet {
    /// Short category label: `disk`, `network`, or `tool`.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Disk { .. } => "disk",
            Self::Network { .. } => "network",
            Self::Tool { .. } => "tool",
        }
    }
}

impl fmt::Display for RequirementUnmet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disk {
                path,
                available_mb,
                required_mb,
            } => write!(
                f,
                "disk: {available_mb} MB free at {} (need {required_mb} MB)",
                path.display()
            ),
            Self::Network { endpoint } => write!(f, "network: {endpoint} unreachable"),
            Self::Tool { name } => write!(f, "tool: '{name}' not found on PATH"),
        }
    }
}

// ── Raw command failure ───────────────────────────────────────────────────────

/// A child process that exited unsuccessfully.
///
/// Raised by services next to the command they ran; the classifier inspects
/// `stderr` for known signatures.
#[derive(Debug, Clone, Error)]
#[error("`{command}` exited with status {}", status_label(*.exit_status))]
pub struct CommandFailure {
    pub command: String,
    pub exit_status: Option<i32>,
    pub stderr: String,
}

impl CommandFailure {
    /// Build a failure from a program, its arguments, and its captured output.
    #[must_use]
    pub fn new(program: &str, args: &[&str], exit_status: Option<i32>, stderr: &[u8]) -> Self {
        let mut command = program.to_string();
        for arg in args {
            command.push(' ');
            command.push_str(arg);
        }
        Self {
            command,
            exit_status,
            stderr: String::from_utf8_lossy(stderr).trim().to_string(),
        }
    }
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to installer settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid package source '{0}': expected a requirement, 'git+<url>@<ref>', or 'path:<dir>'")]
    InvalidSource(String),

    #[error("Cannot determine home directory; set HOME")]
    NoHome,
}

// ── Formatting helpers ────────────────────────────────────────────────────────

fn platform_label(kernel: &str, distro: Option<&str>) -> String {
    match distro {
        Some(id) => format!("{kernel} ({id})"),
        None => kernel.to_string(),
    }
}

fn status_label(status: Option<i32>) -> String {
    status.map_or_else(|| "unknown".to_string(), |code| code.to_string())
}

fn join_requirements(reqs: &[RequirementUnmet]) -> String {
    reqs.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn unclassified_label(command: Option<&str>, status: Option<i32>, detail: &str) -> String {
    match command {
        Some(cmd) => format!("`{cmd}` failed (exit status {}): {detail}", status_label(status)),
        None => detail.to_string(),
    }
}
