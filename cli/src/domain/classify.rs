//! Failure classification: raw errors in, taxonomy variant plus hint out.
//!
//! The sequencer calls [`classify`] exactly once per failed run. Everything
//! here is a pure function of the error chain.

use std::sync::LazyLock;

use regex::RegexSet;
use serde::Serialize;
use thiserror::Error;

use crate::domain::error::{CommandFailure, InstallError};
use crate::domain::plan::StageName;
use crate::domain::resource::RollbackOutcome;

/// A failure mapped onto the closed taxonomy, ready to show the user.
#[derive(Debug, Clone, Error)]
#[error("{error}")]
pub struct ClassifiedError {
    /// Stage that was running, if any.
    pub stage: Option<StageName>,
    pub error: InstallError,
    /// One-line remediation hint.
    pub hint: String,
    /// Raw tool output or error chain, shown only on request.
    pub detail: Option<String>,
    /// What the automatic rollback did, when one ran.
    pub rollback: Option<RollbackOutcome>,
}

impl ClassifiedError {
    /// Classify an error raised outside any stage.
    #[must_use]
    pub fn from_install_error(error: InstallError) -> Self {
        let hint = default_hint(&error).to_string();
        Self {
            stage: None,
            error,
            hint,
            detail: None,
            rollback: None,
        }
    }

    #[must_use]
    pub fn with_rollback(mut self, outcome: RollbackOutcome) -> Self {
        self.rollback = Some(outcome);
        self
    }

    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.error.exit_code()
    }
}

/// JSON shape of a classified failure.
#[derive(Debug, Serialize)]
pub struct ClassifiedErrorView<'a> {
    pub error: bool,
    pub code: &'static str,
    pub message: String,
    pub hint: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<StageName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollback: Option<&'a RollbackOutcome>,
}

impl<'a> From<&'a ClassifiedError> for ClassifiedErrorView<'a> {
    fn from(c: &'a ClassifiedError) -> Self {
        Self {
            error: true,
            code: c.error.code(),
            message: c.error.to_string(),
            hint: &c.hint,
            stage: c.stage,
            detail: c.detail.as_deref(),
            rollback: c.rollback.as_ref(),
        }
    }
}

/// Map a raw failure raised while `stage` was running onto the taxonomy.
///
/// Order of precedence: an [`InstallError`] anywhere in the chain wins; a bare
/// [`CommandFailure`] becomes `Unclassified` with its command and status; any
/// other error becomes the running stage's own variant.
#[must_use]
pub fn classify(stage: Option<StageName>, err: &anyhow::Error) -> ClassifiedError {
    let command_failure = find_in_chain::<CommandFailure>(err);
    let chain_text = format!("{err:#}");

    let error = if let Some(known) = find_in_chain::<InstallError>(err) {
        known.clone()
    } else if let Some(failure) = command_failure {
        InstallError::Unclassified {
            command: Some(failure.command.clone()),
            exit_status: failure.exit_status,
            detail: last_line(&failure.stderr),
        }
    } else {
        stage_error(stage, chain_text.clone())
    };

    let stderr = command_failure.map(|f| f.stderr.as_str()).unwrap_or_default();
    let hint = refine_hint(&format!("{chain_text}\n{stderr}"))
        .unwrap_or_else(|| default_hint(&error))
        .to_string();

    let detail = match command_failure {
        Some(f) if !f.stderr.is_empty() => Some(f.stderr.clone()),
        _ => Some(chain_text).filter(|t| *t != error.to_string()),
    };

    ClassifiedError {
        stage,
        error,
        hint,
        detail,
        rollback: None,
    }
}

fn stage_error(stage: Option<StageName>, detail: String) -> InstallError {
    match stage {
        Some(StageName::Environment) => InstallError::EnvironmentProvisionFailed { detail },
        Some(StageName::Package) => InstallError::PackageInstallFailed { detail },
        Some(StageName::Launcher) => InstallError::LauncherDeployFailed { detail },
        Some(StageName::BaseLayout | StageName::SystemDependencies) | None => {
            InstallError::Unclassified {
                command: None,
                exit_status: None,
                detail,
            }
        }
    }
}

/// Typed errors may sit in the chain as a wrapped source or as `.context()`.
fn find_in_chain<T>(err: &anyhow::Error) -> Option<&T>
where
    T: std::error::Error + Send + Sync + 'static,
{
    err.downcast_ref::<T>()
        .or_else(|| err.chain().find_map(|e| e.downcast_ref::<T>()))
}

fn last_line(text: &str) -> String {
    text.lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("no output")
        .trim()
        .to_string()
}

// ── Hints ─────────────────────────────────────────────────────────────────────

const SIGNATURE_HINTS: &[&str] = &[
    "Permission denied: re-run as a user with sudo rights, or check ownership of the base path.",
    "Another package manager is running; wait for it to finish and retry.",
    "The disk is full; free space under the base path and retry.",
    "DNS lookup failed; check your network connection or proxy settings.",
    "The Python venv module is missing; install python3-venv (apt) or python3 (dnf) and retry.",
    "No package manager found; install Homebrew from https://brew.sh and retry.",
];

static SIGNATURES: LazyLock<RegexSet> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    RegexSet::new([
        r"(?i)permission denied|not in the sudoers|a password is required|operation not permitted",
        r"(?i)could not get lock|waiting for cache lock|is locked by another|another app is currently holding",
        r"(?i)no space left on device",
        r"(?i)temporary failure in name resolution|could not resolve host|name or service not known|nodename nor servname",
        r"(?i)no module named venv|ensurepip is not available",
        r"(?i)no package manager available",
    ])
    .expect("valid regex set")
});

/// Hint for the first known signature found in `text`, if any.
#[must_use]
pub fn refine_hint(text: &str) -> Option<&'static str> {
    SIGNATURES
        .matches(text)
        .iter()
        .next()
        .and_then(|i| SIGNATURE_HINTS.get(i).copied())
}

/// Hint used when no signature matches.
#[must_use]
pub fn default_hint(error: &InstallError) -> &'static str {
    match error {
        InstallError::PlatformUnsupported { .. } => {
            "Supported platforms: Debian/Ubuntu or Fedora/RHEL-family Linux, and macOS."
        }
        InstallError::RequirementUnmet(_) => {
            "Fix the listed requirements, then run `seed-install install` again."
        }
        InstallError::DependencyInstallFailed { .. } => {
            "Install the package with your package manager, then run the installer again."
        }
        InstallError::EnvironmentProvisionFailed { .. } => {
            "Check that `python3 -m venv` works on this machine."
        }
        InstallError::PackageInstallFailed { .. } => {
            "Check SEED_SOURCE and your network connection, then run the installer again."
        }
        InstallError::LauncherDeployFailed { .. } => {
            "Check that the bin directory and your shell profile files are writable."
        }
        InstallError::UserCancelled { .. } => {
            "Run `seed-install install` again when ready; pass --yes to skip prompts."
        }
        InstallError::RollbackPartialFailure { .. } => {
            "Remove the listed paths by hand, then run `seed-install rollback` again."
        }
        InstallError::Unclassified { .. } => {
            "Re-run with --verbose for details, or run `seed-install diagnose`."
        }
    }
}
