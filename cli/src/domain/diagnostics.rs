//! Diagnostic report types.
//!
//! Pure data only. The diagnostics service fills these in; the report is
//! written once and never read back by the installer.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::profile::SystemProfile;

/// Outcome of a single diagnostic check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// A single named check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticCheck {
    pub name: String,
    pub status: CheckStatus,
    pub detail: String,
}

impl DiagnosticCheck {
    pub fn pass(name: &str, detail: impl Into<String>) -> Self {
        Self::new(name, CheckStatus::Pass, detail)
    }

    pub fn warn(name: &str, detail: impl Into<String>) -> Self {
        Self::new(name, CheckStatus::Warn, detail)
    }

    pub fn fail(name: &str, detail: impl Into<String>) -> Self {
        Self::new(name, CheckStatus::Fail, detail)
    }

    fn new(name: &str, status: CheckStatus, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status,
            detail: detail.into(),
        }
    }
}

/// Snapshot of installed state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticReport {
    pub timestamp: DateTime<Utc>,
    /// `None` when the platform could not be resolved.
    pub profile: Option<SystemProfile>,
    pub state_file: PathBuf,
    pub checks: Vec<DiagnosticCheck>,
}

impl DiagnosticReport {
    /// Worst status across all checks (`Pass` when there are none).
    #[must_use]
    pub fn overall(&self) -> CheckStatus {
        self.checks
            .iter()
            .map(|c| c.status)
            .max()
            .unwrap_or(CheckStatus::Pass)
    }

    /// File name the report is written under, e.g. `diagnose-20240102T030405Z.json`.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("diagnose-{}.json", self.timestamp.format("%Y%m%dT%H%M%SZ"))
    }

    /// Look up a check by name.
    #[must_use]
    pub fn check(&self, name: &str) -> Option<&DiagnosticCheck> {
        self.checks.iter().find(|c| c.name == name)
    }
}

/// Where the report file went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReportFile {
    Written { path: PathBuf },
    NotWritten { reason: String },
}
