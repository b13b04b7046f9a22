//! Recorded side effects and the persisted installation state.
//!
//! This module is intentionally free of I/O, async, and external layer imports.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::plan::StageName;

/// Kind of a reversible side effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Directory,
    Venv,
    File,
    PathEntry,
    SystemPackage,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Directory => "directory",
            Self::Venv => "venv",
            Self::File => "file",
            Self::PathEntry => "path_entry",
            Self::SystemPackage => "system_package",
        };
        f.write_str(label)
    }
}

/// A single recorded, reversible side effect.
///
/// `location` is a filesystem path for every kind except `SystemPackage`,
/// where it holds the package-manager specific package name. `line` is only
/// set for `PathEntry` and holds the exact text appended to the profile file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub kind: ResourceKind,
    pub location: PathBuf,
    pub created_by_stage: StageName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<String>,
}

impl Resource {
    #[must_use]
    pub fn new(kind: ResourceKind, location: impl Into<PathBuf>, stage: StageName) -> Self {
        Self {
            kind,
            location: location.into(),
            created_by_stage: stage,
            line: None,
        }
    }

    /// A profile line appended to `profile`.
    #[must_use]
    pub fn path_entry(profile: impl Into<PathBuf>, line: &str, stage: StageName) -> Self {
        Self {
            kind: ResourceKind::PathEntry,
            location: profile.into(),
            created_by_stage: stage,
            line: Some(line.to_string()),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.location.display())
    }
}

/// Terminal status of a stage as recorded in state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageOutcome {
    Succeeded,
    /// The idempotency check reported the stage as already satisfied.
    Skipped,
}

/// One completed stage in run order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecord {
    pub name: StageName,
    pub outcome: StageOutcome,
}

/// Installation state persisted to `<base>/installer-state.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallationState {
    /// Stages completed by the most recent run, in order.
    #[serde(default)]
    pub completed_stages: Vec<StageRecord>,
    /// Every recorded resource, in creation order.
    #[serde(default)]
    pub resource_ledger: Vec<Resource>,
    /// When the state was last written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl InstallationState {
    /// Whether the ledger already holds an identical resource.
    #[must_use]
    pub fn contains(&self, resource: &Resource) -> bool {
        self.resource_ledger.iter().any(|r| {
            r.kind == resource.kind && r.location == resource.location && r.line == resource.line
        })
    }

    /// Whether nothing is recorded at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.completed_stages.is_empty() && self.resource_ledger.is_empty()
    }
}

/// A resource the rollback walk could not remove.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollbackFailure {
    pub resource: Resource,
    pub reason: String,
}

/// Result of walking a ledger in reverse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RollbackOutcome {
    pub removed: Vec<Resource>,
    pub failed: Vec<RollbackFailure>,
    /// Resources the installer never undoes itself (system packages).
    pub manual_follow_up: Vec<Resource>,
}

impl RollbackOutcome {
    /// Whether every removable resource is gone.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Resources still present after the walk, in ledger order.
    #[must_use]
    pub fn unremoved(&self) -> Vec<Resource> {
        let mut left: Vec<Resource> = self.failed.iter().map(|f| f.resource.clone()).collect();
        left.reverse();
        left
    }
}
