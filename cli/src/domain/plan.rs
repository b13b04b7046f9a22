//! The fixed installation plan and stage lifecycle types.
//!
//! Pure data only. The plan is compiled in; users cannot reorder or extend it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of an installation stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageName {
    BaseLayout,
    SystemDependencies,
    Environment,
    Package,
    Launcher,
}

impl StageName {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BaseLayout => "base-layout",
            Self::SystemDependencies => "system-dependencies",
            Self::Environment => "environment",
            Self::Package => "package",
            Self::Launcher => "launcher",
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single stage definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    pub name: StageName,
    pub description: &'static str,
    /// Whether the user must approve the stage before it mutates anything.
    pub requires_confirmation: bool,
}

/// The installation plan, in execution order.
pub const INSTALLATION_PLAN: [Stage; 5] = [
    Stage {
        name: StageName::BaseLayout,
        description: "Create the SEED directory layout and default configuration",
        requires_confirmation: false,
    },
    Stage {
        name: StageName::SystemDependencies,
        description: "Install system packages (python3, openssl, sqlite); may use sudo",
        requires_confirmation: true,
    },
    Stage {
        name: StageName::Environment,
        description: "Create the isolated Python environment",
        requires_confirmation: false,
    },
    Stage {
        name: StageName::Package,
        description: "Download and install the SEED framework package",
        requires_confirmation: true,
    },
    Stage {
        name: StageName::Launcher,
        description: "Install the `seed` launcher and add it to your shell PATH",
        requires_confirmation: true,
    },
];

/// Lifecycle of one stage within a run.
///
/// `Pending → Running → {Succeeded, Failed, Skipped}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Skipped,
}

/// Phase of the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Executing,
    Completed,
    RollingBack,
    RolledBack,
}

/// Status of one stage as reported at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageReport {
    pub name: StageName,
    pub status: StageStatus,
}

/// What `--dry-run` would do for one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedStage {
    pub name: StageName,
    pub description: &'static str,
    pub requires_confirmation: bool,
    /// The idempotency check already passes; the stage would be skipped.
    pub satisfied: bool,
    /// Human-readable list of the changes the stage would make.
    pub changes: Vec<String>,
}
