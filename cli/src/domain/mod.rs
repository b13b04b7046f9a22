//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod classify;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod layout;
pub mod packages;
pub mod plan;
pub mod profile;
pub mod resource;
pub mod source;

pub use classify::{ClassifiedError, classify};
pub use config::{InstallerSettings, SeedConfig};
pub use diagnostics::{CheckStatus, DiagnosticCheck, DiagnosticReport};
pub use error::{CommandFailure, ConfigError, InstallError, RequirementUnmet};
pub use layout::BaseLayout;
pub use plan::{INSTALLATION_PLAN, PlannedStage, Stage, StageName, StageReport, StageStatus};
pub use profile::{OsFamily, PackageManager, SystemProfile};
pub use resource::{InstallationState, Resource, ResourceKind, RollbackOutcome};
pub use source::SourceSpec;
