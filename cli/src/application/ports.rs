//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use anyhow::Result;

use crate::domain::{InstallationState, Resource, Stage};

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
}

// ── Host Inspection Port ──────────────────────────────────────────────────────

/// Read-only facts about the local host that do not need a child process.
pub trait HostInspector {
    /// Contents of `/etc/os-release`, if readable.
    fn os_release(&self) -> Option<String>;
    /// Resolve an executable on the current search path.
    fn which(&self, program: &str) -> Option<PathBuf>;
    /// Whether stdin is attached to a terminal.
    fn is_interactive(&self) -> bool;
    /// Entries of the process `PATH`, in order.
    fn search_path(&self) -> Vec<PathBuf>;
}

// ── Network Probe Port ────────────────────────────────────────────────────────

/// Abstracts network connectivity checks so application services can be tested
/// without real network access.
#[allow(async_fn_in_trait)]
pub trait NetworkProbe {
    /// Check that `host:port` accepts a TCP connection within `timeout`.
    async fn check_tcp_connectivity(&self, host: &str, port: u16, timeout: Duration)
    -> Result<bool>;
}

// ── Filesystem Port ───────────────────────────────────────────────────────────

/// Abstracts local filesystem mutations so services never touch `std::fs`.
pub trait LocalFs {
    fn exists(&self, path: &Path) -> bool;
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    fn remove_dir_all(&self, path: &Path) -> Result<()>;
    fn remove_file(&self, path: &Path) -> Result<()>;
    fn write(&self, path: &Path, content: String) -> Result<()>;
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn set_permissions(&self, path: &Path, mode: u32) -> Result<()>;
    /// Whether `path` is a regular file with an execute bit set.
    fn is_executable(&self, path: &Path) -> bool;
    /// Permission bits of `path`; `None` when it cannot be stat'ed.
    fn mode(&self, path: &Path) -> Option<u32>;
    /// Append `line` to `path`, creating the file if needed.
    ///
    /// A newline is inserted first when the file does not already end in one.
    fn append_line(&self, path: &Path, line: &str) -> Result<()>;
    /// Remove every line exactly equal to `line` from `path`.
    ///
    /// The rewrite must be atomic: readers observe either the old or the new
    /// contents, never a truncated file.
    fn remove_line(&self, path: &Path, line: &str) -> Result<()>;
}

// ── State Port ────────────────────────────────────────────────────────────────

/// Abstracts installer state persistence (load/save/clear).
#[allow(async_fn_in_trait)]
pub trait InstallStateStore {
    /// Load the persisted state, returning `None` if no state exists.
    async fn load_async(&self) -> Result<Option<InstallationState>>;
    /// Persist the given state.
    async fn save_async(&self, state: &InstallationState) -> Result<()>;
    /// Remove the persisted state, if any.
    async fn clear_async(&self) -> Result<()>;
    /// Where the state lives, for user-facing messages.
    fn location(&self) -> &Path;
}

// ── Resource Recording Port ───────────────────────────────────────────────────

/// Write-ahead sink for reversible side effects.
///
/// Components call `record` strictly *before* performing the mutation the
/// resource describes.
#[allow(async_fn_in_trait)]
pub trait ResourceRecorder {
    /// Record a resource. Recording an identical resource twice is a no-op.
    async fn record(&mut self, resource: Resource) -> Result<()>;
}

/// In-memory recorder for callers that persist elsewhere.
impl ResourceRecorder for Vec<Resource> {
    async fn record(&mut self, resource: Resource) -> Result<()> {
        let duplicate = self.iter().any(|r| {
            r.kind == resource.kind && r.location == resource.location && r.line == resource.line
        });
        if !duplicate {
            self.push(resource);
        }
        Ok(())
    }
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait; no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── Confirmation Port ─────────────────────────────────────────────────────────

/// Asks the user to approve a stage before it runs.
pub trait ConfirmationGate {
    /// `Ok(false)` declines; an error means the prompt itself was interrupted.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt cannot be shown or is aborted.
    fn confirm(&self, stage: &Stage) -> Result<bool>;
}

impl<F> ConfirmationGate for F
where
    F: Fn(&Stage) -> Result<bool>,
{
    fn confirm(&self, stage: &Stage) -> Result<bool> {
        self(stage)
    }
}
