//! Human-readable terminal renderer.

use std::path::Path;

use owo_colors::OwoColorize as _;

use crate::application::services::install::InstallOutcome;
use crate::domain::classify::ClassifiedError;
use crate::domain::diagnostics::{CheckStatus, DiagnosticReport, ReportFile};
use crate::domain::plan::{PlannedStage, StageStatus};
use crate::domain::profile::SystemProfile;
use crate::domain::resource::RollbackOutcome;
use crate::output::OutputContext;

/// Renders domain types as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the result of `install`.
    pub fn render_install(&self, outcome: &InstallOutcome, state_file: &Path) {
        if self.ctx.quiet {
            return;
        }
        match outcome {
            InstallOutcome::DryRun { profile, stages } => self.render_plan(profile, stages),
            InstallOutcome::Installed { outcome, .. } => {
                println!();
                self.ctx.header("Installation summary");
                for report in &outcome.stages {
                    self.ctx
                        .kv(&format!("{:<20}", report.name), stage_status_display(report.status));
                }
                println!();
                self.ctx.kv("State:", &state_file.display().to_string());
                self.ctx
                    .success("SEED installed. Open a new shell or source your profile, then run: seed");
            }
        }
    }

    /// Render the dry-run preview.
    pub fn render_plan(&self, profile: &SystemProfile, stages: &[PlannedStage]) {
        if self.ctx.quiet {
            return;
        }
        println!();
        self.ctx.header("Installation plan (dry run)");
        self.ctx.kv(
            "Platform:",
            &format!(
                "{} ({}, {})",
                profile.os_family,
                profile.distro_id.as_deref().unwrap_or("-"),
                profile.package_manager
            ),
        );
        println!();
        for stage in stages {
            let gate = if stage.requires_confirmation {
                " [confirm]"
            } else {
                ""
            };
            if stage.satisfied {
                println!(
                    "  {} {}{gate}: {}",
                    "✓".style(self.ctx.styles.success),
                    stage.name,
                    "already satisfied".style(self.ctx.styles.dim)
                );
                continue;
            }
            println!(
                "  {} {}{gate}: {}",
                "→".style(self.ctx.styles.step),
                stage.name,
                stage.description
            );
            for change in &stage.changes {
                println!("      {change}");
            }
        }
        println!();
        self.ctx.info("No changes were made.");
    }

    /// Render the result of `rollback`.
    pub fn render_rollback(&self, outcome: Option<&RollbackOutcome>, purged: bool) {
        if self.ctx.quiet {
            return;
        }
        match outcome {
            None => self.ctx.info("Nothing to roll back."),
            Some(outcome) => {
                let noun = if outcome.removed.len() == 1 {
                    "resource"
                } else {
                    "resources"
                };
                self.ctx
                    .success(&format!("Removed {} {noun}", outcome.removed.len()));
                self.render_follow_up(outcome);
            }
        }
        if purged {
            self.ctx.success("Base path deleted");
        }
    }

    /// Render the diagnostic report.
    pub fn render_report(&self, report: &DiagnosticReport, report_file: &ReportFile) {
        if self.ctx.quiet {
            return;
        }
        println!();
        self.ctx.header("SEED installation diagnostics");
        println!();
        for check in &report.checks {
            println!(
                "    {} {:<12} {}",
                self.check_symbol(check.status),
                check.name,
                check.detail
            );
        }
        println!();
        match report.overall() {
            CheckStatus::Pass => self.ctx.success("Everything looks good!"),
            CheckStatus::Warn => self.ctx.warn("Installation usable with warnings."),
            CheckStatus::Fail => println!(
                "  {} Installation has problems.",
                "✗".style(self.ctx.styles.error)
            ),
        }
        match report_file {
            ReportFile::Written { path } => self.ctx.kv("Report:", &path.display().to_string()),
            ReportFile::NotWritten { reason } => {
                self.ctx.info(&format!("No report file written: {reason}"));
            }
        }
    }

    /// Render a classified failure to stderr. Never suppressed by `quiet`.
    pub fn render_error(&self, err: &ClassifiedError, state_file: &Path, verbose: bool) {
        let stage = err
            .stage
            .map(|s| format!(" (stage: {s})"))
            .unwrap_or_default();
        self.ctx.error(&format!("{}{stage}", err.error));
        eprintln!("    {} {}", "hint:".style(self.ctx.styles.dim), err.hint);
        if let Some(outcome) = &err.rollback {
            if outcome.is_complete() {
                eprintln!(
                    "    {} {} resource(s) from this run removed",
                    "rollback:".style(self.ctx.styles.dim),
                    outcome.removed.len()
                );
            } else {
                eprintln!(
                    "    {} {} resource(s) could not be removed",
                    "rollback:".style(self.ctx.styles.dim),
                    outcome.failed.len()
                );
                for failure in &outcome.failed {
                    eprintln!("      {}: {}", failure.resource, failure.reason);
                }
            }
            for resource in &outcome.manual_follow_up {
                eprintln!(
                    "    {} {resource} was left installed",
                    "note:".style(self.ctx.styles.dim)
                );
            }
        }
        eprintln!(
            "    {} {}",
            "state:".style(self.ctx.styles.dim),
            state_file.display()
        );
        if let Some(detail) = &err.detail {
            if verbose {
                eprintln!("    {}", "detail:".style(self.ctx.styles.dim));
                for line in detail.lines() {
                    eprintln!("      {line}");
                }
            } else {
                eprintln!(
                    "    {}",
                    "Run with --verbose for details.".style(self.ctx.styles.dim)
                );
            }
        }
    }

    fn render_follow_up(&self, outcome: &RollbackOutcome) {
        for failure in &outcome.failed {
            self.ctx
                .warn(&format!("Could not remove {}: {}", failure.resource, failure.reason));
        }
        for resource in &outcome.manual_follow_up {
            self.ctx.info(&format!(
                "System packages were left installed: {}",
                resource.location.display()
            ));
        }
    }

    fn check_symbol(&self, status: CheckStatus) -> String {
        match status {
            CheckStatus::Pass => "✓".style(self.ctx.styles.success).to_string(),
            CheckStatus::Warn => "⚠".style(self.ctx.styles.warning).to_string(),
            CheckStatus::Fail => "✗".style(self.ctx.styles.error).to_string(),
        }
    }
}

// ── Display helpers ──────────────────────────────────────────────────────────

#[must_use]
pub fn stage_status_display(status: StageStatus) -> &'static str {
    match status {
        StageStatus::Pending => "pending",
        StageStatus::Running => "running",
        StageStatus::Succeeded => "installed",
        StageStatus::Failed => "failed",
        StageStatus::Skipped => "already satisfied",
    }
}
