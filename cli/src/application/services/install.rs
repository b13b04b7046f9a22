//! Application service: the install use-case.
//!
//! Probe → validate → sequence. Nothing is written to disk before the
//! requirement checks pass, and `--dry-run` never writes at all.

use std::future::Future;

use anyhow::{Result, bail};

use crate::application::ports::{
    CommandRunner, ConfirmationGate, HostInspector, InstallStateStore, LocalFs, NetworkProbe,
    ProgressReporter,
};
use crate::application::services::driver::InstallDriver;
use crate::application::services::sequencer::{self, SequenceOutcome, SequencerPorts, StageDriver};
use crate::application::services::{probe, requirements};
use crate::domain::classify::{ClassifiedError, classify};
use crate::domain::config::InstallerSettings;
use crate::domain::plan::{INSTALLATION_PLAN, PlannedStage, Stage};
use crate::domain::profile::SystemProfile;

pub struct InstallOptions<'a, R: ProgressReporter, C: ConfirmationGate> {
    pub settings: &'a InstallerSettings,
    pub reporter: &'a R,
    pub confirm: &'a C,
    /// The gate answers without a terminal (`--yes`, CI).
    pub unattended: bool,
    pub dry_run: bool,
}

/// Gate bound to the probed profile: with no terminal attached, only an
/// unattended gate may answer.
struct TerminalGate<'a, C> {
    inner: &'a C,
    can_answer: bool,
}

impl<C: ConfirmationGate> ConfirmationGate for TerminalGate<'_, C> {
    fn confirm(&self, stage: &Stage) -> Result<bool> {
        if !self.can_answer {
            bail!("no terminal to confirm '{}'; rerun with --yes", stage.name);
        }
        self.inner.confirm(stage)
    }
}

/// Outcome of the install use-case.
#[derive(Debug)]
pub enum InstallOutcome {
    /// Every stage succeeded or was already satisfied.
    Installed {
        profile: SystemProfile,
        outcome: SequenceOutcome,
    },
    /// Preview only; nothing was changed.
    DryRun {
        profile: SystemProfile,
        stages: Vec<PlannedStage>,
    },
}

/// Install the framework, or preview the plan with `dry_run`.
///
/// # Errors
///
/// Returns the classified failure. Probe and validation failures carry no
/// rollback outcome because nothing has been changed yet.
pub async fn install<RN, H, N, F, S, R, C>(
    runner: &RN,
    host: &H,
    network: &N,
    fs: &F,
    store: &S,
    opts: InstallOptions<'_, R, C>,
    interrupt: impl Future<Output = ()>,
) -> Result<InstallOutcome, ClassifiedError>
where
    RN: CommandRunner,
    H: HostInspector,
    N: NetworkProbe,
    F: LocalFs,
    S: InstallStateStore,
    R: ProgressReporter,
    C: ConfirmationGate,
{
    let InstallOptions {
        settings,
        reporter,
        confirm,
        unattended,
        dry_run,
    } = opts;

    reporter.step("Detecting platform...");
    let profile = probe::probe(runner, host)
        .await
        .map_err(|e| classify(None, &e))?;
    reporter.success(&format!(
        "Platform: {} ({}, {})",
        profile.os_family,
        profile.distro_id.as_deref().unwrap_or("-"),
        profile.package_manager
    ));

    reporter.step("Checking requirements...");
    requirements::validate(runner, host, network, fs, &profile, settings.layout.root())
        .await
        .map_err(|e| classify(None, &e))?;
    reporter.success("Requirements met");

    let driver = InstallDriver::new(runner, host, fs, &profile, settings);

    if dry_run {
        let mut stages = Vec::with_capacity(INSTALLATION_PLAN.len());
        for stage in &INSTALLATION_PLAN {
            let satisfied = driver
                .is_satisfied(stage.name)
                .await
                .map_err(|e| classify(Some(stage.name), &e))?;
            let changes = if satisfied {
                Vec::new()
            } else {
                driver.planned_changes(stage.name)
            };
            stages.push(PlannedStage {
                name: stage.name,
                description: stage.description,
                requires_confirmation: stage.requires_confirmation,
                satisfied,
                changes,
            });
        }
        return Ok(InstallOutcome::DryRun { profile, stages });
    }

    let confirm = TerminalGate {
        inner: confirm,
        can_answer: profile.interactive || unattended,
    };
    let outcome = sequencer::run(
        &INSTALLATION_PLAN,
        &driver,
        SequencerPorts {
            store,
            fs,
            reporter,
            confirm: &confirm,
        },
        interrupt,
    )
    .await?;
    Ok(InstallOutcome::Installed { profile, outcome })
}
