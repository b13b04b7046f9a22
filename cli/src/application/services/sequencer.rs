//! Application service: the stage sequencer.
//!
//! Drives the installation plan one stage at a time and owns the single
//! recovery path: any failure, decline, or interrupt rolls back exactly the
//! resources this run recorded, then surfaces one classified error.

use std::future::Future;
use std::pin::Pin;

use anyhow::Result;

use crate::application::ports::{
    ConfirmationGate, InstallStateStore, LocalFs, ProgressReporter, ResourceRecorder,
};
use crate::application::services::ledger::Ledger;
use crate::application::services::rollback;
use crate::domain::classify::{ClassifiedError, classify};
use crate::domain::error::InstallError;
use crate::domain::plan::{RunPhase, Stage, StageName, StageReport, StageStatus};
use crate::domain::resource::{InstallationState, StageOutcome};

/// Supplies each stage's idempotency check and action.
#[allow(async_fn_in_trait)]
pub trait StageDriver {
    /// Whether the stage's goal already holds. Must not mutate anything.
    async fn is_satisfied(&self, stage: StageName) -> Result<bool>;
    /// Perform the stage, recording every resource before creating it.
    async fn execute(&self, stage: StageName, recorder: &mut impl ResourceRecorder) -> Result<()>;
}

/// Ports the sequencer needs besides the driver.
pub struct SequencerPorts<'a, S, F, R, C> {
    pub store: &'a S,
    pub fs: &'a F,
    pub reporter: &'a R,
    pub confirm: &'a C,
}

/// Result of a run that reached the end of the plan.
#[derive(Debug, Clone)]
pub struct SequenceOutcome {
    pub state: InstallationState,
    pub stages: Vec<StageReport>,
}

/// Run `plan` in order.
///
/// `interrupt` resolves when the user asks to abort (Ctrl-C); it is raced
/// against each stage action and treated like a declined confirmation.
///
/// # Errors
///
/// Returns the classified failure, with the rollback outcome attached when a
/// stage had started.
pub async fn run<D, S, F, R, C>(
    plan: &[Stage],
    driver: &D,
    ports: SequencerPorts<'_, S, F, R, C>,
    interrupt: impl Future<Output = ()>,
) -> Result<SequenceOutcome, ClassifiedError>
where
    D: StageDriver,
    S: InstallStateStore,
    F: LocalFs,
    R: ProgressReporter,
    C: ConfirmationGate,
{
    let SequencerPorts {
        store,
        fs,
        reporter,
        confirm,
    } = ports;

    let mut ledger = Ledger::open(store).await.map_err(|e| classify(None, &e))?;
    let mut stages: Vec<StageReport> = plan
        .iter()
        .map(|s| StageReport {
            name: s.name,
            status: StageStatus::Pending,
        })
        .collect();
    let mut interrupt = std::pin::pin!(interrupt);
    tracing::info!(phase = ?RunPhase::Executing, stages = plan.len(), "installation started");

    for (index, stage) in plan.iter().enumerate() {
        stages[index].status = StageStatus::Running;
        tracing::info!(stage = %stage.name, "stage running");

        let result = run_stage(stage, driver, &mut ledger, confirm, reporter, interrupt.as_mut()).await;
        match result {
            Ok(outcome) => {
                stages[index].status = match outcome {
                    StageOutcome::Succeeded => StageStatus::Succeeded,
                    StageOutcome::Skipped => StageStatus::Skipped,
                };
                tracing::info!(stage = %stage.name, status = ?stages[index].status, "stage finished");
            }
            Err(err) => {
                stages[index].status = StageStatus::Failed;
                let classified = classify(Some(stage.name), &err);
                tracing::warn!(
                    stage = %stage.name,
                    code = classified.error.code(),
                    phase = ?RunPhase::RollingBack,
                    "stage failed: {err:#}",
                );
                reporter.warn(&format!(
                    "Stage '{}' did not complete; undoing changes from this run",
                    stage.name
                ));

                let recorded = ledger.this_run().to_vec();
                let outcome = rollback::rollback(fs, &recorded, reporter);
                if let Err(e) = ledger.settle_rollback(&outcome).await {
                    tracing::warn!(error = %format!("{e:#}"), "could not update state after rollback");
                }
                tracing::info!(
                    phase = ?RunPhase::RolledBack,
                    removed = outcome.removed.len(),
                    failed = outcome.failed.len(),
                    "rollback finished",
                );
                return Err(classified.with_rollback(outcome));
            }
        }
    }

    tracing::info!(phase = ?RunPhase::Completed, "installation finished");
    Ok(SequenceOutcome {
        state: ledger.into_state(),
        stages,
    })
}

async fn run_stage<D, S, C, R>(
    stage: &Stage,
    driver: &D,
    ledger: &mut Ledger<'_, S>,
    confirm: &C,
    reporter: &R,
    interrupt: Pin<&mut impl Future<Output = ()>>,
) -> Result<StageOutcome>
where
    D: StageDriver,
    S: InstallStateStore,
    C: ConfirmationGate,
    R: ProgressReporter,
{
    let cancelled = || InstallError::UserCancelled {
        stage: stage.name.to_string(),
    };

    if driver.is_satisfied(stage.name).await? {
        reporter.success(&format!("{}: already satisfied", stage.name));
        ledger.complete_stage(stage.name, StageOutcome::Skipped).await?;
        return Ok(StageOutcome::Skipped);
    }

    if stage.requires_confirmation {
        match confirm.confirm(stage) {
            Ok(true) => {}
            Ok(false) => return Err(cancelled().into()),
            Err(e) => {
                tracing::warn!(error = %e, "confirmation prompt aborted");
                return Err(cancelled().into());
            }
        }
    }

    reporter.step(stage.description);
    // A pending Ctrl-C wins over a stage that is also ready.
    tokio::select! {
        biased;
        () = interrupt => return Err(cancelled().into()),
        result = driver.execute(stage.name, ledger) => result?,
    }

    ledger.complete_stage(stage.name, StageOutcome::Succeeded).await?;
    reporter.success(&format!("{}: done", stage.name));
    Ok(StageOutcome::Succeeded)
}
