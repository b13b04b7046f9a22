//! Stage sequencer tests with a scripted stage driver.

#![allow(clippy::expect_used)]

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Result;
use seed_installer::application::ports::{InstallStateStore, ResourceRecorder};
use seed_installer::application::services::sequencer::{SequencerPorts, StageDriver, run};
use seed_installer::domain::error::InstallError;
use seed_installer::domain::plan::{INSTALLATION_PLAN, Stage, StageName, StageStatus};
use seed_installer::domain::resource::{InstallationState, Resource, ResourceKind};
use seed_installer::infra::fs::StdFs;
use seed_installer::infra::state::StateManager;

use crate::helpers::{NoopReporter, RecordingGate};

/// Each stage creates one file under `root`, named after the stage.
struct ScriptedDriver {
    root: PathBuf,
    satisfied: HashSet<StageName>,
    fail_at: Option<StageName>,
    executed: Mutex<Vec<StageName>>,
}

impl ScriptedDriver {
    fn new(root: PathBuf) -> Self {
        Self {
            root,
            satisfied: HashSet::new(),
            fail_at: None,
            executed: Mutex::new(Vec::new()),
        }
    }

    fn path(&self, stage: StageName) -> PathBuf {
        self.root.join(stage.as_str())
    }

    fn executed(&self) -> Vec<StageName> {
        self.executed.lock().expect("lock").clone()
    }
}

impl StageDriver for ScriptedDriver {
    async fn is_satisfied(&self, stage: StageName) -> Result<bool> {
        Ok(self.satisfied.contains(&stage))
    }

    async fn execute(&self, stage: StageName, recorder: &mut impl ResourceRecorder) -> Result<()> {
        self.executed.lock().expect("lock").push(stage);
        let path = self.path(stage);
        recorder
            .record(Resource::new(ResourceKind::File, &path, stage))
            .await?;
        std::fs::write(&path, stage.as_str())?;
        if self.fail_at == Some(stage) {
            anyhow::bail!("scripted failure in {stage}");
        }
        Ok(())
    }
}

struct Fixture {
    _dir: tempfile::TempDir,
    root: PathBuf,
    store: StateManager,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path().join("work");
    std::fs::create_dir_all(&root).expect("mkdir");
    let store = StateManager::with_path(dir.path().join("state.yaml"));
    Fixture {
        _dir: dir,
        root,
        store,
    }
}

fn ports<'a>(
    f: &'a Fixture,
    gate: &'a RecordingGate,
) -> SequencerPorts<'a, StateManager, StdFs, NoopReporter, RecordingGate> {
    SequencerPorts {
        store: &f.store,
        fs: &StdFs,
        reporter: &NoopReporter,
        confirm: gate,
    }
}

#[tokio::test]
async fn test_runs_every_stage_in_order() {
    let f = fixture();
    let driver = ScriptedDriver::new(f.root.clone());
    let gate = RecordingGate::default();

    let outcome = run(&INSTALLATION_PLAN, &driver, ports(&f, &gate), std::future::pending())
        .await
        .expect("run");

    let order: Vec<StageName> = INSTALLATION_PLAN.iter().map(|s| s.name).collect();
    assert_eq!(driver.executed(), order);
    assert!(outcome.stages.iter().all(|s| s.status == StageStatus::Succeeded));
    assert_eq!(outcome.state.resource_ledger.len(), 5);
    assert_eq!(
        gate.asked(),
        vec![StageName::SystemDependencies, StageName::Package, StageName::Launcher]
    );

    let persisted = f.store.load_async().await.expect("load").expect("state");
    assert_eq!(persisted.completed_stages.len(), 5);
    assert_eq!(persisted.resource_ledger, outcome.state.resource_ledger);
}

#[tokio::test]
async fn test_satisfied_stage_is_skipped_without_prompting() {
    let f = fixture();
    let mut driver = ScriptedDriver::new(f.root.clone());
    driver.satisfied.insert(StageName::Package);
    let gate = RecordingGate::declining(StageName::Package);

    let outcome = run(&INSTALLATION_PLAN, &driver, ports(&f, &gate), std::future::pending())
        .await
        .expect("declining a satisfied stage is never asked");

    assert!(!driver.executed().contains(&StageName::Package));
    assert!(!gate.asked().contains(&StageName::Package));
    let package = outcome
        .stages
        .iter()
        .find(|s| s.name == StageName::Package)
        .expect("package");
    assert_eq!(package.status, StageStatus::Skipped);
}

#[tokio::test]
async fn test_failure_rolls_back_only_this_run() {
    let f = fixture();
    let earlier = f.root.join("earlier");
    std::fs::write(&earlier, "from a previous run").expect("write");
    let previous = InstallationState {
        resource_ledger: vec![Resource::new(ResourceKind::File, &earlier, StageName::BaseLayout)],
        ..InstallationState::default()
    };
    f.store.save_async(&previous).await.expect("seed state");

    let mut driver = ScriptedDriver::new(f.root.clone());
    driver.fail_at = Some(StageName::Environment);
    let gate = RecordingGate::default();

    let err = run(&INSTALLATION_PLAN, &driver, ports(&f, &gate), std::future::pending())
        .await
        .expect_err("fails");

    assert_eq!(err.stage, Some(StageName::Environment));
    assert!(matches!(err.error, InstallError::EnvironmentProvisionFailed { .. }));
    let rollback = err.rollback.as_ref().expect("rollback outcome");
    assert_eq!(rollback.removed.len(), 3);
    assert!(rollback.is_complete());
    // Newest first.
    assert_eq!(rollback.removed[0].created_by_stage, StageName::Environment);

    for stage in [StageName::BaseLayout, StageName::SystemDependencies, StageName::Environment] {
        assert!(!driver.path(stage).exists(), "{stage} left behind");
    }
    assert!(earlier.exists(), "earlier run's resource must survive");

    let persisted = f.store.load_async().await.expect("load").expect("state");
    assert_eq!(persisted.resource_ledger, previous.resource_ledger);
    assert!(persisted.completed_stages.is_empty());
}

#[tokio::test]
async fn test_failure_on_fresh_state_clears_state_file() {
    let f = fixture();
    let mut driver = ScriptedDriver::new(f.root.clone());
    driver.fail_at = Some(StageName::BaseLayout);
    let gate = RecordingGate::default();

    let err = run(&INSTALLATION_PLAN, &driver, ports(&f, &gate), std::future::pending())
        .await
        .expect_err("fails");
    assert_eq!(err.exit_code(), 1);
    assert!(f.store.load_async().await.expect("load").is_none());
}

#[tokio::test]
async fn test_decline_cancels_with_exit_code_4() {
    let f = fixture();
    let driver = ScriptedDriver::new(f.root.clone());
    let gate = RecordingGate::declining(StageName::Launcher);

    let err = run(&INSTALLATION_PLAN, &driver, ports(&f, &gate), std::future::pending())
        .await
        .expect_err("declined");
    assert_eq!(err.exit_code(), 4);
    assert_eq!(err.stage, Some(StageName::Launcher));
    assert!(!driver.executed().contains(&StageName::Launcher));
    assert_eq!(err.rollback.as_ref().expect("rollback").removed.len(), 4);
    assert!(std::fs::read_dir(&f.root).expect("read").next().is_none());
}

#[tokio::test]
async fn test_prompt_error_is_treated_as_cancel() {
    let f = fixture();
    let driver = ScriptedDriver::new(f.root.clone());
    let gate = |_: &Stage| -> Result<bool> { anyhow::bail!("not a terminal") };
    let ports = SequencerPorts {
        store: &f.store,
        fs: &StdFs,
        reporter: &NoopReporter,
        confirm: &gate,
    };

    let err = run(&INSTALLATION_PLAN, &driver, ports, std::future::pending())
        .await
        .expect_err("cancelled");
    assert!(matches!(err.error, InstallError::UserCancelled { .. }));
    assert_eq!(err.stage, Some(StageName::SystemDependencies));
}

#[tokio::test]
async fn test_interrupt_cancels_and_rolls_back() {
    let f = fixture();
    let driver = ScriptedDriver::new(f.root.clone());
    let gate = RecordingGate::default();

    let err = run(&INSTALLATION_PLAN, &driver, ports(&f, &gate), std::future::ready(()))
        .await
        .expect_err("interrupted");
    assert_eq!(err.exit_code(), 4);
    assert!(std::fs::read_dir(&f.root).expect("read").next().is_none());
    assert!(f.store.load_async().await.expect("load").is_none());
}
