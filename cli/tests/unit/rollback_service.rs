//! Explicit rollback and purge tests.

#![allow(clippy::expect_used)]

use seed_installer::application::ports::InstallStateStore;
use seed_installer::application::services::install::{InstallOptions, install};
use seed_installer::application::services::rollback::{purge_base, rollback, rollback_recorded};
use seed_installer::domain::plan::StageName;
use seed_installer::domain::resource::{InstallationState, Resource, ResourceKind};
use seed_installer::infra::fs::StdFs;

use crate::helpers::{BASHRC, FakeSystem, NoopReporter, RecordingGate, Sandbox};

async fn full_install(sys: &FakeSystem, sandbox: &Sandbox) {
    install(
        sys,
        sys,
        sys,
        &StdFs,
        &sandbox.store,
        InstallOptions {
            settings: &sandbox.settings,
            reporter: &NoopReporter,
            confirm: &RecordingGate::default(),
            unattended: true,
            dry_run: false,
        },
        std::future::pending(),
    )
    .await
    .expect("install");
}

#[tokio::test]
async fn test_rollback_after_full_install_restores_home() {
    let sys = FakeSystem::ubuntu();
    let sandbox = Sandbox::new();
    let before = sandbox.snapshot();
    full_install(&sys, &sandbox).await;
    assert_ne!(sandbox.snapshot(), before);

    let outcome = rollback_recorded(&sandbox.store, &StdFs, &NoopReporter)
        .await
        .expect("rollback")
        .expect("something recorded");

    assert!(outcome.is_complete(), "{:?}", outcome.failed);
    assert_eq!(outcome.manual_follow_up.len(), 3);
    assert_eq!(sandbox.bashrc(), BASHRC);
    assert_eq!(sandbox.snapshot(), before);
    assert!(sandbox.store.load_async().await.expect("load").is_none());
}

#[tokio::test]
async fn test_rollback_without_state_is_none() {
    let sandbox = Sandbox::new();
    let before = sandbox.snapshot();

    let outcome = rollback_recorded(&sandbox.store, &StdFs, &NoopReporter)
        .await
        .expect("rollback");

    assert!(outcome.is_none());
    assert_eq!(sandbox.snapshot(), before);
}

#[tokio::test]
async fn test_rollback_runs_in_reverse_order() {
    let sandbox = Sandbox::new();
    let base = sandbox.base().to_path_buf();
    let nested = base.join("bin");
    std::fs::create_dir_all(&nested).expect("dirs");
    let resources = vec![
        Resource::new(ResourceKind::Directory, &base, StageName::BaseLayout),
        Resource::new(ResourceKind::Directory, &nested, StageName::Launcher),
    ];

    let outcome = rollback(&StdFs, &resources, &NoopReporter);

    let removed: Vec<_> = outcome.removed.iter().map(|r| r.location.clone()).collect();
    assert_eq!(removed, vec![nested, base.clone()]);
    assert!(!base.exists());
}

#[tokio::test]
async fn test_failed_step_is_kept_in_state_and_walk_continues() {
    let sandbox = Sandbox::new();
    let base = sandbox.base().to_path_buf();
    std::fs::create_dir_all(&base).expect("base");
    let broken = Resource {
        line: None,
        ..Resource::new(ResourceKind::PathEntry, sandbox.home.join(".bashrc"), StageName::Launcher)
    };
    let state = InstallationState {
        resource_ledger: vec![
            Resource::new(ResourceKind::Directory, &base, StageName::BaseLayout),
            broken.clone(),
        ],
        ..InstallationState::default()
    };
    // State lives outside the base so it survives the directory removal.
    let store = seed_installer::infra::state::StateManager::with_path(
        sandbox.dir.path().join("state.yaml"),
    );
    store.save_async(&state).await.expect("save");

    let outcome = rollback_recorded(&store, &StdFs, &NoopReporter)
        .await
        .expect("rollback")
        .expect("outcome");

    assert!(!outcome.is_complete());
    assert_eq!(outcome.failed.len(), 1);
    assert!(outcome.failed[0].reason.contains("no recorded line"));
    assert!(!base.exists(), "the walk continued past the failure");
    assert_eq!(sandbox.bashrc(), BASHRC);

    let left = store.load_async().await.expect("load").expect("state kept");
    assert_eq!(left.resource_ledger, vec![broken]);
    assert!(left.completed_stages.is_empty());
}

#[tokio::test]
async fn test_already_removed_resources_count_as_removed() {
    let sandbox = Sandbox::new();
    let gone = Resource::new(ResourceKind::File, sandbox.home.join("never-created"), StageName::Launcher);

    let outcome = rollback(&StdFs, std::slice::from_ref(&gone), &NoopReporter);

    assert_eq!(outcome.removed, vec![gone]);
    assert!(outcome.is_complete());
}

#[test]
fn test_purge_base_removes_user_data() {
    let sandbox = Sandbox::new();
    let data = sandbox.settings.layout.root().join("data");
    std::fs::create_dir_all(&data).expect("data");
    std::fs::write(data.join("memory.db"), "agent memory").expect("write");

    assert!(purge_base(&StdFs, &sandbox.settings.layout).expect("purge"));
    assert!(!sandbox.base().exists());
    assert!(!purge_base(&StdFs, &sandbox.settings.layout).expect("second purge"));
    assert_eq!(sandbox.bashrc(), BASHRC);
}
