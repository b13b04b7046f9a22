//! Diagnostics use-case tests.

#![allow(clippy::expect_used)]

use chrono::{TimeZone, Utc};
use seed_installer::application::services::diagnostics::{diagnose, write_report};
use seed_installer::application::services::install::{InstallOptions, install};
use seed_installer::domain::diagnostics::{CheckStatus, DiagnosticReport, ReportFile};
use seed_installer::infra::fs::StdFs;

use crate::helpers::{FakeSystem, NoopReporter, RecordingGate, Sandbox};

async fn run_diagnose(sys: &FakeSystem, sandbox: &Sandbox) -> DiagnosticReport {
    diagnose(
        sys,
        sys,
        sys,
        &StdFs,
        &sandbox.store,
        &sandbox.settings,
        Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).single().expect("valid"),
    )
    .await
}

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

fn status(report: &DiagnosticReport, name: &str) -> CheckStatus {
    report
        .check(name)
        .unwrap_or_else(|| panic!("check '{name}' missing"))
        .status
}

#[tokio::test]
async fn test_healthy_install_passes_every_check_but_path() {
    let sys = FakeSystem::ubuntu();
    let sandbox = Sandbox::new();
    full_install(&sys, &sandbox).await;
    let before = sandbox.snapshot();

    let report = run_diagnose(&sys, &sandbox).await;

    for name in [
        "platform",
        "state",
        "resources",
        "permissions",
        "environment",
        "package",
        "launcher",
        "disk",
        "tools",
        "network",
    ] {
        assert_eq!(status(&report, name), CheckStatus::Pass, "{name}: {:?}", report.check(name));
    }
    // The fake search path never contains the sandbox bin dir.
    assert_eq!(status(&report, "path"), CheckStatus::Warn);
    assert_eq!(report.overall(), CheckStatus::Warn);
    assert_eq!(sandbox.snapshot(), before, "diagnose is read-only");
}

#[tokio::test]
async fn test_missing_install_reports_failures_without_erroring() {
    let sys = FakeSystem::ubuntu();
    let sandbox = Sandbox::new();

    let report = run_diagnose(&sys, &sandbox).await;

    assert_eq!(status(&report, "state"), CheckStatus::Warn);
    assert!(report.check("resources").is_none());
    assert_eq!(status(&report, "permissions"), CheckStatus::Warn);
    assert_eq!(status(&report, "environment"), CheckStatus::Fail);
    assert_eq!(status(&report, "package"), CheckStatus::Fail);
    assert_eq!(status(&report, "launcher"), CheckStatus::Fail);
    assert_eq!(status(&report, "path"), CheckStatus::Fail);
    assert_eq!(report.overall(), CheckStatus::Fail);
    assert!(!sandbox.base().exists());
}

#[tokio::test]
async fn test_removed_resource_is_reported_missing() {
    let sys = FakeSystem::ubuntu();
    let sandbox = Sandbox::new();
    full_install(&sys, &sandbox).await;
    std::fs::remove_file(sandbox.settings.bin_dir.join("seed")).expect("remove shim");

    let report = run_diagnose(&sys, &sandbox).await;

    assert_eq!(status(&report, "resources"), CheckStatus::Fail);
    assert!(report.check("resources").expect("resources").detail.contains("seed"));
    assert_eq!(status(&report, "launcher"), CheckStatus::Fail);
}

#[cfg(unix)]
#[tokio::test]
async fn test_read_only_directory_and_loose_config_fail_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let sys = FakeSystem::ubuntu();
    let sandbox = Sandbox::new();
    full_install(&sys, &sandbox).await;
    let layout = &sandbox.settings.layout;
    let logs = layout.logs_dir();
    std::fs::set_permissions(&logs, std::fs::Permissions::from_mode(0o555)).expect("chmod logs");
    std::fs::set_permissions(layout.config_file(), std::fs::Permissions::from_mode(0o644))
        .expect("chmod config");

    let report = run_diagnose(&sys, &sandbox).await;

    let check = report.check("permissions").expect("permissions");
    assert_eq!(check.status, CheckStatus::Fail);
    assert!(check.detail.contains(&format!("{} is not writable", logs.display())), "{}", check.detail);
    assert!(check.detail.contains("0644"), "{}", check.detail);
    assert_eq!(report.overall(), CheckStatus::Fail);

    std::fs::set_permissions(&logs, std::fs::Permissions::from_mode(0o755)).expect("restore");
}

#[tokio::test]
async fn test_unreachable_network_and_missing_tool() {
    let sys = FakeSystem::ubuntu().unreachable().without_executable("git");
    let sandbox = Sandbox::new();

    let report = run_diagnose(&sys, &sandbox).await;

    assert_eq!(status(&report, "network"), CheckStatus::Warn);
    let tools = report.check("tools").expect("tools");
    assert_eq!(tools.status, CheckStatus::Fail);
    assert!(tools.detail.contains("git"));
}

#[tokio::test]
async fn test_unsupported_platform_is_a_failed_check() {
    let sys = FakeSystem::ubuntu().with_os_release("ID=arch\n");
    let sandbox = Sandbox::new();

    let report = run_diagnose(&sys, &sandbox).await;

    assert_eq!(status(&report, "platform"), CheckStatus::Fail);
    assert!(report.profile.is_none());
}

#[tokio::test]
async fn test_write_report_only_into_existing_logs_dir() {
    let sys = FakeSystem::ubuntu();
    let sandbox = Sandbox::new();
    let report = run_diagnose(&sys, &sandbox).await;

    let skipped = write_report(&StdFs, &sandbox.settings.layout, &report).expect("write");
    let ReportFile::NotWritten { reason } = skipped else {
        panic!("nothing to write into: {skipped:?}");
    };
    assert!(reason.contains("logs"), "{reason}");
    assert!(!sandbox.base().exists());

    std::fs::create_dir_all(sandbox.settings.layout.logs_dir()).expect("logs dir");
    let written = write_report(&StdFs, &sandbox.settings.layout, &report).expect("write");
    let ReportFile::Written { path } = written else {
        panic!("logs dir exists: {written:?}");
    };
    assert_eq!(path.parent(), Some(sandbox.settings.layout.logs_dir().as_path()));
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("parse");
    assert!(json["checks"].as_array().is_some_and(|c| !c.is_empty()));
}
