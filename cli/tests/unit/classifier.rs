//! Failure classification: variant precedence, hints and the JSON view.

#![allow(clippy::expect_used)]

use seed_installer::domain::classify::{ClassifiedError, ClassifiedErrorView, classify};
use seed_installer::domain::error::{CommandFailure, InstallError};
use seed_installer::domain::plan::StageName;
use seed_installer::domain::resource::{Resource, ResourceKind, RollbackOutcome};

fn command_failure(stderr: &str) -> CommandFailure {
    CommandFailure::new("apt-get", &["install", "-y", "openssl"], Some(100), stderr.as_bytes())
}

#[test]
fn test_dependency_failure_keeps_variant_and_stderr_detail() {
    let err = anyhow::Error::new(command_failure("E: Unable to locate package openssl\n")).context(
        InstallError::DependencyInstallFailed {
            package: "openssl".to_string(),
            exit_status: Some(100),
            detail: "E: Unable to locate package openssl".to_string(),
        },
    );

    let classified = classify(Some(StageName::SystemDependencies), &err);

    assert!(matches!(
        classified.error,
        InstallError::DependencyInstallFailed { ref package, .. } if package == "openssl"
    ));
    assert_eq!(classified.stage, Some(StageName::SystemDependencies));
    assert_eq!(classified.exit_code(), 1);
    assert!(
        classified
            .detail
            .as_deref()
            .is_some_and(|d| d.contains("Unable to locate package openssl"))
    );
}

#[test]
fn test_permission_denied_hint() {
    let err = anyhow::Error::new(command_failure(
        "E: Could not open lock file - open (13: Permission denied)",
    ));
    let classified = classify(Some(StageName::SystemDependencies), &err);
    assert!(classified.hint.contains("sudo"), "{}", classified.hint);
}

#[test]
fn test_dns_failure_hint() {
    let err = anyhow::anyhow!("Temporary failure in name resolution")
        .context("pip could not reach the index");
    let classified = classify(Some(StageName::Package), &err);
    assert!(matches!(classified.error, InstallError::PackageInstallFailed { .. }));
    assert!(classified.hint.contains("DNS"), "{}", classified.hint);
}

#[test]
fn test_disk_full_hint_beats_stage_default() {
    let err = anyhow::anyhow!("No space left on device (os error 28)");
    let classified = classify(Some(StageName::Environment), &err);
    assert!(matches!(classified.error, InstallError::EnvironmentProvisionFailed { .. }));
    assert!(classified.hint.contains("disk is full"), "{}", classified.hint);
}

#[test]
fn test_cancellation_exit_code_and_stage() {
    let err = anyhow::Error::new(InstallError::UserCancelled {
        stage: "launcher".to_string(),
    });
    let classified = classify(Some(StageName::Launcher), &err);
    assert_eq!(classified.exit_code(), 4);
    assert_eq!(classified.error.code(), "USER_CANCELLED");
}

#[test]
fn test_every_hint_is_non_empty() {
    let errors = [
        InstallError::PlatformUnsupported {
            kernel: "FreeBSD".to_string(),
            distro: None,
        },
        InstallError::RequirementUnmet(Vec::new()),
        InstallError::EnvironmentProvisionFailed {
            detail: String::new(),
        },
        InstallError::LauncherDeployFailed {
            detail: String::new(),
        },
        InstallError::RollbackPartialFailure {
            unremoved: Vec::new(),
        },
        InstallError::Unclassified {
            command: None,
            exit_status: None,
            detail: String::new(),
        },
    ];
    for error in errors {
        let classified = ClassifiedError::from_install_error(error);
        assert!(!classified.hint.trim().is_empty(), "{}", classified.error);
    }
}

#[test]
fn test_view_serializes_stable_code_and_rollback() {
    let classified = classify(
        Some(StageName::Package),
        &anyhow::Error::new(InstallError::UserCancelled {
            stage: "package".to_string(),
        }),
    )
    .with_rollback(RollbackOutcome {
        removed: vec![Resource::new(
            ResourceKind::Venv,
            "/home/u/.seed/venv",
            StageName::Environment,
        )],
        failed: Vec::new(),
        manual_follow_up: vec![Resource::new(
            ResourceKind::SystemPackage,
            "openssl",
            StageName::SystemDependencies,
        )],
    });

    let value = serde_json::to_value(ClassifiedErrorView::from(&classified)).expect("serialize");

    assert_eq!(value["error"], true);
    assert_eq!(value["code"], "USER_CANCELLED");
    assert_eq!(value["stage"], "package");
    assert_eq!(value["rollback"]["removed"][0]["location"], "/home/u/.seed/venv");
    assert_eq!(value["rollback"]["manual_follow_up"][0]["kind"], "system_package");
}
