//! Platform prober tests, including closed-set totality over arbitrary
//! host facts.

#![allow(clippy::expect_used)]

use proptest::prelude::*;
use seed_installer::application::services::probe::probe;
use seed_installer::domain::error::InstallError;
use seed_installer::domain::profile::{
    APT_DISTROS, DNF_DISTROS, HostFacts, OsFamily, PackageManager, resolve_profile,
};

use crate::helpers::FakeSystem;

#[tokio::test]
async fn test_probe_ubuntu_unprivileged() {
    let sys = FakeSystem::ubuntu();
    let profile = probe(&sys, &sys).await.expect("probe");
    assert_eq!(profile.os_family, OsFamily::Linux);
    assert_eq!(profile.distro_id.as_deref(), Some("ubuntu"));
    assert_eq!(profile.package_manager, PackageManager::Apt);
    assert!(!profile.is_root);
    assert_eq!(sys.calls(), vec!["uname -s", "id -u"]);
}

#[tokio::test]
async fn test_probe_detects_root() {
    let sys = FakeSystem::fedora().as_root();
    let profile = probe(&sys, &sys).await.expect("probe");
    assert_eq!(profile.package_manager, PackageManager::Dnf);
    assert!(profile.is_root);
}

#[tokio::test]
async fn test_probe_macos_without_brew_resolves_to_none() {
    let sys = FakeSystem::macos(false);
    let profile = probe(&sys, &sys).await.expect("probe");
    assert_eq!(profile.os_family, OsFamily::Macos);
    assert_eq!(profile.package_manager, PackageManager::None);
}

#[tokio::test]
async fn test_probe_unknown_kernel_is_platform_unsupported() {
    let mut sys = FakeSystem::ubuntu();
    sys.kernel = "FreeBSD".to_string();
    let err = probe(&sys, &sys).await.expect_err("unsupported");
    let install = err.downcast_ref::<InstallError>().expect("typed");
    assert_eq!(install.exit_code(), 2);
}

fn kernel_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Linux".to_string()),
        Just("Darwin".to_string()),
        "[A-Za-z]{1,12}",
    ]
}

fn distro_strategy() -> impl Strategy<Value = Option<String>> {
    let known: Vec<String> = APT_DISTROS
        .iter()
        .chain(DNF_DISTROS)
        .map(ToString::to_string)
        .collect();
    prop_oneof![
        Just(None),
        proptest::sample::select(known).prop_map(Some),
        "[a-z]{1,10}".prop_map(Some),
    ]
}

proptest! {
    /// Every input either resolves into the closed set or fails with
    /// `PlatformUnsupported`; nothing else is possible.
    #[test]
    fn prop_resolve_profile_is_total(
        kernel in kernel_strategy(),
        distro in distro_strategy(),
        brew in any::<bool>(),
        interactive in any::<bool>(),
        is_root in any::<bool>(),
    ) {
        let facts = HostFacts {
            kernel: kernel.clone(),
            os_release: distro.as_ref().map(|d| format!("NAME=x\nID={d}\n")),
            brew_available: brew,
            interactive,
            is_root,
        };
        match resolve_profile(&facts) {
            Ok(profile) => {
                prop_assert_eq!(profile.interactive, interactive);
                prop_assert_eq!(profile.is_root, is_root);
                match profile.os_family {
                    OsFamily::Linux => {
                        prop_assert_eq!(kernel.as_str(), "Linux");
                        let id = profile.distro_id.clone().unwrap_or_default();
                        let expected = if APT_DISTROS.contains(&id.as_str()) {
                            PackageManager::Apt
                        } else {
                            PackageManager::Dnf
                        };
                        prop_assert!(
                            APT_DISTROS.contains(&id.as_str()) || DNF_DISTROS.contains(&id.as_str())
                        );
                        prop_assert_eq!(profile.package_manager, expected);
                    }
                    OsFamily::Macos => {
                        prop_assert_eq!(kernel.as_str(), "Darwin");
                        let expected = if brew { PackageManager::Brew } else { PackageManager::None };
                        prop_assert_eq!(profile.package_manager, expected);
                    }
                }
            }
            Err(InstallError::PlatformUnsupported { .. }) => {
                prop_assert!(kernel != "Darwin");
            }
            Err(other) => prop_assert!(false, "unexpected error: {other}"),
        }
    }
}
