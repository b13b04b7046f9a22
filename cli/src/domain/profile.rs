//! Host platform profile and the pure resolution from probed facts.
//!
//! This module is intentionally free of I/O, async, and external layer imports.
//! The prober service gathers the raw facts; everything here is a function of
//! those facts so the closed platform set can be tested exhaustively.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::error::InstallError;

/// Operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
    Linux,
    Macos,
}

/// Package manager family exposed by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    Apt,
    Dnf,
    Brew,
    None,
}

impl PackageManager {
    /// The executable that drives this package manager.
    #[must_use]
    pub fn program(self) -> Option<&'static str> {
        match self {
            Self::Apt => Some("apt-get"),
            Self::Dnf => Some("dnf"),
            Self::Brew => Some("brew"),
            Self::None => None,
        }
    }

    /// Whether installs need root privileges.
    #[must_use]
    pub fn needs_root(self) -> bool {
        matches!(self, Self::Apt | Self::Dnf)
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Apt => "apt",
            Self::Dnf => "dnf",
            Self::Brew => "brew",
            Self::None => "none",
        };
        f.write_str(name)
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linux => f.write_str("linux"),
            Self::Macos => f.write_str("macos"),
        }
    }
}

/// Immutable result of platform detection.
///
/// Produced once per run; later components dispatch on it instead of
/// re-probing the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemProfile {
    pub os_family: OsFamily,
    pub distro_id: Option<String>,
    pub package_manager: PackageManager,
    pub interactive: bool,
    pub is_root: bool,
}

/// Raw facts gathered from the host by the prober.
#[derive(Debug, Clone, Default)]
pub struct HostFacts {
    /// Output of `uname -s`.
    pub kernel: String,
    /// Contents of `/etc/os-release`, if readable.
    pub os_release: Option<String>,
    /// Whether `brew` is resolvable on the search path.
    pub brew_available: bool,
    /// Whether stdin is attached to a terminal.
    pub interactive: bool,
    /// Whether the effective user is root.
    pub is_root: bool,
}

/// Linux distribution IDs mapped to the apt family.
pub const APT_DISTROS: &[&str] = &["debian", "ubuntu", "linuxmint", "pop", "raspbian"];

/// Linux distribution IDs mapped to the dnf family.
pub const DNF_DISTROS: &[&str] = &["fedora", "rhel", "centos", "rocky", "almalinux"];

/// Resolve a [`SystemProfile`] from probed host facts.
///
/// # Errors
///
/// Returns [`InstallError::PlatformUnsupported`] for any kernel other than
/// Linux or Darwin, and for Linux distributions outside the closed set.
pub fn resolve_profile(facts: &HostFacts) -> Result<SystemProfile, InstallError> {
    let kernel = facts.kernel.trim();
    match kernel {
        "Linux" => {
            let distro = facts.os_release.as_deref().and_then(os_release_id);
            let package_manager = distro
                .as_deref()
                .and_then(linux_package_manager)
                .ok_or_else(|| InstallError::PlatformUnsupported {
                    kernel: kernel.to_string(),
                    distro: distro.clone(),
                })?;
            Ok(SystemProfile {
                os_family: OsFamily::Linux,
                distro_id: distro,
                package_manager,
                interactive: facts.interactive,
                is_root: facts.is_root,
            })
        }
        "Darwin" => Ok(SystemProfile {
            os_family: OsFamily::Macos,
            distro_id: None,
            package_manager: if facts.brew_available {
                PackageManager::Brew
            } else {
                PackageManager::None
            },
            interactive: facts.interactive,
            is_root: facts.is_root,
        }),
        other => Err(InstallError::PlatformUnsupported {
            kernel: other.to_string(),
            distro: None,
        }),
    }
}

/// Package manager family for a Linux distribution ID, if supported.
#[must_use]
pub fn linux_package_manager(distro_id: &str) -> Option<PackageManager> {
    if APT_DISTROS.contains(&distro_id) {
        Some(PackageManager::Apt)
    } else if DNF_DISTROS.contains(&distro_id) {
        Some(PackageManager::Dnf)
    } else {
        None
    }
}

/// Extract the `ID=` value from `os-release` content.
///
/// Quotes are stripped and the value is lowercased.
#[must_use]
pub fn os_release_id(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let value = line.trim().strip_prefix("ID=")?;
        let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
        (!value.is_empty()).then(|| value.to_ascii_lowercase())
    })
}
