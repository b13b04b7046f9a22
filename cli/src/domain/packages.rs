//! System dependency table and package-manager command construction.
//!
//! Pure functions only: no I/O, no async, no process spawning.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::domain::profile::PackageManager;

/// A logical system dependency and its per-manager package names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemDependency {
    /// Logical name, e.g. `python3`.
    pub name: &'static str,
    /// Executable whose presence on the search path means "installed".
    pub executable: &'static str,
    apt: &'static [&'static str],
    dnf: &'static [&'static str],
    brew: &'static [&'static str],
}

impl SystemDependency {
    /// Package names to hand to the given manager.
    #[must_use]
    pub fn packages(&self, manager: PackageManager) -> &'static [&'static str] {
        match manager {
            PackageManager::Apt => self.apt,
            PackageManager::Dnf => self.dnf,
            PackageManager::Brew => self.brew,
            PackageManager::None => &[],
        }
    }
}

/// Dependencies installed by the `system-dependencies` stage, in order.
pub const SYSTEM_DEPENDENCIES: &[SystemDependency] = &[
    SystemDependency {
        name: "python3",
        executable: "python3",
        apt: &["python3", "python3-venv", "python3-pip"],
        dnf: &["python3", "python3-pip"],
        brew: &["python@3.11"],
    },
    SystemDependency {
        name: "openssl",
        executable: "openssl",
        apt: &["openssl"],
        dnf: &["openssl"],
        brew: &["openssl"],
    },
    SystemDependency {
        name: "sqlite",
        executable: "sqlite3",
        apt: &["sqlite3"],
        dnf: &["sqlite"],
        brew: &["sqlite"],
    },
];

/// Look up a logical dependency by name.
#[must_use]
pub fn lookup(name: &str) -> Option<&'static SystemDependency> {
    SYSTEM_DEPENDENCIES.iter().find(|d| d.name == name)
}

/// A fully-resolved external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    /// Wrap `program args...` with `sudo` unless already root.
    fn privileged(program: &str, args: &[&str], needs_root: bool, is_root: bool) -> Self {
        let mut all: Vec<String> = Vec::with_capacity(args.len() + 1);
        if needs_root && !is_root {
            all.push(program.to_string());
            all.extend(args.iter().map(ToString::to_string));
            return Self {
                program: "sudo".to_string(),
                args: all,
            };
        }
        all.extend(args.iter().map(ToString::to_string));
        Self {
            program: program.to_string(),
            args: all,
        }
    }

    #[must_use]
    pub fn arg_refs(&self) -> Vec<&str> {
        self.args.iter().map(String::as_str).collect()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Command that installs `packages` with `manager`.
///
/// Returns `None` when the platform has no package manager.
#[must_use]
pub fn install_command(
    manager: PackageManager,
    packages: &[&str],
    is_root: bool,
) -> Option<Invocation> {
    let program = manager.program()?;
    let mut args: Vec<&str> = match manager {
        PackageManager::Apt | PackageManager::Dnf => vec!["install", "-y"],
        PackageManager::Brew | PackageManager::None => vec!["install"],
    };
    args.extend_from_slice(packages);
    Some(Invocation::privileged(
        program,
        &args,
        manager.needs_root(),
        is_root,
    ))
}

/// Command that refreshes the package index of `manager`.
#[must_use]
pub fn refresh_command(manager: PackageManager, is_root: bool) -> Option<Invocation> {
    let program = manager.program()?;
    let args: &[&str] = match manager {
        PackageManager::Apt => &["update"],
        PackageManager::Dnf => &["makecache"],
        PackageManager::Brew | PackageManager::None => &["update"],
    };
    Some(Invocation::privileged(
        program,
        args,
        manager.needs_root(),
        is_root,
    ))
}

static APT_STALE_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"(?i)unable to locate package|failed to fetch|404\s+not found|hash sum mismatch")
        .expect("valid regex")
});

static DNF_STALE_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"(?i)failed to download metadata|cannot download repomd\.xml|no match for argument")
        .expect("valid regex")
});

static BREW_STALE_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"(?i)no available formula").expect("valid regex")
});

/// Whether a failed install's output indicates a stale package index.
#[must_use]
pub fn is_stale_index(manager: PackageManager, output: &str) -> bool {
    match manager {
        PackageManager::Apt => APT_STALE_RE.is_match(output),
        PackageManager::Dnf => DNF_STALE_RE.is_match(output),
        PackageManager::Brew => BREW_STALE_RE.is_match(output),
        PackageManager::None => false,
    }
}
