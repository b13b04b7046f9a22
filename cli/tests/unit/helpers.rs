//! Shared test helpers: a scripted host system and a sandboxed home directory.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use seed_installer::application::ports::{
    CommandRunner, HostInspector, NetworkProbe, ProgressReporter,
};
use seed_installer::domain::config::InstallerSettings;
use seed_installer::domain::packages::SYSTEM_DEPENDENCIES;
use seed_installer::domain::plan::{Stage, StageName};
use seed_installer::domain::profile::PackageManager;
use seed_installer::infra::state::StateManager;

// ── Cross-platform ExitStatus construction ───────────────────────────────────

/// Build an `ExitStatus` from a logical exit code (0 = success, non-zero = failure).
///
/// On Unix the raw wait-status encodes the exit code in bits 8–15, so we shift.
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(code << 8)
}

// ── Output constructors ──────────────────────────────────────────────────────

pub fn ok_output(stdout: &str) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.as_bytes().to_vec(),
        stderr: Vec::new(),
    }
}

pub fn err_output(code: i32, stderr: &str) -> Output {
    Output {
        status: exit_status(code),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

// ── Scripted host ────────────────────────────────────────────────────────────

struct Failure {
    pattern: String,
    code: i32,
    stderr: String,
    remaining: Option<usize>,
}

/// A fake host that answers the commands the installer runs and applies
/// their side effects to the real (temporary) filesystem.
///
/// Package-manager installs put the dependency's executable "on PATH";
/// `python3 -m venv` creates the interpreter; `pip install` creates the
/// entry point.
pub struct FakeSystem {
    pub kernel: String,
    pub os_release: Option<String>,
    pub uid: u32,
    pub interactive: bool,
    pub disk_kb: u64,
    pub reachable: bool,
    pub python_version: String,
    executables: Mutex<BTreeSet<String>>,
    failures: Mutex<Vec<Failure>>,
    calls: Mutex<Vec<String>>,
}

impl FakeSystem {
    /// Ubuntu host, unprivileged user, plenty of disk, network up, only the
    /// required tools installed.
    pub fn ubuntu() -> Self {
        Self {
            kernel: "Linux".to_string(),
            os_release: Some("NAME=\"Ubuntu\"\nID=ubuntu\nVERSION_ID=\"22.04\"\n".to_string()),
            uid: 1000,
            interactive: false,
            disk_kb: 10 * 1024 * 1024,
            reachable: true,
            python_version: "Python 3.11.4".to_string(),
            executables: Mutex::new(["git", "curl"].iter().map(ToString::to_string).collect()),
            failures: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fedora host.
    pub fn fedora() -> Self {
        Self {
            os_release: Some("NAME=\"Fedora Linux\"\nID=fedora\n".to_string()),
            ..Self::ubuntu()
        }
    }

    /// macOS host, optionally with Homebrew on PATH.
    pub fn macos(brew: bool) -> Self {
        let sys = Self {
            kernel: "Darwin".to_string(),
            os_release: None,
            ..Self::ubuntu()
        };
        if brew {
            sys.add_executable("brew");
        }
        sys
    }

    pub fn with_disk_mb(mut self, mb: u64) -> Self {
        self.disk_kb = mb * 1024;
        self
    }

    pub fn with_os_release(mut self, content: &str) -> Self {
        self.os_release = Some(content.to_string());
        self
    }

    pub fn unreachable(mut self) -> Self {
        self.reachable = false;
        self
    }

    pub fn as_root(mut self) -> Self {
        self.uid = 0;
        self
    }

    pub fn with_executables(self, names: &[&str]) -> Self {
        for name in names {
            self.add_executable(name);
        }
        self
    }

    pub fn without_executable(self, name: &str) -> Self {
        self.executables.lock().expect("lock").remove(name);
        self
    }

    pub fn add_executable(&self, name: &str) {
        self.executables.lock().expect("lock").insert(name.to_string());
    }

    /// Fail every command whose command line contains `pattern`.
    pub fn fail_when(self, pattern: &str, code: i32, stderr: &str) -> Self {
        self.push_failure(pattern, code, stderr, None);
        self
    }

    /// Fail only the first command whose command line contains `pattern`.
    pub fn fail_once_when(self, pattern: &str, code: i32, stderr: &str) -> Self {
        self.push_failure(pattern, code, stderr, Some(1));
        self
    }

    fn push_failure(&self, pattern: &str, code: i32, stderr: &str, remaining: Option<usize>) {
        self.failures.lock().expect("lock").push(Failure {
            pattern: pattern.to_string(),
            code,
            stderr: stderr.to_string(),
            remaining,
        });
    }

    /// Every command line run so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("lock").clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().expect("lock").clear();
    }

    /// Command lines that invoked a package manager (directly or via sudo).
    pub fn package_manager_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| {
                let c = c.strip_prefix("sudo ").unwrap_or(c);
                c.starts_with("apt-get ") || c.starts_with("dnf ") || c.starts_with("brew ")
            })
            .collect()
    }

    fn injected_failure(&self, line: &str) -> Option<Output> {
        let mut failures = self.failures.lock().expect("lock");
        let failure = failures
            .iter_mut()
            .find(|f| line.contains(&f.pattern) && f.remaining != Some(0))?;
        if let Some(n) = failure.remaining.as_mut() {
            *n -= 1;
        }
        Some(err_output(failure.code, &failure.stderr))
    }

    fn install_packages(&self, manager: PackageManager, packages: &[&str]) {
        for dep in SYSTEM_DEPENDENCIES {
            if dep.packages(manager).iter().any(|p| packages.contains(p)) {
                self.add_executable(dep.executable);
            }
        }
    }

    fn respond(&self, program: &str, args: &[&str]) -> Result<Output> {
        let (program, args) = match (program, args.split_first()) {
            ("sudo", Some((inner, rest))) => (*inner, rest),
            _ => (program, args),
        };

        let manager = match program {
            "apt-get" => Some(PackageManager::Apt),
            "dnf" => Some(PackageManager::Dnf),
            "brew" => Some(PackageManager::Brew),
            _ => None,
        };
        if let Some(manager) = manager {
            if args.first() == Some(&"install") {
                let packages: Vec<&str> =
                    args[1..].iter().copied().filter(|a| !a.starts_with('-')).collect();
                self.install_packages(manager, &packages);
            }
            return Ok(ok_output(""));
        }

        match program {
            "uname" => Ok(ok_output(&format!("{}\n", self.kernel))),
            "id" => Ok(ok_output(&format!("{}\n", self.uid))),
            "df" => Ok(ok_output(&format!(
                "Filesystem 1024-blocks Used Available Capacity Mounted on\n\
                 /dev/sda1 104857600 1024 {} 1% /\n",
                self.disk_kb
            ))),
            "python3" => {
                anyhow::ensure!(
                    self.executables.lock().expect("lock").contains("python3"),
                    "No such file or directory (os error 2)"
                );
                let venv = PathBuf::from(args.last().copied().unwrap_or_default());
                let bin = venv.join("bin");
                std::fs::create_dir_all(&bin)?;
                std::fs::write(bin.join("python"), "#!/bin/sh\n")?;
                std::fs::write(bin.join("activate"), "# activate\n")?;
                Ok(ok_output(""))
            }
            p if p.ends_with("/bin/python") => {
                anyhow::ensure!(Path::new(p).exists(), "No such file or directory (os error 2)");
                match args {
                    ["--version"] => Ok(ok_output(&format!("{}\n", self.python_version))),
                    ["-m", "pip", "install", "--upgrade", "pip"] => Ok(ok_output("")),
                    ["-m", "pip", "install", _] => {
                        let bin = Path::new(p).parent().expect("bin dir");
                        std::fs::write(bin.join("seed"), "#!/bin/sh\necho seed 0.1.0\n")?;
                        Ok(ok_output("Successfully installed seed-ai-framework-0.1.0\n"))
                    }
                    _ => anyhow::bail!("unexpected python invocation: {args:?}"),
                }
            }
            p if p.ends_with("/bin/seed") => {
                anyhow::ensure!(Path::new(p).exists(), "No such file or directory (os error 2)");
                Ok(ok_output("seed 0.1.0\n"))
            }
            other => anyhow::bail!("unexpected command in test: {other} {}", args.join(" ")),
        }
    }
}

impl CommandRunner for FakeSystem {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        let line = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        self.calls.lock().expect("lock").push(line.clone());
        if let Some(output) = self.injected_failure(&line) {
            return Ok(output);
        }
        self.respond(program, args)
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        _timeout: Duration,
    ) -> Result<Output> {
        self.run(program, args).await
    }
}

impl HostInspector for FakeSystem {
    fn os_release(&self) -> Option<String> {
        self.os_release.clone()
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        self.executables
            .lock()
            .expect("lock")
            .contains(program)
            .then(|| PathBuf::from("/usr/bin").join(program))
    }

    fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn search_path(&self) -> Vec<PathBuf> {
        vec![PathBuf::from("/usr/bin"), PathBuf::from("/bin")]
    }
}

impl NetworkProbe for FakeSystem {
    async fn check_tcp_connectivity(&self, _: &str, _: u16, _: Duration) -> Result<bool> {
        Ok(self.reachable)
    }
}

// ── Reporters and gates ──────────────────────────────────────────────────────

pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn step(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn warn(&self, _: &str) {}
}

/// Accepts every confirmation and remembers which stages asked.
#[derive(Default)]
pub struct RecordingGate {
    pub decline: Option<StageName>,
    pub asked: Mutex<Vec<StageName>>,
}

impl RecordingGate {
    pub fn declining(stage: StageName) -> Self {
        Self {
            decline: Some(stage),
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn asked(&self) -> Vec<StageName> {
        self.asked.lock().expect("lock").clone()
    }
}

impl seed_installer::application::ports::ConfirmationGate for RecordingGate {
    fn confirm(&self, stage: &Stage) -> Result<bool> {
        self.asked.lock().expect("lock").push(stage.name);
        Ok(self.decline != Some(stage.name))
    }
}

// ── Sandbox ──────────────────────────────────────────────────────────────────

/// A temporary home directory with a `.bashrc`, default settings rooted at
/// `<home>/.seed`, and a state store inside it.
pub struct Sandbox {
    pub dir: tempfile::TempDir,
    pub home: PathBuf,
    pub settings: InstallerSettings,
    pub store: StateManager,
}

pub const BASHRC: &str = "# user bashrc\nalias ll='ls -l'\n";

impl Sandbox {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let home = dir.path().join("home");
        std::fs::create_dir_all(&home).expect("create home");
        std::fs::write(home.join(".bashrc"), BASHRC).expect("write bashrc");
        let settings =
            InstallerSettings::resolve(Some(home.clone()), None, None, None).expect("settings");
        let store = StateManager::with_path(settings.layout.state_file());
        Self {
            dir,
            home,
            settings,
            store,
        }
    }

    pub fn base(&self) -> &Path {
        self.settings.layout.root()
    }

    pub fn bashrc(&self) -> String {
        std::fs::read_to_string(self.home.join(".bashrc")).expect("read bashrc")
    }

    /// Every path under the home directory with file contents (directories
    /// map to `None`).
    pub fn snapshot(&self) -> BTreeMap<PathBuf, Option<String>> {
        let mut out = BTreeMap::new();
        walk(&self.home, &mut out);
        out
    }
}

fn walk(dir: &Path, out: &mut BTreeMap<PathBuf, Option<String>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            out.insert(path.clone(), None);
            walk(&path, out);
        } else {
            out.insert(path.clone(), std::fs::read_to_string(&path).ok());
        }
    }
}
