//! Application service: isolated Python runtime environment.

use std::time::Duration;

use anyhow::Result;
use semver::Version;

use crate::application::ports::{CommandRunner, LocalFs, ResourceRecorder};
use crate::domain::error::{CommandFailure, InstallError};
use crate::domain::layout::BaseLayout;
use crate::domain::plan::StageName;
use crate::domain::resource::{Resource, ResourceKind};

/// Oldest interpreter the framework supports.
pub const MIN_PYTHON: Version = Version::new(3, 9, 0);

/// Upper bound for venv creation and the pip self-upgrade.
pub const ENVIRONMENT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Parse `Python 3.11.4` (or a bare `3.11`) into a version.
///
/// Pre-release suffixes such as `3.13.0rc1` are dropped.
#[must_use]
pub fn parse_python_version(text: &str) -> Option<Version> {
    let raw = text
        .split_whitespace()
        .find(|w| w.chars().next().is_some_and(|c| c.is_ascii_digit()))?;
    let mut parts = raw.split('.').map(|p| {
        p.chars()
            .take_while(char::is_ascii_digit)
            .collect::<String>()
            .parse::<u64>()
            .ok()
    });
    let major = parts.next().flatten()?;
    let minor = parts.next().flatten()?;
    let patch = parts.next().flatten().unwrap_or(0);
    Some(Version::new(major, minor, patch))
}

/// Interpreter version inside the environment, if one exists and runs.
pub async fn environment_version(
    runner: &impl CommandRunner,
    fs: &impl LocalFs,
    layout: &BaseLayout,
) -> Option<Version> {
    let python = layout.venv_python();
    if !fs.exists(&python) {
        return None;
    }
    let output = runner
        .run(&python.to_string_lossy(), &["--version"])
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    // Python 2 printed its version on stderr.
    let text = format!(
        "{} {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    parse_python_version(&text)
}

/// Whether a usable environment already exists.
pub async fn is_satisfied(
    runner: &impl CommandRunner,
    fs: &impl LocalFs,
    layout: &BaseLayout,
) -> bool {
    environment_version(runner, fs, layout)
        .await
        .is_some_and(|v| v >= MIN_PYTHON)
}

/// Create (or recreate) the environment and upgrade its pip.
///
/// # Errors
///
/// Returns [`InstallError::EnvironmentProvisionFailed`] if venv creation or
/// the pip upgrade fails, or the resulting interpreter is too old.
pub async fn provision(
    runner: &impl CommandRunner,
    fs: &impl LocalFs,
    layout: &BaseLayout,
    recorder: &mut impl ResourceRecorder,
) -> Result<Resource> {
    let venv = layout.venv_dir();
    let resource = Resource::new(ResourceKind::Venv, &venv, StageName::Environment);
    if is_satisfied(runner, fs, layout).await {
        tracing::debug!(venv = %venv.display(), "environment already usable");
        return Ok(resource);
    }

    recorder.record(resource.clone()).await?;

    let venv_str = venv.to_string_lossy();
    run_step(runner, "python3", &["-m", "venv", "--clear", &venv_str], "creating the environment").await?;

    let python = layout.venv_python().to_string_lossy().into_owned();
    run_step(
        runner,
        &python,
        &["-m", "pip", "install", "--upgrade", "pip"],
        "upgrading pip",
    )
    .await?;

    match environment_version(runner, fs, layout).await {
        Some(version) if version >= MIN_PYTHON => {
            tracing::info!(venv = %venv.display(), %version, "environment ready");
            Ok(resource)
        }
        Some(version) => Err(InstallError::EnvironmentProvisionFailed {
            detail: format!("interpreter {version} is older than {MIN_PYTHON}"),
        }
        .into()),
        None => Err(InstallError::EnvironmentProvisionFailed {
            detail: format!("{} does not run", layout.venv_python().display()),
        }
        .into()),
    }
}

async fn run_step(runner: &impl CommandRunner, program: &str, args: &[&str], what: &str) -> Result<()> {
    let output = runner
        .run_with_timeout(program, args, ENVIRONMENT_TIMEOUT)
        .await
        .map_err(|e| {
            e.context(InstallError::EnvironmentProvisionFailed {
                detail: format!("{what}: {program} could not be run"),
            })
        })?;
    if output.status.success() {
        return Ok(());
    }
    let failure = CommandFailure::new(program, args, output.status.code(), &output.stderr);
    let detail = format!("{what} failed (exit status {})", output.status.code().unwrap_or(-1));
    Err(anyhow::Error::new(failure).context(InstallError::EnvironmentProvisionFailed { detail }))
}
