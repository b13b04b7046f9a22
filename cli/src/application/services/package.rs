//! Application service: framework package installation and verification.

use std::time::Duration;

use anyhow::Result;

use crate::application::ports::{CommandRunner, LocalFs, ResourceRecorder};
use crate::domain::error::{CommandFailure, InstallError};
use crate::domain::layout::{BaseLayout, ENTRY_POINT};
use crate::domain::plan::StageName;
use crate::domain::resource::{Resource, ResourceKind};
use crate::domain::source::SourceSpec;

/// Upper bound for `pip install`; source builds can be slow.
pub const PACKAGE_TIMEOUT: Duration = Duration::from_secs(20 * 60);

/// Output of `<env>/bin/seed --version`, if the entry point runs.
pub async fn installed_version(
    runner: &impl CommandRunner,
    fs: &impl LocalFs,
    layout: &BaseLayout,
) -> Option<String> {
    let entry = layout.venv_entry_point();
    if !fs.exists(&entry) {
        return None;
    }
    let output = runner
        .run(&entry.to_string_lossy(), &["--version"])
        .await
        .ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Whether the verification hook already succeeds.
pub async fn is_satisfied(
    runner: &impl CommandRunner,
    fs: &impl LocalFs,
    layout: &BaseLayout,
) -> bool {
    installed_version(runner, fs, layout).await.is_some()
}

#[must_use]
pub fn planned_changes(layout: &BaseLayout, source: &SourceSpec) -> Vec<String> {
    vec![
        format!(
            "run `{} -m pip install {}`",
            layout.venv_python().display(),
            source.pip_argument()
        ),
        format!("verify `{} --version`", layout.venv_entry_point().display()),
    ]
}

/// Install the framework into the environment and verify the entry point.
///
/// Returns the environment the package was installed into.
///
/// # Errors
///
/// Returns [`InstallError::PackageInstallFailed`] when the environment is
/// missing, pip fails, or the entry point does not run afterwards.
pub async fn install(
    runner: &impl CommandRunner,
    fs: &impl LocalFs,
    layout: &BaseLayout,
    source: &SourceSpec,
    recorder: &mut impl ResourceRecorder,
) -> Result<Resource> {
    let env = Resource::new(ResourceKind::Venv, layout.venv_dir(), StageName::Package);
    if let Some(version) = installed_version(runner, fs, layout).await {
        tracing::debug!(%version, "framework already installed");
        return Ok(env);
    }

    let python = layout.venv_python();
    if !fs.exists(&python) {
        return Err(InstallError::PackageInstallFailed {
            detail: format!("no environment at {}", layout.venv_dir().display()),
        }
        .into());
    }
    recorder.record(env.clone()).await?;

    let python = python.to_string_lossy().into_owned();
    let argument = source.pip_argument();
    let args = ["-m", "pip", "install", argument.as_str()];
    tracing::info!(source = %source, "installing framework package");
    let output = runner
        .run_with_timeout(&python, &args, PACKAGE_TIMEOUT)
        .await
        .map_err(|e| {
            e.context(InstallError::PackageInstallFailed {
                detail: "pip could not be run".to_string(),
            })
        })?;
    if !output.status.success() {
        let failure = CommandFailure::new(&python, &args, output.status.code(), &output.stderr);
        return Err(anyhow::Error::new(failure).context(InstallError::PackageInstallFailed {
            detail: format!("pip could not install {argument}"),
        }));
    }

    match installed_version(runner, fs, layout).await {
        Some(version) => {
            tracing::info!(%version, "framework verified");
            Ok(env)
        }
        None => Err(InstallError::PackageInstallFailed {
            detail: format!("`{ENTRY_POINT} --version` did not succeed after install"),
        }
        .into()),
    }
}
