//! Application service: the production stage driver.
//!
//! Binds each stage of the plan to the service that implements it.

use anyhow::Result;

use crate::application::ports::{CommandRunner, HostInspector, LocalFs, ResourceRecorder};
use crate::application::services::sequencer::StageDriver;
use crate::application::services::{dependencies, environment, launcher, layout, package};
use crate::domain::config::InstallerSettings;
use crate::domain::plan::StageName;
use crate::domain::profile::SystemProfile;

/// Drives the real install stages against injected ports.
pub struct InstallDriver<'a, R, H, F> {
    runner: &'a R,
    host: &'a H,
    fs: &'a F,
    profile: &'a SystemProfile,
    settings: &'a InstallerSettings,
}

impl<'a, R, H, F> InstallDriver<'a, R, H, F>
where
    R: CommandRunner,
    H: HostInspector,
    F: LocalFs,
{
    #[must_use]
    pub fn new(
        runner: &'a R,
        host: &'a H,
        fs: &'a F,
        profile: &'a SystemProfile,
        settings: &'a InstallerSettings,
    ) -> Self {
        Self {
            runner,
            host,
            fs,
            profile,
            settings,
        }
    }

    /// What executing `stage` would change, for `--dry-run`.
    pub fn planned_changes(&self, stage: StageName) -> Vec<String> {
        let s = self.settings;
        match stage {
            StageName::BaseLayout => layout::planned_changes(self.fs, &s.layout, &s.bin_dir),
            StageName::SystemDependencies => dependencies::planned_changes(self.host, self.profile),
            StageName::Environment => vec![
                format!("run `python3 -m venv --clear {}`", s.layout.venv_dir().display()),
                "upgrade pip inside the environment".to_string(),
            ],
            StageName::Package => package::planned_changes(&s.layout, &s.source),
            StageName::Launcher => launcher::planned_changes(
                self.fs,
                self.profile,
                &s.layout,
                &s.bin_dir,
                &s.user_home,
            ),
        }
    }
}

impl<R, H, F> StageDriver for InstallDriver<'_, R, H, F>
where
    R: CommandRunner,
    H: HostInspector,
    F: LocalFs,
{
    async fn is_satisfied(&self, stage: StageName) -> Result<bool> {
        let s = self.settings;
        Ok(match stage {
            StageName::BaseLayout => layout::is_satisfied(self.fs, &s.layout, &s.bin_dir),
            StageName::SystemDependencies => dependencies::is_satisfied(self.host),
            StageName::Environment => environment::is_satisfied(self.runner, self.fs, &s.layout).await,
            StageName::Package => package::is_satisfied(self.runner, self.fs, &s.layout).await,
            StageName::Launcher => launcher::is_satisfied(
                self.fs,
                self.profile,
                &s.layout,
                &s.bin_dir,
                &s.user_home,
            ),
        })
    }

    async fn execute(&self, stage: StageName, recorder: &mut impl ResourceRecorder) -> Result<()> {
        let s = self.settings;
        match stage {
            StageName::BaseLayout => {
                layout::ensure_layout(self.fs, &s.layout, &s.bin_dir, recorder).await?;
            }
            StageName::SystemDependencies => {
                dependencies::install_all(self.runner, self.host, self.profile, recorder).await?;
            }
            StageName::Environment => {
                environment::provision(self.runner, self.fs, &s.layout, recorder).await?;
            }
            StageName::Package => {
                package::install(self.runner, self.fs, &s.layout, &s.source, recorder).await?;
            }
            StageName::Launcher => {
                launcher::deploy(
                    self.fs,
                    self.profile,
                    &s.layout,
                    &s.bin_dir,
                    &s.user_home,
                    recorder,
                )
                .await?;
            }
        }
        Ok(())
    }
}
