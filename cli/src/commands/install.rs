//! `seed-install install [--yes] [--dry-run]`: install the SEED framework.

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::install::{self, InstallOptions};
use crate::commands::report_failure;
use crate::domain::plan::Stage;
use crate::output::{TerminalReporter, json};

/// Arguments for the install command.
#[derive(Args, Debug, Default)]
pub struct InstallArgs {
    /// Accept every confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Show what would change without changing anything
    #[arg(long)]
    pub dry_run: bool,
}

/// Run `seed-install install`.
///
/// # Errors
///
/// Returns the classified failure after printing it.
pub async fn run(app: &AppContext, args: &InstallArgs) -> Result<()> {
    let reporter = TerminalReporter::new(&app.output);
    let confirm = |stage: &Stage| -> Result<bool> {
        app.confirm(
            &format!("{} ({})?", stage.description, stage.name),
            true,
        )
    };

    let result = install::install(
        &app.runner,
        &app.host,
        &app.network,
        &app.fs,
        &app.store,
        InstallOptions {
            settings: &app.settings,
            reporter: &reporter,
            confirm: &confirm,
            unattended: app.non_interactive,
            dry_run: args.dry_run,
        },
        interrupted(),
    )
    .await;

    match result {
        Ok(outcome) => {
            if app.is_json() {
                println!("{}", json::format_install(&outcome)?);
            } else {
                app.renderer()
                    .render_install(&outcome, &app.settings.layout.state_file());
            }
            Ok(())
        }
        Err(err) => report_failure(app, err),
    }
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
