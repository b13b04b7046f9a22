//! `seed-install rollback [--yes] [--purge-data]`: undo a recorded installation.

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::LocalFs;
use crate::application::services::rollback::{purge_base, rollback_recorded};
use crate::commands::report_failure;
use crate::domain::classify::ClassifiedError;
use crate::domain::error::InstallError;
use crate::output::{TerminalReporter, json};

/// Arguments for the rollback command.
#[derive(Args, Debug, Default)]
pub struct RollbackArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Also delete the whole base path, including user data
    #[arg(long)]
    pub purge_data: bool,
}

/// Run `seed-install rollback`.
///
/// # Errors
///
/// Returns `RollbackPartialFailure` when some recorded resources could not
/// be removed, or `UserCancelled` when the prompt is declined.
pub async fn run(app: &AppContext, args: &RollbackArgs) -> Result<()> {
    let state_file = app.settings.layout.state_file();
    let outcome = if app.fs.exists(&state_file) {
        if !app.output.quiet {
            println!();
            println!("This will remove everything recorded in:");
            println!("  {}", state_file.display());
            println!();
        }
        if !app.confirm("Continue?", false).unwrap_or(false) {
            return report_failure(app, cancelled());
        }
        let reporter = TerminalReporter::new(&app.output);
        rollback_recorded(&app.store, &app.fs, &reporter).await?
    } else {
        None
    };

    if let Some(outcome) = outcome.as_ref().filter(|o| !o.is_complete()) {
        let err = ClassifiedError::from_install_error(InstallError::RollbackPartialFailure {
            unremoved: outcome.unremoved(),
        })
        .with_rollback(outcome.clone());
        return report_failure(app, err);
    }

    let purged = if args.purge_data && confirm_purge(app, args) {
        purge_base(&app.fs, &app.settings.layout)?
    } else {
        false
    };

    if app.is_json() {
        println!("{}", json::format_rollback(outcome.as_ref(), purged)?);
    } else {
        app.renderer().render_rollback(outcome.as_ref(), purged);
    }
    Ok(())
}

/// Purging needs an explicit `--yes` or an interactive "yes"; `CI` or
/// `SEED_YES` alone never deletes user data.
fn confirm_purge(app: &AppContext, args: &RollbackArgs) -> bool {
    if args.yes {
        return true;
    }
    if app.non_interactive {
        app.output
            .warn("Skipping --purge-data: pass --yes to delete the base path non-interactively");
        return false;
    }
    let prompt = format!(
        "Delete {} and all data in it? This cannot be undone",
        app.settings.layout.root().display()
    );
    app.confirm(&prompt, false).unwrap_or(false)
}

fn cancelled() -> ClassifiedError {
    ClassifiedError::from_install_error(InstallError::UserCancelled {
        stage: "rollback".to_string(),
    })
}
