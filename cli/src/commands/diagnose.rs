//! `seed-install diagnose`: report on the current installation.

use anyhow::Result;
use chrono::Utc;

use crate::app::AppContext;
use crate::application::services::diagnostics::{diagnose, write_report};
use crate::domain::diagnostics::ReportFile;
use crate::output::{json, progress};

/// Run `seed-install diagnose`.
///
/// Always exits 0; findings are reported, not raised.
///
/// # Errors
///
/// Returns an error only if the report cannot be serialized or written.
pub async fn run(app: &AppContext) -> Result<()> {
    let pb = app
        .output
        .show_progress()
        .then(|| progress::spinner("Running checks..."));

    let report = diagnose(
        &app.runner,
        &app.host,
        &app.network,
        &app.fs,
        &app.store,
        &app.settings,
        Utc::now(),
    )
    .await;

    if let Some(pb) = &pb {
        progress::finish_ok(pb, "Checks complete");
    }

    let report_file = write_report(&app.fs, &app.settings.layout, &report).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not write diagnostic report");
        ReportFile::NotWritten {
            reason: format!("{e:#}"),
        }
    });

    if app.is_json() {
        println!("{}", json::format_report(&report, &report_file)?);
    } else {
        app.renderer().render_report(&report, &report_file);
    }
    Ok(())
}
