//! JSON output helpers.
//!
//! Every `--json` code path prints exactly one pretty-printed object to
//! stdout: a result document on success, an error object on failure.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::application::services::install::InstallOutcome;
use crate::domain::classify::{ClassifiedError, ClassifiedErrorView};
use crate::domain::diagnostics::{DiagnosticReport, ReportFile};
use crate::domain::resource::RollbackOutcome;

/// Format a generic JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Format a classified failure, including hint, stage, detail and any
/// rollback outcome.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_classified(err: &ClassifiedError) -> Result<String> {
    to_pretty(&ClassifiedErrorView::from(err))
}

/// Format the result of `install` (either the applied run or the dry-run plan).
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_install(outcome: &InstallOutcome) -> Result<String> {
    let obj = match outcome {
        InstallOutcome::Installed { profile, outcome } => serde_json::json!({
            "dry_run": false,
            "profile": profile,
            "stages": outcome.stages,
            "resources": outcome.state.resource_ledger,
        }),
        InstallOutcome::DryRun { profile, stages } => serde_json::json!({
            "dry_run": true,
            "profile": profile,
            "stages": stages,
        }),
    };
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Format the result of `rollback`.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_rollback(outcome: Option<&RollbackOutcome>, purged: bool) -> Result<String> {
    let obj = serde_json::json!({
        "rolled_back": outcome.is_some(),
        "outcome": outcome,
        "purged": purged,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Format a diagnostic report with a `report_file` entry saying where the
/// report was written, or why it was not.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_report(report: &DiagnosticReport, report_file: &ReportFile) -> Result<String> {
    #[derive(Serialize)]
    struct View<'a> {
        #[serde(flatten)]
        report: &'a DiagnosticReport,
        report_file: &'a ReportFile,
    }
    to_pretty(&View {
        report,
        report_file,
    })
}

/// Pretty-print any serializable value.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn to_pretty<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("JSON serialization failed")
}
