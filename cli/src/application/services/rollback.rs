//! Application service: undo recorded resources.
//!
//! Rollback works strictly from the ledger. It never guesses what an install
//! might have created.

use anyhow::{Context, Result};

use crate::application::ports::{InstallStateStore, LocalFs, ProgressReporter};
use crate::domain::layout::BaseLayout;
use crate::domain::resource::{Resource, ResourceKind, RollbackFailure, RollbackOutcome};

/// Undo `resources` in strict reverse order.
///
/// A failure on one resource is recorded and the walk continues. Targets that
/// are already gone count as removed.
pub fn rollback(
    fs: &impl LocalFs,
    resources: &[Resource],
    reporter: &impl ProgressReporter,
) -> RollbackOutcome {
    let mut outcome = RollbackOutcome::default();
    for resource in resources.iter().rev() {
        if resource.kind == ResourceKind::SystemPackage {
            tracing::info!(package = %resource.location.display(), "system package left installed");
            outcome.manual_follow_up.push(resource.clone());
            continue;
        }
        match undo(fs, resource) {
            Ok(()) => {
                tracing::info!(kind = %resource.kind, location = %resource.location.display(), "removed");
                reporter.step(&format!("Removed {resource}"));
                outcome.removed.push(resource.clone());
            }
            Err(e) => {
                let reason = format!("{e:#}");
                tracing::warn!(kind = %resource.kind, location = %resource.location.display(), %reason, "rollback step failed");
                reporter.warn(&format!("Could not remove {resource}: {reason}"));
                outcome.failed.push(RollbackFailure {
                    resource: resource.clone(),
                    reason,
                });
            }
        }
    }
    outcome
}

fn undo(fs: &impl LocalFs, resource: &Resource) -> Result<()> {
    let path = &resource.location;
    if !fs.exists(path) {
        return Ok(());
    }
    match resource.kind {
        ResourceKind::Directory | ResourceKind::Venv => fs.remove_dir_all(path),
        ResourceKind::File => fs.remove_file(path),
        ResourceKind::PathEntry => {
            let line = resource
                .line
                .as_deref()
                .context("ledger entry has no recorded line")?;
            fs.remove_line(path, line)
        }
        ResourceKind::SystemPackage => Ok(()),
    }
}

/// Roll back everything in the persisted ledger.
///
/// Returns `None` when there is no recorded installation. Afterwards the
/// state holds only what could not be removed, or is deleted when empty.
///
/// # Errors
///
/// Returns an error if the state cannot be read or written.
pub async fn rollback_recorded(
    store: &impl InstallStateStore,
    fs: &impl LocalFs,
    reporter: &impl ProgressReporter,
) -> Result<Option<RollbackOutcome>> {
    let Some(mut state) = store.load_async().await? else {
        return Ok(None);
    };
    if state.resource_ledger.is_empty() {
        store.clear_async().await?;
        return Ok(None);
    }

    let outcome = rollback(fs, &state.resource_ledger, reporter);

    state.resource_ledger = outcome.unremoved();
    state.completed_stages.clear();
    if state.resource_ledger.is_empty() {
        store.clear_async().await?;
    } else {
        state.updated_at = Some(chrono::Utc::now());
        store.save_async(&state).await?;
    }
    Ok(Some(outcome))
}

/// Delete the whole base path, including user data.
///
/// # Errors
///
/// Returns an error if the directory exists but cannot be removed.
pub fn purge_base(fs: &impl LocalFs, layout: &BaseLayout) -> Result<bool> {
    if !fs.exists(layout.root()) {
        return Ok(false);
    }
    fs.remove_dir_all(layout.root())?;
    tracing::info!(root = %layout.root().display(), "base path purged");
    Ok(true)
}
