//! Application service: the write-ahead resource ledger.
//!
//! The ledger is the only record of what a run changed. Every append and
//! every completed stage is persisted immediately so a crash mid-run still
//! leaves an accurate ledger behind for `rollback`.

use anyhow::{Context, Result};
use chrono::Utc;

use crate::application::ports::{InstallStateStore, ResourceRecorder};
use crate::domain::plan::StageName;
use crate::domain::resource::{
    InstallationState, Resource, RollbackOutcome, StageOutcome, StageRecord,
};

/// Ledger for one installer run, backed by a state store.
pub struct Ledger<'a, S: InstallStateStore> {
    store: &'a S,
    state: InstallationState,
    /// Index of the first resource recorded by this run.
    run_start: usize,
}

impl<'a, S: InstallStateStore> Ledger<'a, S> {
    /// Open the ledger, carrying over resources from earlier runs.
    ///
    /// Stage records are reset: they describe the most recent run only.
    ///
    /// # Errors
    ///
    /// Returns an error if persisted state exists but cannot be read.
    pub async fn open(store: &'a S) -> Result<Self> {
        let mut state = store
            .load_async()
            .await
            .with_context(|| format!("reading {}", store.location().display()))?
            .unwrap_or_default();
        state.completed_stages.clear();
        let run_start = state.resource_ledger.len();
        Ok(Self {
            store,
            state,
            run_start,
        })
    }

    #[must_use]
    pub fn into_state(self) -> InstallationState {
        self.state
    }

    /// Resources recorded by this run, in recording order.
    #[must_use]
    pub fn this_run(&self) -> &[Resource] {
        &self.state.resource_ledger[self.run_start..]
    }

    /// Record a finished stage and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be written.
    pub async fn complete_stage(&mut self, name: StageName, outcome: StageOutcome) -> Result<()> {
        self.state.completed_stages.push(StageRecord { name, outcome });
        self.persist().await
    }

    /// Reconcile the ledger with a rollback of this run's resources.
    ///
    /// Earlier runs' resources and anything the rollback could not remove
    /// stay recorded; system packages are handed to the user and dropped.
    /// When nothing remains the state file itself is removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be written or cleared.
    pub async fn settle_rollback(&mut self, outcome: &RollbackOutcome) -> Result<()> {
        self.state.resource_ledger.truncate(self.run_start);
        self.state.resource_ledger.extend(outcome.unremoved());
        self.state.completed_stages.clear();
        self.run_start = self.state.resource_ledger.len();

        if self.state.resource_ledger.is_empty() {
            self.store.clear_async().await
        } else {
            self.persist().await
        }
    }

    async fn persist(&mut self) -> Result<()> {
        self.state.updated_at = Some(Utc::now());
        self.store
            .save_async(&self.state)
            .await
            .with_context(|| format!("writing {}", self.store.location().display()))
    }
}

impl<S: InstallStateStore> ResourceRecorder for Ledger<'_, S> {
    async fn record(&mut self, resource: Resource) -> Result<()> {
        if self.state.contains(&resource) {
            return Ok(());
        }
        tracing::debug!(kind = %resource.kind, location = %resource.location.display(), stage = %resource.created_by_stage, "recording resource");
        self.state.resource_ledger.push(resource);
        self.persist().await
    }
}
