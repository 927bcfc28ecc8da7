//! Run lifecycle coordinator.
//!
//! Turns one `start_run` call plus any number of `fetch_run_status` calls
//! into [`Run`] observations, and decides when a run's dataset is fetched.
//!
//! The coordinator owns no timers and spawns no tasks. A run that is still in
//! flight is reported as such, and the caller decides when to look again via
//! [`RunCoordinator::check_status`] (see [`crate::watch`]).

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{info, warn};

use crate::domain::{Credential, Run, RunSnapshot, RunStatus};
use crate::upstream::{ActorPlatform, UpstreamError};

#[derive(Clone)]
pub struct RunCoordinator {
    platform: Arc<dyn ActorPlatform>,
    wait_for_finish: Duration,
}

impl std::fmt::Debug for RunCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunCoordinator")
            .field("wait_for_finish", &self.wait_for_finish)
            .finish()
    }
}

impl RunCoordinator {
    pub fn new(platform: Arc<dyn ActorPlatform>, wait_for_finish: Duration) -> Self {
        Self {
            platform,
            wait_for_finish,
        }
    }

    pub fn wait_for_finish(&self) -> Duration {
        self.wait_for_finish
    }

    /// Start a run and report what the platform knows when the call returns.
    ///
    /// Fast actors finish inside the platform-side wait and come back with
    /// their output. Anything else comes back with a progress message and
    /// must be followed up with [`Self::check_status`].
    pub async fn submit_and_observe(
        &self,
        credential: &Credential,
        actor_id: &str,
        input: &Value,
    ) -> Result<Run, UpstreamError> {
        let snapshot = self
            .platform
            .start_run(credential, actor_id, input, self.wait_for_finish)
            .await?;

        info!(
            name: "run.submitted",
            actor_id = %actor_id,
            run_id = %snapshot.id,
            status = %snapshot.status,
            "Actor run submitted"
        );

        if snapshot.status == RunStatus::Succeeded {
            return Ok(self.succeeded(credential, snapshot).await);
        }
        Ok(match snapshot.status {
            RunStatus::Failed => {
                warn!(
                    name: "run.failed",
                    run_id = %snapshot.id,
                    status_message = snapshot.status_message.as_deref().unwrap_or(""),
                    "Actor run failed"
                );
                Run::failed(snapshot.id)
            }
            other => Run::in_progress(snapshot.id, other),
        })
    }

    /// Re-fetch a run. `SUCCEEDED` comes back with its output like a fresh
    /// submit; any other status, `FAILED` included, comes back bare.
    ///
    /// Idempotent: an unchanged run on the platform yields an identical
    /// [`Run`].
    pub async fn check_status(
        &self,
        credential: &Credential,
        run_id: &str,
    ) -> Result<Run, UpstreamError> {
        let snapshot = self.platform.fetch_run_status(credential, run_id).await?;
        if snapshot.status == RunStatus::Succeeded {
            return Ok(self.succeeded(credential, snapshot).await);
        }
        Ok(Run::observed(snapshot.id, snapshot.status))
    }

    async fn succeeded(&self, credential: &Credential, snapshot: RunSnapshot) -> Run {
        let output = self.fetch_output(credential, &snapshot).await;
        info!(
            name: "run.succeeded",
            run_id = %snapshot.id,
            items = output.len(),
            duration_ms = snapshot.duration().map(|d| d.num_milliseconds()),
            "Actor run succeeded"
        );
        Run::succeeded(snapshot.id, output)
    }

    /// Output of a succeeded run. Failure to read it degrades to an empty
    /// result: the run itself still succeeded.
    async fn fetch_output(&self, credential: &Credential, snapshot: &RunSnapshot) -> Vec<Value> {
        let Some(dataset_id) = snapshot.default_dataset_id.as_deref() else {
            warn!(
                name: "run.output.missing_dataset",
                run_id = %snapshot.id,
                "Succeeded run has no default dataset"
            );
            return Vec::new();
        };

        match self
            .platform
            .fetch_dataset_items(credential, dataset_id)
            .await
        {
            Ok(items) => items,
            Err(e) => {
                warn!(
                    name: "run.output.fetch_failed",
                    run_id = %snapshot.id,
                    dataset_id = %dataset_id,
                    error = %e,
                    "Error fetching run output"
                );
                Vec::new()
            }
        }
    }
}
