//! Scripted in-memory platform for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{ActorPlatform, UpstreamError};
use crate::domain::{Actor, ActorPage, ActorSchema, Credential, RunSnapshot, RunStatus};

#[derive(Default)]
pub(crate) struct FakePlatform {
    pub actors: Vec<Actor>,
    /// Account-wide total reported with the listing. Defaults to `actors.len()`.
    pub actor_total: Option<u64>,
    pub schemas: HashMap<String, ActorSchema>,
    /// Status code returned by every call when set.
    pub reject_with: Option<u16>,
    pub start_result: Mutex<Option<Result<RunSnapshot, u16>>>,
    pub statuses: Mutex<VecDeque<Result<RunSnapshot, u16>>>,
    pub datasets: Mutex<HashMap<String, Result<Vec<Value>, u16>>>,
    pub calls: AtomicUsize,
    pub dataset_calls: AtomicUsize,
    pub last_wait: Mutex<Option<Duration>>,
    pub last_input: Mutex<Option<Value>>,
}

pub(crate) fn snapshot(id: &str, status: &str, dataset: Option<&str>) -> RunSnapshot {
    RunSnapshot {
        id: id.to_string(),
        act_id: None,
        status: RunStatus::from(status),
        status_message: None,
        default_dataset_id: dataset.map(str::to_string),
        started_at: None,
        finished_at: None,
    }
}

fn status_error(status: u16) -> UpstreamError {
    UpstreamError::Status {
        status,
        body: format!("{{\"error\":{{\"type\":\"fake-{status}\"}}}}"),
    }
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting(status: u16) -> Self {
        Self {
            reject_with: Some(status),
            ..Self::default()
        }
    }

    pub fn with_start(self, result: Result<RunSnapshot, u16>) -> Self {
        *self.start_result.lock().unwrap() = Some(result);
        self
    }

    pub fn with_status(self, result: Result<RunSnapshot, u16>) -> Self {
        self.statuses.lock().unwrap().push_back(result);
        self
    }

    pub fn with_dataset(self, id: &str, result: Result<Vec<Value>, u16>) -> Self {
        self.datasets.lock().unwrap().insert(id.to_string(), result);
        self
    }

    pub fn total_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self) -> Result<(), UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.reject_with {
            Some(status) => Err(status_error(status)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ActorPlatform for FakePlatform {
    async fn list_actors(&self, _credential: &Credential) -> Result<ActorPage, UpstreamError> {
        self.record()?;
        let count = self.actors.len() as u64;
        Ok(ActorPage {
            total: Some(self.actor_total.unwrap_or(count)),
            count: Some(count),
            items: self.actors.clone(),
            ..ActorPage::default()
        })
    }

    async fn fetch_input_schema(
        &self,
        _credential: &Credential,
        actor_id: &str,
    ) -> Result<ActorSchema, UpstreamError> {
        self.record()?;
        self.schemas
            .get(actor_id)
            .cloned()
            .ok_or_else(|| status_error(404))
    }

    async fn start_run(
        &self,
        _credential: &Credential,
        _actor_id: &str,
        input: &Value,
        wait: Duration,
    ) -> Result<RunSnapshot, UpstreamError> {
        self.record()?;
        *self.last_wait.lock().unwrap() = Some(wait);
        *self.last_input.lock().unwrap() = Some(input.clone());
        match self.start_result.lock().unwrap().clone() {
            Some(result) => result.map_err(status_error),
            None => Err(status_error(500)),
        }
    }

    async fn fetch_run_status(
        &self,
        _credential: &Credential,
        _run_id: &str,
    ) -> Result<RunSnapshot, UpstreamError> {
        self.record()?;
        let mut statuses = self.statuses.lock().unwrap();
        // The last scripted status repeats, like a settled run on the platform.
        let next = if statuses.len() > 1 {
            statuses.pop_front()
        } else {
            statuses.front().cloned()
        };
        next.unwrap_or(Err(404)).map_err(status_error)
    }

    async fn fetch_dataset_items(
        &self,
        _credential: &Credential,
        dataset_id: &str,
    ) -> Result<Vec<Value>, UpstreamError> {
        self.record()?;
        self.dataset_calls.fetch_add(1, Ordering::SeqCst);
        match self.datasets.lock().unwrap().get(dataset_id) {
            Some(result) => result.clone().map_err(status_error),
            None => Err(status_error(404)),
        }
    }
}
