use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message attached to a run the platform reported as `FAILED`.
pub const RUN_FAILED_MESSAGE: &str = "Actor run failed";
/// Message attached to a run that has not reached a terminal status.
pub const RUN_IN_PROGRESS_MESSAGE: &str = "Actor is still running";

/// Status of an actor run as reported by the platform.
///
/// This is an open enumeration: unknown values are carried verbatim in
/// [`RunStatus::Other`] and serialized back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RunStatus {
    Ready,
    Running,
    Succeeded,
    Failed,
    TimingOut,
    TimedOut,
    Aborting,
    Aborted,
    Other(String),
}

impl RunStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Ready => "READY",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::TimingOut => "TIMING-OUT",
            Self::TimedOut => "TIMED-OUT",
            Self::Aborting => "ABORTING",
            Self::Aborted => "ABORTED",
            Self::Other(raw) => raw,
        }
    }

    /// `SUCCEEDED` or `FAILED`: no further transitions are observed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Statuses a caller keeps polling on.
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            Self::Ready | Self::Running | Self::TimingOut | Self::Aborting
        )
    }
}

impl From<String> for RunStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "READY" => Self::Ready,
            "RUNNING" => Self::Running,
            "SUCCEEDED" => Self::Succeeded,
            "FAILED" => Self::Failed,
            "TIMING-OUT" => Self::TimingOut,
            "TIMED-OUT" => Self::TimedOut,
            "ABORTING" => Self::Aborting,
            "ABORTED" => Self::Aborted,
            _ => Self::Other(raw),
        }
    }
}

impl From<&str> for RunStatus {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<RunStatus> for String {
    fn from(status: RunStatus) -> Self {
        match status {
            RunStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The platform's view of a run at the moment it was fetched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunSnapshot {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub act_id: Option<String>,
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_dataset_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunSnapshot {
    /// Wall-clock run time, once the platform has stamped both ends.
    pub fn duration(&self) -> Option<chrono::Duration> {
        Some(self.finished_at? - self.started_at?)
    }
}

/// One observation of a run, as handed to callers.
///
/// At most one of `output`, `error` or `message` is set. `SUCCEEDED` always
/// carries `output`. A freshly submitted run carries `error` when `FAILED`
/// and `message` otherwise; a status check reports any other status bare.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    pub run_id: String,
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Run {
    pub fn succeeded(run_id: impl Into<String>, output: Vec<Value>) -> Self {
        Self {
            run_id: run_id.into(),
            status: RunStatus::Succeeded,
            output: Some(output),
            error: None,
            message: None,
        }
    }

    pub fn failed(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            status: RunStatus::Failed,
            output: None,
            error: Some(RUN_FAILED_MESSAGE.to_string()),
            message: None,
        }
    }

    pub fn in_progress(run_id: impl Into<String>, status: RunStatus) -> Self {
        Self {
            run_id: run_id.into(),
            status,
            output: None,
            error: None,
            message: Some(RUN_IN_PROGRESS_MESSAGE.to_string()),
        }
    }

    /// Status only, as a status check reports anything but `SUCCEEDED`.
    pub fn observed(run_id: impl Into<String>, status: RunStatus) -> Self {
        Self {
            run_id: run_id.into(),
            status,
            output: None,
            error: None,
            message: None,
        }
    }
}
