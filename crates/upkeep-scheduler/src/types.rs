use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Counters for one materialization pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub items: usize,
    pub events_created: usize,
    pub reminders_created: usize,
    /// Items whose plan could not be persisted.
    pub failures: usize,
}

/// Outcome of a pass as stored in `job_runs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every item processed.
    Ok,
    /// Some items failed, the rest were processed.
    Partial,
    /// The pass could not start (e.g. loading items failed).
    Failed,
}

impl RunStatus {
    pub fn for_summary(summary: &RunSummary) -> Self {
        if summary.failures == 0 {
            RunStatus::Ok
        } else {
            RunStatus::Partial
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunStatus::Ok => "ok",
            RunStatus::Partial => "partial",
            RunStatus::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "ok" => Ok(RunStatus::Ok),
            "partial" => Ok(RunStatus::Partial),
            "failed" => Ok(RunStatus::Failed),
            other => Err(format!("unknown run status: {other}")),
        }
    }
}

/// A persisted pass record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRun {
    /// UUID v7 string, primary key.
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: RunStatus,
    #[serde(flatten)]
    pub summary: RunSummary,
    /// Set when the whole pass failed.
    pub error: Option<String>,
}
