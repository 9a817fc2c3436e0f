use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    /// Retries exhausted; reachable only through the dead letter queue.
    Dead,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Dead => write!(f, "dead"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub name: String,
    pub status: JobStatus,
    /// Simulated work time for the executor.
    pub duration_ms: u64,
    /// Deterministic failure flag; the job fails every attempt while set.
    pub force_fail: bool,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub result: Option<String>,
    pub error: Option<String>,
    pub retry_count: u32,
    pub assigned_worker: Option<usize>,
}

impl Job {
    pub fn new(name: String, duration_ms: u64, force_fail: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            status: JobStatus::Pending,
            duration_ms,
            force_fail,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            result: None,
            error: None,
            retry_count: 0,
            assigned_worker: None,
        }
    }

    /// Milliseconds the job sat in the queue before a worker picked it up.
    pub fn wait_time_ms(&self) -> Option<i64> {
        self.started_at
            .map(|s| (s - self.created_at).num_milliseconds())
    }

    /// Milliseconds of the final, successful processing attempt.
    pub fn processing_time_ms(&self) -> Option<i64> {
        match (self.started_at, self.completed_at) {
            (Some(s), Some(c)) => Some((c - s).num_milliseconds()),
            _ => None,
        }
    }
}
