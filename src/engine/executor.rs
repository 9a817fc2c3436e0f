use std::time::Duration;

use rand::Rng;
use uuid::Uuid;

/// Outcome of one execution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

/// Result of running a job once on a worker.
#[derive(Debug)]
pub struct ExecutionResult {
    pub job_id: Uuid,
    pub worker_id: usize,
    pub outcome: Outcome,
    pub duration_ms: u64,
}

/// Runs one job's simulated work and applies failure injection.
///
/// Failure is deterministic when the job carries `force_fail`; otherwise it
/// is injected with probability `failure_rate`, but only while the job still
/// has retries left. A job on its final allowed attempt is judged on
/// `force_fail` alone, so chance can never push it into the DLQ.
#[derive(Debug, Clone)]
pub struct JobExecutor {
    failure_rate: f64,
    max_retries: u32,
}

impl JobExecutor {
    pub fn new(failure_rate: f64, max_retries: u32) -> Self {
        Self {
            failure_rate,
            max_retries,
        }
    }

    /// Simulate the job's work and decide whether this attempt failed.
    pub async fn execute(
        &self,
        job_id: Uuid,
        worker_id: usize,
        duration_ms: u64,
        force_fail: bool,
        retry_count: u32,
    ) -> ExecutionResult {
        tracing::debug!(job_id = %job_id, worker_id, duration_ms, "Executing job");

        tokio::time::sleep(Duration::from_millis(duration_ms)).await;

        let outcome = self.decide(force_fail, retry_count);

        tracing::info!(
            job_id = %job_id,
            worker_id,
            outcome = ?outcome,
            retry_count,
            "Job attempt finished"
        );

        ExecutionResult {
            job_id,
            worker_id,
            outcome,
            duration_ms,
        }
    }

    /// Failure decision, separated from the sleep so it can be unit tested.
    pub fn decide(&self, force_fail: bool, retry_count: u32) -> Outcome {
        if force_fail {
            return Outcome::Failure;
        }
        if retry_count < self.max_retries && rand::thread_rng().gen::<f64>() < self.failure_rate {
            return Outcome::Failure;
        }
        Outcome::Success
    }
}
