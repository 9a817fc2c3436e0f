use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::engine::dlq::DeadLetterQueue;
use crate::engine::executor::{ExecutionResult, JobExecutor, Outcome};
use crate::engine::job::{Job, JobStatus};
use crate::engine::pool::{Worker, WorkerPool, WorkerStatus};
use crate::engine::queue::{Admission, AdmissionQueue};
use crate::engine::stats::EngineStats;
use crate::engine::store::JobStore;
use crate::error::{EngineError, Result};

/// Accepted submission.
#[derive(Debug, Clone, Serialize)]
pub struct QueuedJob {
    pub job_id: Uuid,
    /// 1-based position in the admission queue at enqueue time.
    pub position: usize,
}

/// Per-item accounting for a burst submission.
#[derive(Debug, Clone, Serialize)]
pub struct BurstOutcome {
    pub queued: usize,
    pub rejected: usize,
    pub job_ids: Vec<Uuid>,
    pub queue_depth: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartOutcome {
    pub already_running: bool,
    pub worker_count: usize,
    pub workers: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueueSnapshot {
    pub queue_depth: usize,
    pub max_queue_size: usize,
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub in_dlq: usize,
    pub stats: EngineStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct PoolSnapshot {
    pub running: bool,
    pub workers: Vec<Worker>,
    pub queue_depth: usize,
    pub dlq_depth: usize,
    pub stats: EngineStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub stats: EngineStats,
    pub queue_depth: usize,
    pub dlq_depth: usize,
    pub total_jobs: usize,
    pub workers_running: bool,
    pub worker_count: usize,
}

/// All mutable engine state behind one lock. Every transition is a single
/// critical section, so a job cannot be claimed by two workers or counted
/// twice.
struct EngineState {
    store: JobStore,
    queue: AdmissionQueue,
    dlq: DeadLetterQueue,
    pool: WorkerPool,
    stats: EngineStats,
    running: bool,
}

struct SchedulerHandle {
    token: CancellationToken,
    task: tokio::task::JoinHandle<()>,
}

struct EngineInner {
    config: EngineConfig,
    executor: JobExecutor,
    state: RwLock<EngineState>,
    scheduler: Mutex<Option<SchedulerHandle>>,
}

/// The job engine service: bounded admission, worker-pool scheduling,
/// bounded retries and dead-letter escalation, all in process memory.
///
/// Cheap to clone; all clones share the same state.
#[derive(Clone)]
pub struct JobEngine {
    inner: Arc<EngineInner>,
}

impl JobEngine {
    pub fn new(config: EngineConfig) -> Self {
        let state = EngineState {
            store: JobStore::new(),
            queue: AdmissionQueue::new(config.max_queue_size),
            dlq: DeadLetterQueue::new(),
            pool: WorkerPool::new(config.worker_count),
            stats: EngineStats::default(),
            running: false,
        };
        let executor = JobExecutor::new(config.failure_rate, config.max_retries);
        Self {
            inner: Arc::new(EngineInner {
                config,
                executor,
                state: RwLock::new(state),
                scheduler: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    // ------------------------------------------------------------------
    // Submission
    // ------------------------------------------------------------------

    /// Submit a job. Rejected without blocking when the queue is full;
    /// rejections create no job record.
    pub async fn submit(
        &self,
        name: impl Into<String>,
        duration_ms: u64,
        force_fail: bool,
    ) -> Result<QueuedJob> {
        let mut state = self.inner.state.write().await;
        let job = Job::new(name.into(), duration_ms, force_fail);

        match state.queue.try_push(job.id) {
            Admission::Rejected => {
                state.stats.queue_rejections += 1;
                tracing::debug!(name = %job.name, "Submission rejected, queue full");
                Err(EngineError::QueueFull(state.queue.len()))
            }
            Admission::Accepted { position } => {
                let job_id = job.id;
                tracing::info!(job_id = %job_id, name = %job.name, position, "Job queued");
                state.store.insert(job);
                state.stats.jobs_submitted += 1;
                Ok(QueuedJob { job_id, position })
            }
        }
    }

    /// Submit `count` jobs in one call. Each item is judged independently
    /// against the queue's state at its own admission instant; accepted
    /// items are never rolled back when later items are rejected.
    pub async fn submit_burst(&self, count: usize) -> BurstOutcome {
        let mut state = self.inner.state.write().await;
        let mut outcome = BurstOutcome {
            queued: 0,
            rejected: 0,
            job_ids: Vec::new(),
            queue_depth: 0,
        };

        let mut rng = rand::thread_rng();
        for i in 0..count {
            let duration_ms = rng.gen_range(500..=2000);
            let job = Job::new(format!("burst-job-{i}"), duration_ms, false);
            match state.queue.try_push(job.id) {
                Admission::Rejected => {
                    state.stats.queue_rejections += 1;
                    outcome.rejected += 1;
                }
                Admission::Accepted { .. } => {
                    outcome.job_ids.push(job.id);
                    state.store.insert(job);
                    state.stats.jobs_submitted += 1;
                    outcome.queued += 1;
                }
            }
        }

        outcome.queue_depth = state.queue.len();
        tracing::info!(
            queued = outcome.queued,
            rejected = outcome.rejected,
            "Burst submission finished"
        );
        outcome
    }

    pub async fn get_job(&self, id: Uuid) -> Result<Job> {
        let state = self.inner.state.read().await;
        state
            .store
            .get(&id)
            .cloned()
            .ok_or(EngineError::JobNotFound(id))
    }

    /// All known jobs, in submission order, regardless of status.
    pub async fn list_jobs(&self) -> Vec<Job> {
        let state = self.inner.state.read().await;
        state.store.all_jobs().into_iter().cloned().collect()
    }

    // ------------------------------------------------------------------
    // Worker pool lifecycle
    // ------------------------------------------------------------------

    /// Start the worker pool and scheduler loop. Idempotent: a second call
    /// while running reports `already_running` and changes nothing.
    pub async fn start(&self) -> StartOutcome {
        let mut scheduler = self.inner.scheduler.lock().await;
        let worker_count = self.inner.config.worker_count;
        let workers: Vec<String> = {
            let state = self.inner.state.read().await;
            state.pool.all().iter().map(|w| w.label()).collect()
        };

        if scheduler.is_some() {
            return StartOutcome {
                already_running: true,
                worker_count,
                workers,
            };
        }

        {
            let mut state = self.inner.state.write().await;
            state.running = true;
            state.pool.start_all();
        }

        let token = CancellationToken::new();
        let task = tokio::spawn(self.clone().run_scheduler(token.clone()));
        *scheduler = Some(SchedulerHandle { token, task });

        tracing::info!(worker_count, "Worker pool started");
        StartOutcome {
            already_running: false,
            worker_count,
            workers,
        }
    }

    /// Stop the scheduler loop and mark every worker stopped. In-flight
    /// executions are not cancelled: their job transitions are still
    /// honored, but the worker slots stay stopped. Returns false if the
    /// pool was not running.
    pub async fn stop(&self) -> bool {
        let mut scheduler = self.inner.scheduler.lock().await;
        let Some(handle) = scheduler.take() else {
            return false;
        };

        handle.token.cancel();
        if let Err(e) = handle.task.await {
            tracing::error!(error = %e, "Scheduler task panicked");
        }

        let mut state = self.inner.state.write().await;
        state.running = false;
        state.pool.stop_all();

        tracing::info!("Worker pool stopped");
        true
    }

    pub async fn is_running(&self) -> bool {
        self.inner.state.read().await.running
    }

    // ------------------------------------------------------------------
    // Scheduler loop
    // ------------------------------------------------------------------

    async fn run_scheduler(self, token: CancellationToken) {
        let mut tick = tokio::time::interval(self.inner.config.tick_interval);
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!("Scheduler loop cancelled");
                    break;
                }
                _ = tick.tick() => {
                    self.dispatch().await;
                }
            }
        }
    }

    /// One scheduler tick: pair idle workers with queued jobs, in worker id
    /// order, then launch each pair's executor as a detached task.
    async fn dispatch(&self) {
        let mut assignments = Vec::new();
        {
            let mut state = self.inner.state.write().await;
            if !state.running {
                return;
            }

            for worker_id in state.pool.idle_worker_ids() {
                let Some(job_id) = state.queue.pop() else {
                    break;
                };

                // Defensive: a queued id could point at a record that was
                // reset or mutated since it was enqueued.
                let Some(job) = state.store.get_mut(&job_id) else {
                    tracing::warn!(job_id = %job_id, "Queued job has no record, dropping");
                    continue;
                };
                if job.status != JobStatus::Pending {
                    tracing::warn!(
                        job_id = %job_id,
                        status = %job.status,
                        "Queued job no longer pending, skipping"
                    );
                    continue;
                }

                job.status = JobStatus::Processing;
                job.started_at = Some(Utc::now());
                job.assigned_worker = Some(worker_id);
                let work = (worker_id, job_id, job.duration_ms, job.force_fail, job.retry_count);

                if let Some(worker) = state.pool.get_mut(worker_id) {
                    worker.status = WorkerStatus::Processing;
                    worker.current_job = Some(job_id);
                }

                tracing::info!(job_id = %job_id, worker_id, "Job assigned");
                assignments.push(work);
            }
        }

        for (worker_id, job_id, duration_ms, force_fail, retry_count) in assignments {
            let engine = self.clone();
            tokio::spawn(async move {
                let result = engine
                    .inner
                    .executor
                    .execute(job_id, worker_id, duration_ms, force_fail, retry_count)
                    .await;
                engine.apply_result(result).await;
            });
        }
    }

    /// Feed one execution result back into the store, queue, or DLQ.
    async fn apply_result(&self, result: ExecutionResult) {
        enum Applied {
            Completed,
            Retried,
            Escalated,
            Missing,
        }

        let mut state = self.inner.state.write().await;
        let max_retries = self.inner.config.max_retries;

        let applied = match state.store.get_mut(&result.job_id) {
            None => Applied::Missing,
            Some(job) => match result.outcome {
                Outcome::Success => {
                    job.status = JobStatus::Completed;
                    job.completed_at = Some(Utc::now());
                    job.result = Some(format!("processed by worker-{}", result.worker_id));
                    Applied::Completed
                }
                Outcome::Failure => {
                    job.retry_count += 1;
                    if job.retry_count >= max_retries {
                        job.status = JobStatus::Dead;
                        job.error =
                            Some(format!("processing failed after {} attempts", job.retry_count));
                        job.assigned_worker = None;
                        Applied::Escalated
                    } else {
                        job.status = JobStatus::Pending;
                        job.started_at = None;
                        job.assigned_worker = None;
                        Applied::Retried
                    }
                }
            },
        };

        match applied {
            Applied::Completed => {
                state.stats.jobs_completed += 1;
                state.stats.total_processing_ms += result.duration_ms;
                if let Some(worker) = state.pool.get_mut(result.worker_id) {
                    if worker.current_job == Some(result.job_id) {
                        worker.jobs_processed += 1;
                    }
                }
                tracing::info!(job_id = %result.job_id, worker_id = result.worker_id, "Job completed");
            }
            Applied::Retried => {
                state.stats.jobs_failed += 1;
                // Already-admitted work bypasses the capacity check.
                state.queue.readmit(result.job_id);
                tracing::info!(job_id = %result.job_id, "Job requeued for retry");
            }
            Applied::Escalated => {
                state.stats.jobs_failed += 1;
                state.dlq.push(result.job_id);
                state.stats.jobs_in_dlq += 1;
                tracing::warn!(job_id = %result.job_id, "Job moved to dead letter queue");
            }
            Applied::Missing => {
                tracing::warn!(job_id = %result.job_id, "Execution result for unknown job");
            }
        }

        // Release the worker slot only while it is still bound to this
        // execution. A stop/restart may have rebound the slot to a newer
        // job; a stale completion must leave that binding alone. If the
        // pool was stopped and not restarted, the slot stays stopped.
        if let Some(worker) = state.pool.get_mut(result.worker_id) {
            if worker.current_job == Some(result.job_id) {
                worker.current_job = None;
                if worker.status == WorkerStatus::Processing {
                    worker.status = WorkerStatus::Idle;
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Dead letter queue
    // ------------------------------------------------------------------

    /// Jobs currently in the DLQ, in escalation order.
    pub async fn dlq_jobs(&self) -> Vec<Job> {
        let state = self.inner.state.read().await;
        state
            .dlq
            .ids()
            .filter_map(|id| state.store.get(id))
            .cloned()
            .collect()
    }

    /// Manually retry a dead job: reset its retry budget, clear the failure
    /// flags, and re-admit it to the queue tail (bypassing capacity).
    pub async fn dlq_retry(&self, id: Uuid) -> Result<()> {
        let mut state = self.inner.state.write().await;

        {
            let job = state
                .store
                .get_mut(&id)
                .ok_or(EngineError::JobNotFound(id))?;
            if job.status != JobStatus::Dead {
                return Err(EngineError::NotInDlq(id));
            }
            job.status = JobStatus::Pending;
            job.retry_count = 0;
            job.force_fail = false;
            job.error = None;
            job.started_at = None;
            job.completed_at = None;
            job.assigned_worker = None;
        }

        if state.dlq.remove(&id) {
            state.stats.jobs_in_dlq = state.stats.jobs_in_dlq.saturating_sub(1);
        }
        state.queue.readmit(id);

        tracing::info!(job_id = %id, "Dead job re-admitted to queue");
        Ok(())
    }

    /// Drop all DLQ entries. Job records keep their `Dead` status; they are
    /// just no longer reachable via the listing. Returns the removed count.
    pub async fn dlq_clear(&self) -> usize {
        let mut state = self.inner.state.write().await;
        let removed = state.dlq.clear();
        state.stats.jobs_in_dlq = 0;
        tracing::info!(removed, "Dead letter queue cleared");
        removed
    }

    // ------------------------------------------------------------------
    // Introspection & reset
    // ------------------------------------------------------------------

    pub async fn queue_status(&self) -> QueueSnapshot {
        let state = self.inner.state.read().await;
        QueueSnapshot {
            queue_depth: state.queue.len(),
            max_queue_size: state.queue.capacity(),
            pending: state.store.count_with_status(JobStatus::Pending),
            processing: state.store.count_with_status(JobStatus::Processing),
            completed: state.store.count_with_status(JobStatus::Completed),
            in_dlq: state.dlq.len(),
            stats: state.stats.clone(),
        }
    }

    pub async fn worker_status(&self) -> PoolSnapshot {
        let state = self.inner.state.read().await;
        PoolSnapshot {
            running: state.running,
            workers: state.pool.all().to_vec(),
            queue_depth: state.queue.len(),
            dlq_depth: state.dlq.len(),
            stats: state.stats.clone(),
        }
    }

    pub async fn stats(&self) -> StatsSnapshot {
        let state = self.inner.state.read().await;
        StatsSnapshot {
            stats: state.stats.clone(),
            queue_depth: state.queue.len(),
            dlq_depth: state.dlq.len(),
            total_jobs: state.store.len(),
            workers_running: state.running,
            worker_count: state.pool.len(),
        }
    }

    /// Stop the pool and wipe all jobs, queues, and counters.
    pub async fn reset(&self) {
        self.stop().await;

        let mut state = self.inner.state.write().await;
        state.store.clear();
        state.queue.clear();
        state.dlq.clear();
        state.pool.reset();
        state.stats.reset();

        tracing::info!("Engine state reset");
    }
}
