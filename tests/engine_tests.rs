use std::time::Duration;

use uuid::Uuid;

use conveyor::config::EngineConfig;
use conveyor::engine::{JobEngine, JobStatus, WorkerStatus};
use conveyor::error::EngineError;

/// Deterministic config for tests: no chance failures, fast ticks.
fn test_config() -> EngineConfig {
    EngineConfig::default()
        .with_failure_rate(0.0)
        .with_tick_interval(Duration::from_millis(10))
}

/// Poll until the job reaches the given status or the timeout expires.
async fn wait_for_status(engine: &JobEngine, id: Uuid, status: JobStatus, timeout_ms: u64) -> bool {
    let deadline = std::time::Instant::now() + Duration::from_millis(timeout_ms);
    while std::time::Instant::now() < deadline {
        if let Ok(job) = engine.get_job(id).await {
            if job.status == status {
                return true;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

// ---------------------------------------------------------------------------
// Admission control
// ---------------------------------------------------------------------------

#[tokio::test]
async fn accepts_submission_below_capacity() {
    let engine = JobEngine::new(test_config());

    let queued = engine.submit("first", 100, false).await.unwrap();
    assert_eq!(queued.position, 1);

    let snap = engine.queue_status().await;
    assert_eq!(snap.queue_depth, 1);
    assert_eq!(snap.pending, 1);
    assert_eq!(snap.stats.jobs_submitted, 1);
    assert_eq!(snap.stats.queue_rejections, 0);
}

#[tokio::test]
async fn rejects_submission_at_capacity() {
    let engine = JobEngine::new(test_config().with_max_queue_size(2));

    engine.submit("a", 100, false).await.unwrap();
    engine.submit("b", 100, false).await.unwrap();

    let err = engine.submit("c", 100, false).await.unwrap_err();
    assert!(matches!(err, EngineError::QueueFull(2)));

    let snap = engine.queue_status().await;
    // Queue length unchanged; rejection counted; no record created
    assert_eq!(snap.queue_depth, 2);
    assert_eq!(snap.stats.queue_rejections, 1);
    assert_eq!(snap.stats.jobs_submitted, 2);

    let stats = engine.stats().await;
    assert_eq!(stats.total_jobs, 2);
}

#[tokio::test]
async fn burst_applies_backpressure_per_item() {
    // Pool stopped: 15 submissions against a queue of 10 → exactly 10/5
    let engine = JobEngine::new(test_config());

    let outcome = engine.submit_burst(15).await;
    assert_eq!(outcome.queued, 10);
    assert_eq!(outcome.rejected, 5);
    assert_eq!(outcome.job_ids.len(), 10);
    assert_eq!(outcome.queue_depth, 10);

    let snap = engine.queue_status().await;
    assert_eq!(snap.stats.jobs_submitted, 10);
    assert_eq!(snap.stats.queue_rejections, 5);
}

#[tokio::test]
async fn burst_does_not_roll_back_accepted_items() {
    let engine = JobEngine::new(test_config().with_max_queue_size(3));

    let outcome = engine.submit_burst(5).await;
    assert_eq!(outcome.queued, 3);
    assert_eq!(outcome.rejected, 2);

    // The accepted three are still queued and pending
    let snap = engine.queue_status().await;
    assert_eq!(snap.queue_depth, 3);
    assert_eq!(snap.pending, 3);
}

// ---------------------------------------------------------------------------
// End-to-end execution
// ---------------------------------------------------------------------------

#[tokio::test]
async fn job_runs_to_completion() {
    let engine = JobEngine::new(test_config());
    engine.start().await;

    let queued = engine.submit("quick", 50, false).await.unwrap();
    assert!(
        wait_for_status(&engine, queued.job_id, JobStatus::Completed, 2000).await,
        "job should complete"
    );

    let job = engine.get_job(queued.job_id).await.unwrap();
    assert!(job.completed_at.is_some());
    assert!(job.result.as_deref().unwrap().contains("worker-"));
    assert_eq!(job.retry_count, 0);
    assert!(job.processing_time_ms().is_some());
    assert!(job.wait_time_ms().is_some());

    let snap = engine.queue_status().await;
    assert_eq!(snap.queue_depth, 0);
    assert_eq!(snap.completed, 1);
    assert_eq!(snap.stats.jobs_completed, 1);
    assert_eq!(snap.stats.total_processing_ms, 50);

    // The worker that ran it is idle again with the job counted
    let pool = engine.worker_status().await;
    assert!(pool.workers.iter().all(|w| w.status == WorkerStatus::Idle));
    assert_eq!(pool.workers.iter().map(|w| w.jobs_processed).sum::<u64>(), 1);

    engine.stop().await;
}

#[tokio::test]
async fn single_worker_preserves_fifo_order() {
    let engine = JobEngine::new(test_config().with_worker_count(1));

    let first = engine.submit("first", 30, false).await.unwrap();
    let second = engine.submit("second", 30, false).await.unwrap();

    engine.start().await;
    assert!(wait_for_status(&engine, second.job_id, JobStatus::Completed, 2000).await);

    let a = engine.get_job(first.job_id).await.unwrap();
    let b = engine.get_job(second.job_id).await.unwrap();
    assert_eq!(a.status, JobStatus::Completed);
    assert!(a.completed_at.unwrap() <= b.completed_at.unwrap());

    engine.stop().await;
}

#[tokio::test]
async fn processing_workers_never_exceed_pool_size() {
    let engine = JobEngine::new(test_config());
    for i in 0..8 {
        engine.submit(format!("load-{i}"), 100, false).await.unwrap();
    }
    engine.start().await;

    // Sample the pool while the backlog drains
    let deadline = std::time::Instant::now() + Duration::from_millis(600);
    while std::time::Instant::now() < deadline {
        let pool = engine.worker_status().await;
        let processing: Vec<_> = pool
            .workers
            .iter()
            .filter(|w| w.status == WorkerStatus::Processing)
            .collect();
        assert!(processing.len() <= 3);
        // Every busy slot is bound to exactly one job
        assert!(processing.iter().all(|w| w.current_job.is_some()));
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    engine.stop().await;
}

// ---------------------------------------------------------------------------
// Retry and escalation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn force_fail_job_escalates_after_three_attempts() {
    let engine = JobEngine::new(test_config());
    engine.start().await;

    let queued = engine.submit("doomed", 10, true).await.unwrap();
    assert!(
        wait_for_status(&engine, queued.job_id, JobStatus::Dead, 3000).await,
        "job should reach the DLQ"
    );

    let job = engine.get_job(queued.job_id).await.unwrap();
    assert_eq!(job.retry_count, 3);
    assert!(job.error.is_some());

    let dlq = engine.dlq_jobs().await;
    assert_eq!(dlq.len(), 1);
    assert_eq!(dlq[0].id, queued.job_id);

    let snap = engine.queue_status().await;
    // Both retried and terminal attempts count as failures
    assert_eq!(snap.stats.jobs_failed, 3);
    assert_eq!(snap.stats.jobs_in_dlq, 1);
    assert_eq!(snap.stats.jobs_completed, 0);

    engine.stop().await;
}

#[tokio::test]
async fn dead_job_retry_resets_and_bypasses_capacity() {
    let config = test_config().with_max_queue_size(1).with_max_retries(1);
    let engine = JobEngine::new(config);

    engine.start().await;
    let doomed = engine.submit("doomed", 10, true).await.unwrap();
    assert!(wait_for_status(&engine, doomed.job_id, JobStatus::Dead, 2000).await);
    engine.stop().await;

    // Fill the queue back to capacity
    engine.submit("filler", 100, false).await.unwrap();
    assert!(matches!(
        engine.submit("overflow", 100, false).await,
        Err(EngineError::QueueFull(_))
    ));

    // Manual retry is still admitted
    engine.dlq_retry(doomed.job_id).await.unwrap();

    let job = engine.get_job(doomed.job_id).await.unwrap();
    assert_eq!(job.status, JobStatus::Pending);
    assert_eq!(job.retry_count, 0);
    assert!(!job.force_fail);
    assert!(job.error.is_none());

    let snap = engine.queue_status().await;
    assert_eq!(snap.queue_depth, 2); // past capacity
    assert_eq!(snap.in_dlq, 0);
    assert_eq!(snap.stats.jobs_in_dlq, 0);
}

#[tokio::test]
async fn dlq_retry_rejects_jobs_not_dead() {
    let engine = JobEngine::new(test_config());
    let queued = engine.submit("alive", 100, false).await.unwrap();

    assert!(matches!(
        engine.dlq_retry(queued.job_id).await,
        Err(EngineError::NotInDlq(_))
    ));
    assert!(matches!(
        engine.dlq_retry(Uuid::new_v4()).await,
        Err(EngineError::JobNotFound(_))
    ));
}

#[tokio::test]
async fn dlq_clear_removes_listing_but_keeps_records_dead() {
    let engine = JobEngine::new(test_config().with_max_retries(1));
    engine.start().await;

    let doomed = engine.submit("doomed", 10, true).await.unwrap();
    assert!(wait_for_status(&engine, doomed.job_id, JobStatus::Dead, 2000).await);

    assert_eq!(engine.dlq_clear().await, 1);
    assert_eq!(engine.dlq_clear().await, 0);

    assert!(engine.dlq_jobs().await.is_empty());
    let job = engine.get_job(doomed.job_id).await.unwrap();
    assert_eq!(job.status, JobStatus::Dead);

    let snap = engine.queue_status().await;
    assert_eq!(snap.stats.jobs_in_dlq, 0);

    engine.stop().await;
}

// ---------------------------------------------------------------------------
// Pool lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn start_is_idempotent_and_stop_is_a_noop_when_stopped() {
    let engine = JobEngine::new(test_config());

    let first = engine.start().await;
    assert!(!first.already_running);
    assert_eq!(first.worker_count, 3);
    assert_eq!(first.workers, vec!["worker-0", "worker-1", "worker-2"]);

    let second = engine.start().await;
    assert!(second.already_running);
    assert_eq!(second.worker_count, 3);

    assert!(engine.is_running().await);

    assert!(engine.stop().await);
    assert!(!engine.stop().await);
    assert!(!engine.is_running().await);

    let pool = engine.worker_status().await;
    assert!(pool
        .workers
        .iter()
        .all(|w| w.status == WorkerStatus::Stopped));
}

#[tokio::test]
async fn stop_abandons_slot_but_honors_inflight_outcome() {
    let engine = JobEngine::new(test_config());
    engine.start().await;

    let queued = engine.submit("slow", 300, false).await.unwrap();
    assert!(wait_for_status(&engine, queued.job_id, JobStatus::Processing, 1000).await);

    engine.stop().await;
    let pool = engine.worker_status().await;
    assert!(pool
        .workers
        .iter()
        .all(|w| w.status == WorkerStatus::Stopped));

    // The detached execution still lands its result
    assert!(
        wait_for_status(&engine, queued.job_id, JobStatus::Completed, 2000).await,
        "in-flight job should still complete after stop"
    );

    // But the worker slot stays stopped
    let pool = engine.worker_status().await;
    assert!(pool
        .workers
        .iter()
        .all(|w| w.status == WorkerStatus::Stopped));
    assert!(pool.workers.iter().all(|w| w.current_job.is_none()));
}

#[tokio::test]
async fn stale_completion_after_restart_keeps_new_binding() {
    let engine = JobEngine::new(test_config().with_worker_count(1));
    engine.start().await;

    let slow = engine.submit("slow", 400, false).await.unwrap();
    assert!(wait_for_status(&engine, slow.job_id, JobStatus::Processing, 1000).await);

    // Restart while the first execution is still in flight; the single
    // slot gets rebound to a new job.
    engine.stop().await;
    engine.start().await;

    let next = engine.submit("next", 600, false).await.unwrap();
    assert!(wait_for_status(&engine, next.job_id, JobStatus::Processing, 1000).await);

    // The first execution finishes while the new job is running
    assert!(wait_for_status(&engine, slow.job_id, JobStatus::Completed, 2000).await);

    let pool = engine.worker_status().await;
    assert_eq!(pool.workers[0].status, WorkerStatus::Processing);
    assert_eq!(pool.workers[0].current_job, Some(next.job_id));

    assert!(wait_for_status(&engine, next.job_id, JobStatus::Completed, 2000).await);

    let pool = engine.worker_status().await;
    assert_eq!(pool.workers[0].status, WorkerStatus::Idle);
    assert!(pool.workers[0].current_job.is_none());
    // Only the completion that still owned the slot is credited
    assert_eq!(pool.workers[0].jobs_processed, 1);

    engine.stop().await;
}

#[tokio::test]
async fn jobs_processed_survives_restart_until_reset() {
    let engine = JobEngine::new(test_config());
    engine.start().await;

    let queued = engine.submit("one", 20, false).await.unwrap();
    assert!(wait_for_status(&engine, queued.job_id, JobStatus::Completed, 2000).await);
    engine.stop().await;

    engine.start().await;
    let pool = engine.worker_status().await;
    assert_eq!(pool.workers.iter().map(|w| w.jobs_processed).sum::<u64>(), 1);

    engine.reset().await;
    let pool = engine.worker_status().await;
    assert_eq!(pool.workers.iter().map(|w| w.jobs_processed).sum::<u64>(), 0);
}

#[tokio::test]
async fn reset_wipes_all_state() {
    let engine = JobEngine::new(test_config());
    engine.start().await;
    engine.submit_burst(12).await;

    engine.reset().await;

    let stats = engine.stats().await;
    assert_eq!(stats.total_jobs, 0);
    assert_eq!(stats.queue_depth, 0);
    assert_eq!(stats.dlq_depth, 0);
    assert!(!stats.workers_running);
    assert_eq!(stats.stats.jobs_submitted, 0);
    assert_eq!(stats.stats.queue_rejections, 0);
    assert_eq!(stats.worker_count, 3);
}
