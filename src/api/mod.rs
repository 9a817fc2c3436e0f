use std::net::SocketAddr;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use crate::engine::{Job, JobEngine, QueuedJob};
use crate::error::{EngineError, Result};

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct SubmitJobRequest {
    #[serde(default = "default_name")]
    name: String,
    /// Simulated work time in seconds.
    #[serde(default = "default_duration")]
    duration: f64,
    #[serde(default)]
    force_fail: bool,
}

fn default_name() -> String {
    "task".to_string()
}

fn default_duration() -> f64 {
    1.0
}

#[derive(Deserialize)]
struct BurstRequest {
    #[serde(default = "default_burst_count")]
    count: usize,
}

fn default_burst_count() -> usize {
    15
}

#[derive(Serialize)]
struct SubmitAccepted {
    status: &'static str,
    job_id: Uuid,
    name: String,
    queue_position: usize,
}

#[derive(Serialize)]
struct SubmitRejected {
    status: &'static str,
    reason: &'static str,
    queue_depth: usize,
    max_queue_size: usize,
}

#[derive(Serialize)]
struct JobDetail {
    #[serde(flatten)]
    job: Job,
    wait_time_ms: Option<i64>,
    processing_time_ms: Option<i64>,
}

#[derive(Serialize)]
struct JobListResponse {
    count: usize,
    jobs: Vec<Job>,
}

#[derive(Serialize)]
struct WorkersStartResponse {
    status: &'static str,
    worker_count: usize,
    workers: Vec<String>,
}

#[derive(Serialize)]
struct StatusOnly {
    status: &'static str,
}

#[derive(Serialize)]
struct DlqListResponse {
    count: usize,
    jobs: Vec<Job>,
}

#[derive(Serialize)]
struct DlqRetryResponse {
    status: &'static str,
    job_id: Uuid,
}

#[derive(Serialize)]
struct DlqClearResponse {
    status: &'static str,
    jobs_removed: usize,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// ---------------------------------------------------------------------------
// Router & server
// ---------------------------------------------------------------------------

pub fn router(engine: JobEngine) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/jobs", post(submit_job).get(list_jobs))
        .route("/jobs/burst", post(submit_burst))
        .route("/jobs/:job_id", get(get_job))
        .route("/workers/start", post(start_workers))
        .route("/workers/stop", post(stop_workers))
        .route("/workers/status", get(workers_status))
        .route("/queue/status", get(queue_status))
        .route("/dlq", get(list_dlq))
        .route("/dlq/submit-failing", post(submit_failing))
        .route("/dlq/:job_id/retry", post(retry_dlq_job))
        .route("/dlq/clear", post(clear_dlq))
        .route("/stats", get(stats))
        .route("/reset", post(reset))
        .layer(cors)
        .with_state(engine)
}

pub async fn run_server(addr: SocketAddr, engine: JobEngine, shutdown: CancellationToken) {
    let app = router(engine);

    tracing::info!(addr = %addr, "Starting HTTP server");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %addr, error = %e, "Failed to bind HTTP server");
            return;
        }
    };

    let serve = axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await });

    if let Err(e) = serve.await {
        tracing::error!(error = %e, "HTTP server failed");
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn submission_response(engine: &JobEngine, result: Result<QueuedJob>, name: String) -> Response {
    match result {
        Ok(queued) => (
            StatusCode::OK,
            Json(SubmitAccepted {
                status: "queued",
                job_id: queued.job_id,
                name,
                queue_position: queued.position,
            }),
        )
            .into_response(),
        Err(EngineError::QueueFull(queue_depth)) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(SubmitRejected {
                status: "rejected",
                reason: "queue_full",
                queue_depth,
                max_queue_size: engine.config().max_queue_size,
            }),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

async fn submit_job(
    State(engine): State<JobEngine>,
    Json(payload): Json<SubmitJobRequest>,
) -> Response {
    let duration_ms = (payload.duration * 1000.0).max(0.0) as u64;
    let result = engine
        .submit(payload.name.clone(), duration_ms, payload.force_fail)
        .await;
    submission_response(&engine, result, payload.name)
}

async fn submit_burst(
    State(engine): State<JobEngine>,
    Json(payload): Json<BurstRequest>,
) -> impl IntoResponse {
    let outcome = engine.submit_burst(payload.count).await;
    Json(outcome)
}

async fn list_jobs(State(engine): State<JobEngine>) -> impl IntoResponse {
    let jobs = engine.list_jobs().await;
    Json(JobListResponse {
        count: jobs.len(),
        jobs,
    })
}

async fn get_job(State(engine): State<JobEngine>, Path(job_id): Path<Uuid>) -> Response {
    match engine.get_job(job_id).await {
        Ok(job) => {
            let wait_time_ms = job.wait_time_ms();
            let processing_time_ms = job.processing_time_ms();
            Json(JobDetail {
                job,
                wait_time_ms,
                processing_time_ms,
            })
            .into_response()
        }
        Err(e) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

async fn start_workers(State(engine): State<JobEngine>) -> impl IntoResponse {
    let outcome = engine.start().await;
    Json(WorkersStartResponse {
        status: if outcome.already_running {
            "already_running"
        } else {
            "started"
        },
        worker_count: outcome.worker_count,
        workers: outcome.workers,
    })
}

async fn stop_workers(State(engine): State<JobEngine>) -> impl IntoResponse {
    let was_running = engine.stop().await;
    Json(StatusOnly {
        status: if was_running { "stopped" } else { "not_running" },
    })
}

async fn workers_status(State(engine): State<JobEngine>) -> impl IntoResponse {
    Json(engine.worker_status().await)
}

async fn queue_status(State(engine): State<JobEngine>) -> impl IntoResponse {
    Json(engine.queue_status().await)
}

async fn list_dlq(State(engine): State<JobEngine>) -> impl IntoResponse {
    let jobs = engine.dlq_jobs().await;
    Json(DlqListResponse {
        count: jobs.len(),
        jobs,
    })
}

/// Submit a job that fails every attempt, for exercising the DLQ path.
async fn submit_failing(State(engine): State<JobEngine>) -> Response {
    let name = "failing-job".to_string();
    let result = engine.submit(name.clone(), 500, true).await;
    submission_response(&engine, result, name)
}

async fn retry_dlq_job(State(engine): State<JobEngine>, Path(job_id): Path<Uuid>) -> Response {
    match engine.dlq_retry(job_id).await {
        Ok(()) => Json(DlqRetryResponse {
            status: "requeued",
            job_id,
        })
        .into_response(),
        Err(e @ EngineError::JobNotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
        Err(e) => (
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

async fn clear_dlq(State(engine): State<JobEngine>) -> impl IntoResponse {
    let jobs_removed = engine.dlq_clear().await;
    Json(DlqClearResponse {
        status: "cleared",
        jobs_removed,
    })
}

async fn stats(State(engine): State<JobEngine>) -> impl IntoResponse {
    Json(engine.stats().await)
}

async fn reset(State(engine): State<JobEngine>) -> impl IntoResponse {
    engine.reset().await;
    Json(StatusOnly { status: "reset" })
}
