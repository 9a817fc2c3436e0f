pub mod dlq;
pub mod executor;
pub mod job;
pub mod pool;
pub mod queue;
pub mod service;
pub mod stats;
pub mod store;

pub use dlq::DeadLetterQueue;
pub use executor::{ExecutionResult, JobExecutor, Outcome};
pub use job::{Job, JobStatus};
pub use pool::{Worker, WorkerPool, WorkerStatus};
pub use queue::{Admission, AdmissionQueue};
pub use service::{
    BurstOutcome, JobEngine, PoolSnapshot, QueueSnapshot, QueuedJob, StartOutcome, StatsSnapshot,
};
pub use stats::EngineStats;
pub use store::JobStore;
