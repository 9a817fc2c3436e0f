use serde::Serialize;

/// Aggregate counters, updated on every state transition.
///
/// Derived bookkeeping only — in principle recomputable from the job set,
/// never authoritative for lifecycle decisions.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EngineStats {
    /// Accepted submissions; rejected ones are not counted here.
    pub jobs_submitted: u64,
    pub jobs_completed: u64,
    /// Failed attempts, counting both retried and terminal failures.
    pub jobs_failed: u64,
    /// Jobs currently reachable through the DLQ listing.
    pub jobs_in_dlq: u64,
    pub queue_rejections: u64,
    /// Cumulative planned work time of completed jobs.
    pub total_processing_ms: u64,
}

impl EngineStats {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
