use std::net::SocketAddr;
use std::time::Duration;

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Number of worker slots in the pool.
    pub worker_count: usize,
    /// Admission queue capacity; fresh submissions beyond this are rejected.
    pub max_queue_size: usize,
    /// Failed attempts allowed before a job is escalated to the DLQ.
    pub max_retries: u32,
    /// Probability of an injected failure per attempt, while retries remain.
    pub failure_rate: f64,
    /// Scheduler loop tick interval.
    pub tick_interval: Duration,
    /// HTTP listen address.
    pub listen_addr: SocketAddr,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_count: 3,
            max_queue_size: 10,
            max_retries: 3,
            failure_rate: 0.2,
            tick_interval: Duration::from_millis(100),
            listen_addr: "127.0.0.1:8080"
                .parse()
                .expect("default listen address is valid"),
        }
    }
}

impl EngineConfig {
    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    pub fn with_max_queue_size(mut self, max_queue_size: usize) -> Self {
        self.max_queue_size = max_queue_size;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_failure_rate(mut self, failure_rate: f64) -> Self {
        self.failure_rate = failure_rate;
        self
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }
}
