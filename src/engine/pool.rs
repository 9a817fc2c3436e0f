use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerStatus {
    Idle,
    Processing,
    Stopped,
}

impl std::fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerStatus::Idle => write!(f, "idle"),
            WorkerStatus::Processing => write!(f, "processing"),
            WorkerStatus::Stopped => write!(f, "stopped"),
        }
    }
}

/// One execution slot. Processes at most one job at a time.
#[derive(Debug, Clone, Serialize)]
pub struct Worker {
    pub id: usize,
    pub status: WorkerStatus,
    pub current_job: Option<Uuid>,
    pub jobs_processed: u64,
}

impl Worker {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            status: WorkerStatus::Stopped,
            current_job: None,
            jobs_processed: 0,
        }
    }

    pub fn label(&self) -> String {
        format!("worker-{}", self.id)
    }
}

/// Fixed set of worker slots. Workers are never created or destroyed
/// mid-run, only started and stopped together.
#[derive(Debug)]
pub struct WorkerPool {
    workers: Vec<Worker>,
}

impl WorkerPool {
    pub fn new(worker_count: usize) -> Self {
        Self {
            workers: (0..worker_count).map(Worker::new).collect(),
        }
    }

    /// Mark every worker idle and ready for assignment.
    pub fn start_all(&mut self) {
        for worker in &mut self.workers {
            worker.status = WorkerStatus::Idle;
            worker.current_job = None;
        }
    }

    /// Mark every worker stopped, regardless of in-flight work.
    pub fn stop_all(&mut self) {
        for worker in &mut self.workers {
            worker.status = WorkerStatus::Stopped;
        }
    }

    /// Ids of idle workers, in ascending id order. Assignment tie-breaking
    /// among simultaneously-idle workers is deterministic by this ordering.
    pub fn idle_worker_ids(&self) -> Vec<usize> {
        self.workers
            .iter()
            .filter(|w| w.status == WorkerStatus::Idle)
            .map(|w| w.id)
            .collect()
    }

    pub fn get(&self, id: usize) -> Option<&Worker> {
        self.workers.get(id)
    }

    pub fn get_mut(&mut self, id: usize) -> Option<&mut Worker> {
        self.workers.get_mut(id)
    }

    pub fn all(&self) -> &[Worker] {
        &self.workers
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Reset all slots to the initial stopped state with zeroed counters.
    pub fn reset(&mut self) {
        let count = self.workers.len();
        self.workers = (0..count).map(Worker::new).collect();
    }
}
