use std::collections::HashMap;

use uuid::Uuid;

use crate::engine::job::{Job, JobStatus};

/// Single source of truth for job lifecycle state.
///
/// The admission queue and the dead letter queue hold only job ids; every
/// status transition goes through the record stored here.
#[derive(Debug, Default)]
pub struct JobStore {
    jobs: HashMap<Uuid, Job>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, job: Job) {
        self.jobs.insert(job.id, job);
    }

    pub fn get(&self, id: &Uuid) -> Option<&Job> {
        self.jobs.get(id)
    }

    pub fn get_mut(&mut self, id: &Uuid) -> Option<&mut Job> {
        self.jobs.get_mut(id)
    }

    /// Number of jobs currently in the given status.
    pub fn count_with_status(&self, status: JobStatus) -> usize {
        self.jobs.values().filter(|j| j.status == status).count()
    }

    /// All jobs sorted chronologically by creation time.
    pub fn all_jobs(&self) -> Vec<&Job> {
        let mut jobs: Vec<&Job> = self.jobs.values().collect();
        jobs.sort_by_key(|j| j.created_at);
        jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn clear(&mut self) {
        self.jobs.clear();
    }
}
