use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Queue is at capacity ({0} jobs)")]
    QueueFull(usize),

    #[error("Job not found: {0}")]
    JobNotFound(Uuid),

    #[error("Job {0} is not in the dead letter queue")]
    NotInDlq(Uuid),
}

pub type Result<T> = std::result::Result<T, EngineError>;
