use std::collections::VecDeque;

use uuid::Uuid;

/// FIFO of permanently-failed job ids.
///
/// Holds references only; the job records themselves stay in the store with
/// status `Dead`. A job leaves the DLQ via manual retry or a bulk clear.
#[derive(Debug, Default)]
pub struct DeadLetterQueue {
    items: VecDeque<Uuid>,
}

impl DeadLetterQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, id: Uuid) {
        self.items.push_back(id);
    }

    /// Remove a specific job id. Returns false if it was not present.
    pub fn remove(&mut self, id: &Uuid) -> bool {
        if let Some(pos) = self.items.iter().position(|item| item == id) {
            self.items.remove(pos);
            true
        } else {
            false
        }
    }

    /// Job ids in the order they were escalated.
    pub fn ids(&self) -> impl Iterator<Item = &Uuid> {
        self.items.iter()
    }

    /// Drop all entries, returning how many were removed.
    pub fn clear(&mut self) -> usize {
        let count = self.items.len();
        self.items.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
