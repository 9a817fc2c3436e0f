use std::collections::VecDeque;

use uuid::Uuid;

/// Outcome of an admission-checked push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Accepted at the given 1-based queue position.
    Accepted { position: usize },
    /// Queue at capacity; the submission must be counted as a rejection.
    Rejected,
}

/// Fixed-capacity FIFO of job ids.
///
/// Fresh submissions go through `try_push` and are subject to backpressure.
/// Already-admitted work (retries, manual DLQ re-admission) re-enters at the
/// tail through `readmit`, which bypasses the capacity check; the queue can
/// therefore exceed its capacity transiently under sustained failure.
#[derive(Debug)]
pub struct AdmissionQueue {
    items: VecDeque<Uuid>,
    capacity: usize,
}

impl AdmissionQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::new(),
            capacity,
        }
    }

    /// Admission-checked enqueue for a fresh submission.
    pub fn try_push(&mut self, id: Uuid) -> Admission {
        if self.items.len() >= self.capacity {
            return Admission::Rejected;
        }
        self.items.push_back(id);
        Admission::Accepted {
            position: self.items.len(),
        }
    }

    /// Tail enqueue for already-admitted work. Always accepted.
    pub fn readmit(&mut self, id: Uuid) {
        self.items.push_back(id);
    }

    /// Pop the head of the queue, in submission order.
    pub fn pop(&mut self) -> Option<Uuid> {
        self.items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_until_capacity() {
        let mut queue = AdmissionQueue::new(2);

        assert_eq!(
            queue.try_push(Uuid::new_v4()),
            Admission::Accepted { position: 1 }
        );
        assert_eq!(
            queue.try_push(Uuid::new_v4()),
            Admission::Accepted { position: 2 }
        );
        assert!(queue.is_full());
        assert_eq!(queue.try_push(Uuid::new_v4()), Admission::Rejected);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn fifo_order_preserved() {
        let mut queue = AdmissionQueue::new(10);
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        queue.try_push(first);
        queue.try_push(second);

        assert_eq!(queue.pop(), Some(first));
        assert_eq!(queue.pop(), Some(second));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn readmit_bypasses_capacity() {
        let mut queue = AdmissionQueue::new(1);
        queue.try_push(Uuid::new_v4());
        assert!(queue.is_full());

        let retry = Uuid::new_v4();
        queue.readmit(retry);
        assert_eq!(queue.len(), 2);

        // Retries enter at the tail, not the head
        queue.pop();
        assert_eq!(queue.pop(), Some(retry));
    }
}
