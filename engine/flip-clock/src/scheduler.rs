//! Deferred flip work
//!
//! A changed digit is not revealed right away: the widget queues a reveal for a fixed
//! delay later, and the reveal queues a settle that clears the flipped marker once the
//! transition has run. Tasks are ordered by deadline, then by scheduling order.

use std::collections::BTreeMap;

/// Handle to a queued task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

/// Deferred work for one rotor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipTask {
    /// Write the new digit to the top and rear faces and start the transition
    Reveal { position: usize, digit: char },
    /// Clear the flipped marker
    Settle { position: usize },
}

impl FlipTask {
    pub fn position(&self) -> usize {
        match *self {
            FlipTask::Reveal { position, .. } | FlipTask::Settle { position } => position,
        }
    }
}

/// Deadline-ordered queue of deferred flip work, deadlines in epoch milliseconds
#[derive(Debug, Default)]
pub struct FlipScheduler {
    queue: BTreeMap<(u64, TaskId), FlipTask>,
    next_id: u64,
}

impl FlipScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `task` to run once the clock reaches `due_ms`
    pub fn schedule(&mut self, due_ms: u64, task: FlipTask) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.queue.insert((due_ms, id), task);
        id
    }

    /// Earliest deadline still queued
    pub fn next_deadline(&self) -> Option<u64> {
        self.queue.keys().next().map(|&(due, _)| due)
    }

    /// Remove and return the earliest task due at or before `now_ms`
    pub fn pop_due(&mut self, now_ms: u64) -> Option<(TaskId, FlipTask)> {
        let (&(due, id), _) = self.queue.iter().next()?;
        if due > now_ms {
            return None;
        }
        self.queue.remove(&(due, id)).map(|task| (id, task))
    }

    /// Drop every queued task, returning them in deadline order
    pub fn cancel_all(&mut self) -> Vec<FlipTask> {
        std::mem::take(&mut self.queue).into_values().collect()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pops_in_deadline_then_fifo_order() {
        let mut scheduler = FlipScheduler::new();
        scheduler.schedule(2_000, FlipTask::Settle { position: 1 });
        scheduler.schedule(1_500, FlipTask::Reveal { position: 4, digit: '1' });
        scheduler.schedule(1_500, FlipTask::Reveal { position: 2, digit: '7' });

        assert_eq!(scheduler.next_deadline(), Some(1_500));
        assert!(scheduler.pop_due(1_499).is_none());

        let (_, first) = scheduler.pop_due(1_500).unwrap();
        let (_, second) = scheduler.pop_due(1_500).unwrap();
        assert_eq!(first.position(), 4);
        assert_eq!(second.position(), 2);
        assert!(scheduler.pop_due(1_999).is_none());
        assert_eq!(scheduler.pop_due(5_000).unwrap().1, FlipTask::Settle { position: 1 });
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_cancel_all_in_deadline_order() {
        let mut scheduler = FlipScheduler::new();
        scheduler.schedule(30, FlipTask::Settle { position: 3 });
        scheduler.schedule(10, FlipTask::Settle { position: 0 });
        assert_eq!(scheduler.len(), 2);

        let dropped = scheduler.cancel_all();
        assert_eq!(dropped.iter().map(|t| t.position()).collect::<Vec<_>>(), vec![0, 3]);
        assert!(scheduler.is_empty());
        assert_eq!(scheduler.next_deadline(), None);
    }
}
