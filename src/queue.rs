//! Thread-safe FIFO job queue with blocking take-with-timeout and a
//! sentinel value used to wake workers during shutdown.

use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, TryRecvError};

use crate::job::Job;

/// An entry pulled off the queue by a worker.
pub enum QueueItem {
    Job(Job),
    /// Wakes a blocked worker so it can observe the shutdown flag and exit.
    Sentinel,
}

/// What `take` observed within its timeout window.
pub enum TakeOutcome {
    Item(QueueItem),
    TimedOut,
}

/// Unbounded FIFO queue shared between ingress producers and pool workers.
pub struct JobQueue {
    sender: Sender<QueueItem>,
    receiver: Receiver<QueueItem>,
}

impl JobQueue {
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self { sender, receiver }
    }

    /// Enqueue a job. Never blocks.
    pub fn put(&self, job: Job) {
        // The receiver lives as long as `self`, so this can't fail.
        let _ = self.sender.send(QueueItem::Job(job));
    }

    /// Enqueue a sentinel to wake one blocked worker.
    pub fn put_sentinel(&self) {
        let _ = self.sender.send(QueueItem::Sentinel);
    }

    /// Block for up to `timeout` waiting for an item.
    pub fn take(&self, timeout: Duration) -> TakeOutcome {
        match self.receiver.recv_timeout(timeout) {
            Ok(item) => TakeOutcome::Item(item),
            Err(_) => TakeOutcome::TimedOut,
        }
    }

    /// Best-effort snapshot of the number of pending items (jobs + sentinels).
    pub fn size(&self) -> usize {
        self.receiver.len()
    }

    /// Non-blocking drain used only for diagnostics/tests.
    #[cfg(test)]
    pub fn try_take(&self) -> Result<QueueItem, TryRecvError> {
        self.receiver.try_recv()
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{JobArgs, JobKind};
    use std::time::Duration;

    fn job(id: u64) -> Job {
        Job {
            id,
            kind: JobKind::GlobalMean,
            args: JobArgs::default(),
        }
    }

    #[test]
    fn fifo_order_preserved() {
        let q = JobQueue::new();
        q.put(job(1));
        q.put(job(2));
        q.put(job(3));

        for expected in [1, 2, 3] {
            match q.take(Duration::from_millis(50)) {
                TakeOutcome::Item(QueueItem::Job(j)) => assert_eq!(j.id, expected),
                _ => panic!("expected job {expected}"),
            }
        }
    }

    #[test]
    fn take_times_out_when_empty() {
        let q = JobQueue::new();
        match q.take(Duration::from_millis(20)) {
            TakeOutcome::TimedOut => {}
            _ => panic!("expected timeout"),
        }
    }

    #[test]
    fn sentinel_wakes_a_waiting_take() {
        let q = JobQueue::new();
        q.put_sentinel();
        match q.take(Duration::from_millis(50)) {
            TakeOutcome::Item(QueueItem::Sentinel) => {}
            _ => panic!("expected sentinel"),
        }
    }

    #[test]
    fn size_reflects_pending_count() {
        let q = JobQueue::new();
        assert_eq!(q.size(), 0);
        q.put(job(1));
        q.put(job(2));
        assert_eq!(q.size(), 2);
        let _ = q.take(Duration::from_millis(50));
        assert_eq!(q.size(), 1);
    }
}
