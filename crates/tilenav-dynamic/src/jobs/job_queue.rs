use super::DynamicTileJob;
use crossbeam_channel::{unbounded, Receiver, Sender};

/// Multi-producer queue of pending tile jobs
///
/// Any thread holding a shared reference may enqueue. Draining needs
/// exclusive access, so jobs are consumed by exactly one rebuild at a time.
#[derive(Debug)]
pub struct JobQueue {
    sender: Sender<DynamicTileJob>,
    receiver: Receiver<DynamicTileJob>,
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl JobQueue {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    pub fn enqueue(&self, job: impl Into<DynamicTileJob>) {
        // The receiver lives as long as the queue, so the channel never disconnects
        if let Err(err) = self.sender.send(job.into()) {
            log::warn!("Dropped job: {}", err.into_inner().description());
        }
    }

    /// Removes and returns every queued job in submission order
    pub fn drain(&mut self) -> Vec<DynamicTileJob> {
        self.receiver.try_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamic_tile::TileCoord;
    use crate::jobs::ColliderRemovalJob;
    use std::collections::BTreeSet;

    fn removal(id: u64) -> ColliderRemovalJob {
        ColliderRemovalJob::new(id, BTreeSet::from([TileCoord::new(0, 0)]))
    }

    #[test]
    fn test_drain_is_fifo_and_empties_queue() {
        let mut queue = JobQueue::new();
        for id in 0..5 {
            queue.enqueue(removal(id));
        }
        assert_eq!(queue.len(), 5);

        let ids: Vec<u64> = queue
            .drain()
            .into_iter()
            .map(|job| match job {
                DynamicTileJob::RemoveCollider(job) => job.collider_id(),
                DynamicTileJob::AddCollider(job) => job.collider_id(),
            })
            .collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
        assert!(queue.is_empty());
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_concurrent_producers() {
        let mut queue = JobQueue::new();
        std::thread::scope(|scope| {
            for t in 0..4u64 {
                let queue = &queue;
                scope.spawn(move || {
                    for i in 0..100 {
                        queue.enqueue(removal(t * 1000 + i));
                    }
                });
            }
        });
        assert_eq!(queue.drain().len(), 400);
    }
}
