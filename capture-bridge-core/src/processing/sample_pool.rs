use std::collections::VecDeque;
use std::mem;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::models::audio_models::{SampleBlock, MAX_QUEUE_DEPTH, QUEUE_DEPTH_LIMIT};

/// Bounded FIFO of sample blocks shared between the capture callback and the reader.
///
/// Share via `Arc<SampleBufferPool>`. A single mutex guards the block list only;
/// blocks are built before `enqueue` and converted after `dequeue_front`.
///
/// Overflow behavior: once `max_depth` blocks are queued, the next `enqueue`
/// discards all of them before inserting. The discarded blocks are swapped into
/// a spare list and freed after the queue lock is released.
#[derive(Debug)]
pub struct SampleBufferPool {
    queue: Mutex<VecDeque<SampleBlock>>,
    // Only `enqueue` touches this; it is always empty outside an overflow.
    spare: Mutex<VecDeque<SampleBlock>>,
    max_depth: usize,
    overflow_flushes: AtomicU64,
    blocks_dropped: AtomicU64,
}

impl SampleBufferPool {
    /// `max_depth` is clamped to `1..=QUEUE_DEPTH_LIMIT`.
    pub fn new(max_depth: usize) -> Self {
        let max_depth = max_depth.clamp(1, QUEUE_DEPTH_LIMIT);
        let capacity = max_depth.saturating_add(1);
        Self {
            // Sized up front so a push under the lock never reallocates.
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            spare: Mutex::new(VecDeque::with_capacity(capacity)),
            max_depth,
            overflow_flushes: AtomicU64::new(0),
            blocks_dropped: AtomicU64::new(0),
        }
    }

    /// Append `block` at the tail, flushing the whole queue first if it is full.
    ///
    /// Does not log; overflow is visible through `overflow_flushes`.
    pub fn enqueue(&self, block: SampleBlock) {
        let mut spare = self.spare.lock();
        {
            let mut queue = self.queue.lock();
            if queue.len() >= self.max_depth {
                mem::swap(&mut *queue, &mut *spare);
            }
            queue.push_back(block);
        }

        let dropped = spare.len();
        if dropped > 0 {
            spare.clear();
            self.overflow_flushes.fetch_add(1, Ordering::Relaxed);
            self.blocks_dropped.fetch_add(dropped as u64, Ordering::Relaxed);
        }
    }

    /// Remove and return the oldest block, if any. Never waits for data.
    pub fn dequeue_front(&self) -> Option<SampleBlock> {
        self.queue.lock().pop_front()
    }

    /// Number of blocks currently queued.
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Discard every queued block.
    pub fn clear(&self) {
        self.queue.lock().clear();
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// How many times the queue was flushed on overflow.
    pub fn overflow_flushes(&self) -> u64 {
        self.overflow_flushes.load(Ordering::Relaxed)
    }

    /// Total blocks lost to overflow flushes.
    pub fn blocks_dropped(&self) -> u64 {
        self.blocks_dropped.load(Ordering::Relaxed)
    }
}

impl Default for SampleBufferPool {
    fn default() -> Self {
        Self::new(MAX_QUEUE_DEPTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn block(tag: f32) -> SampleBlock {
        SampleBlock::from_samples(&[tag])
    }

    #[test]
    fn fifo_order() {
        let pool = SampleBufferPool::default();
        for i in 0..100 {
            pool.enqueue(block(i as f32));
        }

        for i in 0..100 {
            let b = pool.dequeue_front().unwrap();
            assert_eq!(b.samples()[0], i as f32);
        }
        assert!(pool.dequeue_front().is_none());
    }

    #[test]
    fn overflow_discards_everything_but_newest() {
        let pool = SampleBufferPool::default();
        for i in 0..100 {
            pool.enqueue(block(i as f32));
        }
        assert_eq!(pool.len(), 100);

        pool.enqueue(block(1000.0));

        assert_eq!(pool.len(), 1);
        assert_eq!(pool.dequeue_front().unwrap().samples()[0], 1000.0);
        assert!(pool.is_empty());
        assert_eq!(pool.overflow_flushes(), 1);
        assert_eq!(pool.blocks_dropped(), 100);
    }

    #[test]
    fn flushed_blocks_leave_the_spare_list_empty() {
        let pool = SampleBufferPool::new(4);
        for i in 0..5 {
            pool.enqueue(block(i as f32));
        }

        assert!(pool.spare.lock().is_empty());
        assert!(pool.spare.lock().capacity() >= 5);
        assert!(pool.queue.lock().capacity() >= 5);
    }

    #[test]
    fn below_bound_keeps_everything() {
        let pool = SampleBufferPool::new(4);
        for i in 0..4 {
            pool.enqueue(block(i as f32));
        }
        assert_eq!(pool.len(), 4);
        assert_eq!(pool.overflow_flushes(), 0);
    }

    #[test]
    fn resumes_fifo_after_flush() {
        let pool = SampleBufferPool::new(2);
        pool.enqueue(block(1.0));
        pool.enqueue(block(2.0));
        pool.enqueue(block(3.0)); // flush
        pool.enqueue(block(4.0));

        assert_eq!(pool.dequeue_front().unwrap().samples()[0], 3.0);
        assert_eq!(pool.dequeue_front().unwrap().samples()[0], 4.0);
        assert!(pool.dequeue_front().is_none());
    }

    #[test]
    fn empty_dequeue_returns_none() {
        let pool = SampleBufferPool::default();
        assert!(pool.dequeue_front().is_none());
    }

    #[test]
    fn zero_depth_is_treated_as_one() {
        let pool = SampleBufferPool::new(0);
        assert_eq!(pool.max_depth(), 1);
        pool.enqueue(block(1.0));
        pool.enqueue(block(2.0));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn depth_is_clamped_to_limit() {
        assert_eq!(SampleBufferPool::new(usize::MAX).max_depth(), QUEUE_DEPTH_LIMIT);
        assert_eq!(SampleBufferPool::new(1_000_000_000_000).max_depth(), QUEUE_DEPTH_LIMIT);
    }

    #[test]
    fn repeated_flushes_keep_counting() {
        let pool = SampleBufferPool::new(3);
        for i in 0..10 {
            pool.enqueue(block(i as f32));
        }

        // 0,1,2 | 3 flushes -> 3,4,5 | 6 flushes -> 6,7,8 | 9 flushes -> 9
        assert_eq!(pool.overflow_flushes(), 3);
        assert_eq!(pool.blocks_dropped(), 9);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.dequeue_front().unwrap().samples()[0], 9.0);
    }

    #[test]
    fn concurrent_producer_consumer_preserves_order() {
        let pool = Arc::new(SampleBufferPool::new(10_000));
        let producer = {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                for i in 0..2000 {
                    pool.enqueue(block(i as f32));
                }
            })
        };

        let mut seen = Vec::new();
        while seen.len() < 2000 {
            match pool.dequeue_front() {
                Some(b) => seen.push(b.samples()[0]),
                None => thread::yield_now(),
            }
        }
        producer.join().unwrap();

        let expected: Vec<f32> = (0..2000).map(|i| i as f32).collect();
        assert_eq!(seen, expected);
    }
}
