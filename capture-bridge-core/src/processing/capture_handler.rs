use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::models::audio_models::{AudioBuffer, SampleBlock, SAMPLE_WIDTH};
use crate::processing::sample_pool::SampleBufferPool;
use crate::traits::capture_source::{CallbackStatus, CaptureCallback};

/// Entry point for hardware deliveries.
///
/// Each delivery costs one allocation, one copy, and one locked insert. Conversion
/// to PCM16 happens later, on the reader's thread.
#[derive(Debug)]
pub struct CaptureHandler {
    pool: Arc<SampleBufferPool>,
    callback_count: AtomicU64,
    samples_received: AtomicU64,
}

impl CaptureHandler {
    pub fn new(pool: Arc<SampleBufferPool>) -> Self {
        Self {
            pool,
            callback_count: AtomicU64::new(0),
            samples_received: AtomicU64::new(0),
        }
    }

    /// Handle one delivery. Always reports `NoError` to the caller.
    pub fn on_buffers(&self, buffers: &[AudioBuffer<'_>]) -> CallbackStatus {
        self.callback_count.fetch_add(1, Ordering::Relaxed);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.enqueue_first(buffers)));
        if outcome.is_err() {
            log::error!("capture callback panicked; delivery dropped");
        }

        CallbackStatus::NoError
    }

    /// Wrap this handler as a callback a capture source can hold.
    pub fn into_callback(self: Arc<Self>) -> CaptureCallback {
        Arc::new(move |buffers: &[AudioBuffer<'_>]| self.on_buffers(buffers))
    }

    pub fn callback_count(&self) -> u64 {
        self.callback_count.load(Ordering::Relaxed)
    }

    pub fn samples_received(&self) -> u64 {
        self.samples_received.load(Ordering::Relaxed)
    }

    pub fn pool(&self) -> &Arc<SampleBufferPool> {
        &self.pool
    }

    fn enqueue_first(&self, buffers: &[AudioBuffer<'_>]) {
        let Some(first) = buffers.first() else {
            log::trace!("capture callback delivered no buffers");
            return;
        };

        let units = first.byte_size() / SAMPLE_WIDTH;
        let block = SampleBlock::from_bytes(first.data);
        debug_assert_eq!(block.len(), units);

        if log::log_enabled!(log::Level::Trace) {
            log::trace!(
                "captured {} samples ({} channels), first = {:?}",
                units,
                first.channels,
                block.samples().first()
            );
        }

        self.samples_received.fetch_add(units as u64, Ordering::Relaxed);
        self.pool.enqueue(block);
    }
}
