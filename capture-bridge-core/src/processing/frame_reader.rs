use std::sync::Arc;

use crate::models::audio_models::{AudioLevels, StereoSample, TRANSFER_UNIT};
use crate::models::config::{BridgeSettings, ClippingMode, RightChannel};
use crate::processing::conversion;
use crate::processing::sample_pool::SampleBufferPool;

/// Consumer side of the bridge: drains the pool in FIFO order into PCM16 frames.
///
/// Each dequeued block fills one transfer unit (512 frames) of the output. A
/// request is served in whole units; remainder frames are left for the caller.
#[derive(Debug)]
pub struct FrameReader {
    pool: Arc<SampleBufferPool>,
    clipping: ClippingMode,
    right_channel: RightChannel,
    blocks_delivered: u64,
    frames_delivered: u64,
    last_levels: AudioLevels,
    flushes_seen: u64,
}

impl FrameReader {
    pub fn new(pool: Arc<SampleBufferPool>) -> Self {
        Self {
            pool,
            clipping: ClippingMode::default(),
            right_channel: RightChannel::default(),
            blocks_delivered: 0,
            frames_delivered: 0,
            last_levels: AudioLevels::default(),
            flushes_seen: 0,
        }
    }

    pub fn with_settings(pool: Arc<SampleBufferPool>, settings: &BridgeSettings) -> Self {
        Self {
            clipping: settings.clipping,
            right_channel: settings.right_channel,
            ..Self::new(pool)
        }
    }

    /// Fill `output` with up to `frame_count / 512` blocks of converted audio.
    ///
    /// Returns `false`, without dequeuing or writing, when `frame_count` is smaller
    /// than one transfer unit or `output` holds fewer than `frame_count` frames.
    /// Running out of queued blocks ends the fill early and still returns `true`.
    pub fn read(&mut self, output: &mut [StereoSample], frame_count: u32) -> bool {
        let frame_count = frame_count as usize;
        if TRANSFER_UNIT > frame_count || output.len() < frame_count {
            log::debug!(
                "read rejected: {} frames requested into {} slots, transfer unit is {}",
                frame_count,
                output.len(),
                TRANSFER_UNIT
            );
            return false;
        }

        self.report_overflow();

        let blocks_needed = frame_count / TRANSFER_UNIT;
        let units = output.chunks_exact_mut(TRANSFER_UNIT).take(blocks_needed);
        for (j, unit) in units.enumerate() {
            let Some(block) = self.pool.dequeue_front() else {
                log::trace!("read drained the pool after {} of {} blocks", j, blocks_needed);
                break;
            };

            let samples = &block.samples()[..block.len().min(TRANSFER_UNIT)];
            let written =
                conversion::convert_into_left(samples, unit, self.clipping, self.right_channel);

            self.last_levels = conversion::levels(samples);
            self.blocks_delivered += 1;
            self.frames_delivered += written as u64;
        }

        true
    }

    /// Log overflow flushes the producer recorded since the last read.
    fn report_overflow(&mut self) {
        let flushes = self.pool.overflow_flushes();
        if flushes > self.flushes_seen {
            log::debug!(
                "sample pool overflowed {} time(s) since last read, {} blocks discarded in total",
                flushes - self.flushes_seen,
                self.pool.blocks_dropped()
            );
            self.flushes_seen = flushes;
        }
    }

    pub fn blocks_delivered(&self) -> u64 {
        self.blocks_delivered
    }

    pub fn frames_delivered(&self) -> u64 {
        self.frames_delivered
    }

    /// Levels of the most recently converted block.
    pub fn last_levels(&self) -> AudioLevels {
        self.last_levels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::audio_models::SampleBlock;

    const MARKER: StereoSample = StereoSample::new(111, -222);

    fn reader_with(blocks: &[&[f32]]) -> (Arc<SampleBufferPool>, FrameReader) {
        let pool = Arc::new(SampleBufferPool::default());
        for samples in blocks {
            pool.enqueue(SampleBlock::from_samples(samples));
        }
        let reader = FrameReader::new(Arc::clone(&pool));
        (pool, reader)
    }

    #[test]
    fn converts_full_unit_into_left_channel() {
        let block = vec![0.5f32; TRANSFER_UNIT];
        let (_pool, mut reader) = reader_with(&[&block]);
        let mut out = vec![MARKER; TRANSFER_UNIT];

        assert!(reader.read(&mut out, TRANSFER_UNIT as u32));

        assert!(out.iter().all(|f| f.left == 16384 && f.right == MARKER.right));
        assert_eq!(reader.blocks_delivered(), 1);
        assert_eq!(reader.frames_delivered(), 512);
    }

    #[test]
    fn partial_fill_leaves_second_unit_untouched() {
        let block = vec![-1.0f32; TRANSFER_UNIT];
        let (_pool, mut reader) = reader_with(&[&block]);
        let mut out = vec![MARKER; 1024];

        assert!(reader.read(&mut out, 1024));

        assert!(out[..512].iter().all(|f| f.left == -32768));
        assert!(out[512..].iter().all(|f| *f == MARKER));
    }

    #[test]
    fn capacity_guard_rejects_small_requests() {
        let block = vec![0.5f32; TRANSFER_UNIT];
        let (pool, mut reader) = reader_with(&[&block]);
        let mut out = vec![MARKER; 100];

        assert!(!reader.read(&mut out, 100));

        assert!(out.iter().all(|f| *f == MARKER));
        assert_eq!(pool.len(), 1, "guard must not consume queued blocks");
    }

    #[test]
    fn capacity_guard_rejects_undersized_output() {
        let block = vec![0.5f32; TRANSFER_UNIT];
        let (pool, mut reader) = reader_with(&[&block]);
        let mut out = vec![MARKER; 600];

        assert!(!reader.read(&mut out, 1024));
        assert!(out.iter().all(|f| *f == MARKER));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn empty_queue_is_success_with_no_writes() {
        let (_pool, mut reader) = reader_with(&[]);
        let mut out = vec![MARKER; 2048];

        assert!(reader.read(&mut out, 2048));
        assert!(out.iter().all(|f| *f == MARKER));
        assert_eq!(reader.frames_delivered(), 0);
    }

    #[test]
    fn remainder_frames_are_not_filled() {
        let block = vec![0.5f32; TRANSFER_UNIT];
        let (pool, mut reader) = reader_with(&[&block, &block]);
        let mut out = vec![MARKER; 700];

        assert!(reader.read(&mut out, 700));

        assert!(out[..512].iter().all(|f| f.left == 16384));
        assert!(out[512..].iter().all(|f| *f == MARKER));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn blocks_land_in_arrival_order() {
        let first = vec![0.25f32; TRANSFER_UNIT];
        let second = vec![-0.25f32; TRANSFER_UNIT];
        let (_pool, mut reader) = reader_with(&[&first, &second]);
        let mut out = vec![StereoSample::default(); 1024];

        assert!(reader.read(&mut out, 1024));

        assert_eq!(out[0].left, 8192);
        assert_eq!(out[511].left, 8192);
        assert_eq!(out[512].left, -8192);
        assert_eq!(out[1023].left, -8192);
    }

    #[test]
    fn short_block_fills_only_its_prefix() {
        let (_pool, mut reader) = reader_with(&[&[0.5, 0.5, 0.5]]);
        let mut out = vec![MARKER; 512];

        assert!(reader.read(&mut out, 512));

        assert!(out[..3].iter().all(|f| f.left == 16384));
        assert!(out[3..].iter().all(|f| *f == MARKER));
        assert_eq!(reader.frames_delivered(), 3);
    }

    #[test]
    fn long_block_is_truncated_to_one_unit() {
        let block = vec![0.5f32; TRANSFER_UNIT + 100];
        let (_pool, mut reader) = reader_with(&[&block]);
        let mut out = vec![MARKER; 1024];

        assert!(reader.read(&mut out, 1024));

        assert!(out[..512].iter().all(|f| f.left == 16384));
        assert!(out[512..].iter().all(|f| *f == MARKER));
    }

    #[test]
    fn settings_select_mirror_and_saturate() {
        let pool = Arc::new(SampleBufferPool::default());
        pool.enqueue(SampleBlock::from(vec![2.0f32; TRANSFER_UNIT]));
        let settings = BridgeSettings {
            clipping: ClippingMode::Saturate,
            right_channel: RightChannel::MirrorLeft,
            ..BridgeSettings::default()
        };
        let mut reader = FrameReader::with_settings(pool, &settings);
        let mut out = vec![MARKER; 512];

        assert!(reader.read(&mut out, 512));
        assert!(out.iter().all(|f| f.left == i16::MAX && f.right == i16::MAX));
    }

    #[test]
    fn records_levels_of_last_block() {
        let block = vec![0.5f32; TRANSFER_UNIT];
        let (_pool, mut reader) = reader_with(&[&block]);
        let mut out = vec![StereoSample::default(); 512];

        reader.read(&mut out, 512);

        let levels = reader.last_levels();
        approx::assert_relative_eq!(levels.peak, 0.5, epsilon = 1e-6);
        approx::assert_relative_eq!(levels.rms, 0.5, epsilon = 1e-4);
    }

    #[test]
    fn overflow_is_reported_once_per_flush() {
        let pool = Arc::new(SampleBufferPool::new(2));
        let mut reader = FrameReader::new(Arc::clone(&pool));
        for i in 0..3 {
            pool.enqueue(SampleBlock::from_samples(&[i as f32 / 4.0]));
        }
        let mut out = vec![MARKER; TRANSFER_UNIT];

        assert!(reader.read(&mut out, TRANSFER_UNIT as u32));
        assert_eq!(reader.flushes_seen, 1);
        assert_eq!(out[0].left, 16384);

        assert!(reader.read(&mut out, TRANSFER_UNIT as u32));
        assert_eq!(reader.flushes_seen, 1);
    }
}
