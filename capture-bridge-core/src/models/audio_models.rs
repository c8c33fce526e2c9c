use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of samples moved per hardware delivery and per dequeue.
pub const TRANSFER_UNIT: usize = 512;

/// Width in bytes of one linear PCM float sample.
pub const SAMPLE_WIDTH: usize = std::mem::size_of::<f32>();

/// Default bound on the number of queued blocks before the pool is flushed.
pub const MAX_QUEUE_DEPTH: usize = 100;

/// Largest configurable queue depth (about 20 MB of queued 512-sample blocks).
pub const QUEUE_DEPTH_LIMIT: usize = 10_000;

/// One converted output frame in fixed-point PCM16.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(C)]
pub struct StereoSample {
    pub left: i16,
    pub right: i16,
}

impl StereoSample {
    pub const fn new(left: i16, right: i16) -> Self {
        Self { left, right }
    }
}

/// An owned block of linear PCM float samples copied out of one hardware delivery.
///
/// Immutable once built. Dropping the block releases its storage.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBlock {
    samples: Box<[f32]>,
}

impl SampleBlock {
    /// Copy a raw native-endian `f32` byte buffer into a new block.
    ///
    /// The sample count is `bytes.len() / 4`; trailing bytes that do not form a
    /// whole sample are ignored.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let samples: Box<[f32]> = bytes
            .chunks_exact(SAMPLE_WIDTH)
            .map(|chunk| f32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        Self { samples }
    }

    pub fn from_samples(samples: &[f32]) -> Self {
        Self {
            samples: samples.into(),
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl From<Vec<f32>> for SampleBlock {
    fn from(samples: Vec<f32>) -> Self {
        Self {
            samples: samples.into_boxed_slice(),
        }
    }
}

/// One raw buffer in a hardware delivery.
///
/// `data` holds native-endian `f32` samples exactly as the device produced them.
#[derive(Debug, Clone, Copy)]
pub struct AudioBuffer<'a> {
    pub channels: u32,
    pub data: &'a [u8],
}

impl<'a> AudioBuffer<'a> {
    pub fn new(channels: u32, data: &'a [u8]) -> Self {
        Self { channels, data }
    }

    pub fn byte_size(&self) -> usize {
        self.data.len()
    }
}

/// Opaque identifier of a capture device, as handed out by a capture source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceHandle(String);

impl DeviceHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a callback registered with a capture source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationHandle(uuid::Uuid);

impl RegistrationHandle {
    pub fn new_v4() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl fmt::Display for RegistrationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Human-readable device metadata, used for diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub name: String,
    pub manufacturer: String,
    pub unique_id: String,
}

/// Stream format of a device's input side, used for diagnostics only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamInfo {
    pub sample_rate: f64,
    pub format_id: String,
    pub channels: u32,
}

/// Level metering of the most recently converted block (RMS and peak, 0.0–1.0).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioLevels {
    pub rms: f32,
    pub peak: f32,
}

/// Point-in-time counters for a running bridge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeDiagnostics {
    pub callback_count: u64,
    pub samples_received: u64,
    pub queue_depth: usize,
    pub overflow_flushes: u64,
    pub blocks_dropped: u64,
    pub blocks_delivered: u64,
    pub frames_delivered: u64,
    pub levels: AudioLevels,
    pub started_at: Option<DateTime<Utc>>,
}
