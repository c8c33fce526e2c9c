use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::audio_models::{MAX_QUEUE_DEPTH, QUEUE_DEPTH_LIMIT};
use super::error::CaptureError;

/// How out-of-range float samples are narrowed to `i16`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClippingMode {
    /// Values outside [-1.0, 1.0) wrap around the `i16` range.
    #[default]
    Wrap,
    /// Values outside the representable range pin to `i16::MIN` / `i16::MAX`.
    Saturate,
}

/// What the frame reader writes into the right channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RightChannel {
    /// Leave whatever the caller already had in the buffer.
    #[default]
    Preserve,
    /// Duplicate the converted left sample.
    MirrorLeft,
}

/// Resolved configuration handed to a `CaptureBridge`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSettings {
    /// Pre-resolved capture endpoint path (e.g. a FIFO path), recorded for diagnostics.
    pub capture_endpoint: String,

    /// Queue depth at which all pending blocks are discarded (default: 100,
    /// at most `QUEUE_DEPTH_LIMIT`).
    pub max_queue_depth: usize,

    /// Narrowing policy for float to PCM16 conversion (default: wrap).
    pub clipping: ClippingMode,

    /// Right-channel policy (default: preserve).
    pub right_channel: RightChannel,
}

impl BridgeSettings {
    pub fn from_json_str(json: &str) -> Result<Self, CaptureError> {
        let settings: Self = serde_json::from_str(json)
            .map_err(|e| CaptureError::ConfigurationFailed(format!("invalid settings: {}", e)))?;
        settings.validate().map_err(CaptureError::ConfigurationFailed)?;
        Ok(settings)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CaptureError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| {
            CaptureError::ConfigurationFailed(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_queue_depth == 0 {
            return Err("max queue depth must be at least 1".into());
        }
        if self.max_queue_depth > QUEUE_DEPTH_LIMIT {
            return Err(format!(
                "max queue depth {} exceeds limit of {}",
                self.max_queue_depth, QUEUE_DEPTH_LIMIT
            ));
        }
        Ok(())
    }
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            capture_endpoint: String::new(),
            max_queue_depth: MAX_QUEUE_DEPTH,
            clipping: ClippingMode::Wrap,
            right_channel: RightChannel::Preserve,
        }
    }
}

/// Parameters of the software tone source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    /// Tone frequency in Hz (default: 440).
    pub frequency: f32,

    /// Peak amplitude in linear PCM float units (default: 0.5).
    pub amplitude: f32,

    /// Nominal sample rate reported as stream info (default: 48000).
    pub sample_rate: f64,

    /// Interval between deliveries in milliseconds (default: 10).
    pub period_ms: u64,
}

impl SyntheticConfig {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate <= 0.0 {
            return Err("sample rate must be positive".into());
        }
        if self.frequency < 0.0 {
            return Err(format!("negative tone frequency: {}", self.frequency));
        }
        if self.period_ms == 0 {
            return Err("delivery period must be at least 1 ms".into());
        }
        Ok(())
    }
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            frequency: 440.0,
            amplitude: 0.5,
            sample_rate: 48000.0,
            period_ms: 10,
        }
    }
}
