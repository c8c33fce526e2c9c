//! Linear PCM float to PCM16 conversion and level metering.
//!
//! Pure functions over slices with no platform dependencies.

use crate::models::audio_models::{AudioLevels, StereoSample};
use crate::models::config::{ClippingMode, RightChannel};

/// Scale applied to a float sample before narrowing to `i16`.
pub const PCM16_SCALE: f64 = 32768.0;

/// Span of the `i16` range, the modulus for `ClippingMode::Wrap`.
const PCM16_SPAN: f64 = 65536.0;

/// Convert one float sample to PCM16: `round(32768.0 * sample)` narrowed per `mode`.
///
/// `ClippingMode::Wrap` reduces the rounded value modulo 2^16 for every finite
/// input, so `1.0` becomes `-32768` and very large magnitudes wrap rather than
/// pinning. Non-finite input has no residue: NaN and ±inf convert to 0.
///
/// `ClippingMode::Saturate` pins to `i16::MIN`/`i16::MAX` (±inf included);
/// NaN converts to 0.
pub fn float_to_pcm16(sample: f32, mode: ClippingMode) -> i16 {
    let scaled = (f64::from(sample) * PCM16_SCALE).round();
    match mode {
        ClippingMode::Wrap if !scaled.is_finite() => 0,
        // Exact for integral f64; the residue is in [0, 65536).
        ClippingMode::Wrap => scaled.rem_euclid(PCM16_SPAN) as u16 as i16,
        ClippingMode::Saturate => scaled as i16,
    }
}

/// Write `samples` into the left channel of `frames`, one sample per frame.
///
/// Converts `min(samples.len(), frames.len())` samples and returns that count.
/// Frames beyond the count are left untouched.
pub fn convert_into_left(
    samples: &[f32],
    frames: &mut [StereoSample],
    mode: ClippingMode,
    right: RightChannel,
) -> usize {
    let count = samples.len().min(frames.len());
    for (frame, &sample) in frames.iter_mut().zip(samples) {
        let value = float_to_pcm16(sample, mode);
        frame.left = value;
        if right == RightChannel::MirrorLeft {
            frame.right = value;
        }
    }
    count
}

/// RMS level of `samples` (0.0–1.0 for normalized audio).
pub fn rms_level(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// Peak absolute level of `samples`.
pub fn peak_level(samples: &[f32]) -> f32 {
    samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max)
}

pub fn levels(samples: &[f32]) -> AudioLevels {
    AudioLevels {
        rms: rms_level(samples),
        peak: peak_level(samples),
    }
}
