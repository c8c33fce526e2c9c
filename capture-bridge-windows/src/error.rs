use thiserror::Error;

use capture_bridge_core::models::error::CaptureError;

/// Failures inside the WASAPI backend.
///
/// Converted to `CaptureError` at the `AudioCaptureSource` boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WasapiError {
    #[error("{call} failed: {message}")]
    Com { call: &'static str, message: String },

    #[error("no default capture endpoint")]
    NoDefaultEndpoint,

    #[error("unsupported mix format: {bits} bits per sample, tag {tag:#06x}")]
    UnsupportedFormat { bits: u16, tag: u16 },

    #[error("capture thread exited before reporting readiness")]
    ThreadExited,
}

impl WasapiError {
    pub fn com(call: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Com {
            call,
            message: err.to_string(),
        }
    }
}

impl From<WasapiError> for CaptureError {
    fn from(err: WasapiError) -> Self {
        match err {
            WasapiError::NoDefaultEndpoint => CaptureError::DeviceNotAvailable,
            other => CaptureError::Backend(other.to_string()),
        }
    }
}
