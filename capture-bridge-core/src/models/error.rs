use thiserror::Error;

/// Errors that can occur while acquiring, starting, or releasing a capture device.
///
/// The data path never produces these: the capture callback swallows failures and
/// the frame reader reports through its `bool` result.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("device not available")]
    DeviceNotAvailable,

    #[error("callback registration failed: {0}")]
    RegistrationFailed(String),

    #[error("failed to start device: {0}")]
    StartFailed(String),

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("invalid session state: {0}")]
    InvalidState(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("unknown error: {0}")]
    Unknown(String),
}
