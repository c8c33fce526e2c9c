//! # capture-bridge-core
//!
//! Platform-agnostic core of the capture bridge.
//!
//! Moves float sample buffers from a hardware callback thread to a consumer that
//! pulls PCM16 frames on its own schedule. Platform backends (Windows WASAPI,
//! the synthetic tone source) implement the `AudioCaptureSource` trait and plug
//! into the generic `CaptureBridge`.
//!
//! ## Architecture
//!
//! ```text
//! capture-bridge-core (this crate)
//! ├── traits/       ← AudioCaptureSource, CaptureCallback, PcmSource
//! ├── models/       ← CaptureError, SessionState, BridgeSettings, SampleBlock
//! ├── processing/   ← SampleBufferPool, CaptureHandler, FrameReader, PCM16 conversion
//! ├── session/      ← DeviceSession (device lifetime), CaptureBridge (facade)
//! └── sources/      ← SyntheticSource, NullSource
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod sources;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::audio_models::{
    AudioBuffer, AudioLevels, BridgeDiagnostics, DeviceHandle, DeviceInfo, RegistrationHandle,
    SampleBlock, StereoSample, StreamInfo, MAX_QUEUE_DEPTH, QUEUE_DEPTH_LIMIT, SAMPLE_WIDTH,
    TRANSFER_UNIT,
};
pub use models::config::{BridgeSettings, ClippingMode, RightChannel, SyntheticConfig};
pub use models::error::CaptureError;
pub use models::state::SessionState;
pub use processing::capture_handler::CaptureHandler;
pub use processing::frame_reader::FrameReader;
pub use processing::sample_pool::SampleBufferPool;
pub use session::bridge::CaptureBridge;
pub use session::device_session::DeviceSession;
pub use sources::null::NullSource;
pub use sources::synthetic::SyntheticSource;
pub use traits::capture_source::{
    AudioCaptureSource, CallbackStatus, CaptureCallback, RunLoopSignal,
};
pub use traits::pcm_source::PcmSource;
