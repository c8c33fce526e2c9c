//! # capture-bridge-windows
//!
//! Windows WASAPI backend for capture-bridge.
//!
//! Provides:
//! - `WasapiInputSource`: default capture endpoint in shared mode, first channel,
//!   re-chunked into 512-sample transfer units
//! - `DeviceEnumerator`: endpoint lookup and diagnostic metadata via the MMDevice API
//! - `TransferUnitAssembler`: packet re-chunking, platform independent
//! - `format`: mix-format checks (32-bit IEEE float only), platform independent
//!
//! ## Usage
//! ```ignore
//! use capture_bridge_core::{BridgeSettings, CaptureBridge, PcmSource};
//! use capture_bridge_windows::WasapiInputSource;
//!
//! let settings = BridgeSettings::default();
//! let mut bridge = CaptureBridge::new(&settings, WasapiInputSource::new());
//! ```

pub mod error;
pub mod format;
pub mod transfer;

#[cfg(target_os = "windows")]
pub mod device_enumerator;
#[cfg(target_os = "windows")]
pub mod wasapi_input;

pub use error::WasapiError;
pub use transfer::TransferUnitAssembler;

#[cfg(target_os = "windows")]
pub use device_enumerator::DeviceEnumerator;
#[cfg(target_os = "windows")]
pub use wasapi_input::WasapiInputSource;
