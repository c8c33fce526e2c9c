use crate::models::audio_models::{DeviceHandle, DeviceInfo, RegistrationHandle, StreamInfo};
use crate::models::error::CaptureError;
use crate::traits::capture_source::{AudioCaptureSource, CaptureCallback};

/// Capture source for platforms without an OS-level input device.
///
/// Never yields a device, so a session over it fails to start and the bridge
/// reports "no data" on every read.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSource;

impl AudioCaptureSource for NullSource {
    fn default_input_device(&self) -> Option<DeviceHandle> {
        None
    }

    fn register_capture_callback(
        &self,
        _device: &DeviceHandle,
        _callback: CaptureCallback,
    ) -> Result<RegistrationHandle, CaptureError> {
        Err(CaptureError::DeviceNotAvailable)
    }

    fn start(
        &self,
        _device: &DeviceHandle,
        _registration: &RegistrationHandle,
    ) -> Result<(), CaptureError> {
        Err(CaptureError::DeviceNotAvailable)
    }

    fn stop(
        &self,
        _device: &DeviceHandle,
        _registration: &RegistrationHandle,
    ) -> Result<(), CaptureError> {
        Ok(())
    }

    fn destroy_registration(
        &self,
        _device: &DeviceHandle,
        _registration: &RegistrationHandle,
    ) -> Result<(), CaptureError> {
        Ok(())
    }

    fn device_info(&self, _device: &DeviceHandle) -> Result<DeviceInfo, CaptureError> {
        Err(CaptureError::DeviceNotAvailable)
    }

    fn stream_info(&self, _device: &DeviceHandle) -> Result<StreamInfo, CaptureError> {
        Err(CaptureError::DeviceNotAvailable)
    }
}
