use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::models::audio_models::{
    AudioBuffer, DeviceHandle, DeviceInfo, RegistrationHandle, StreamInfo,
};
use crate::models::error::CaptureError;

/// Status handed back to the hardware layer after each delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum CallbackStatus {
    NoError = 0,
}

/// Callback invoked by a capture source once per hardware delivery.
///
/// Receives the delivered buffer list; only the first buffer is consumed.
/// Fires on a thread owned by the source and must return quickly.
pub type CaptureCallback =
    Arc<dyn Fn(&[AudioBuffer<'_>]) -> CallbackStatus + Send + Sync + 'static>;

/// Stop signal for a source's run loop.
///
/// Cloned into the run-loop thread; `request_stop` wakes every waiter.
#[derive(Debug, Clone, Default)]
pub struct RunLoopSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl RunLoopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        let (stopped, condvar) = &*self.inner;
        *stopped.lock() = true;
        condvar.notify_all();
    }

    pub fn is_stop_requested(&self) -> bool {
        *self.inner.0.lock()
    }

    /// Block until a stop is requested.
    pub fn wait(&self) {
        let (stopped, condvar) = &*self.inner;
        let mut guard = stopped.lock();
        while !*guard {
            condvar.wait(&mut guard);
        }
    }

    /// Block for at most `timeout`. Returns `true` if a stop has been requested.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (stopped, condvar) = &*self.inner;
        let mut guard = stopped.lock();
        if !*guard {
            condvar.wait_for(&mut guard, timeout);
        }
        *guard
    }
}

/// Interface for platform-specific capture backends.
///
/// Implemented by:
/// - `SyntheticSource` (software tone, any platform)
/// - `NullSource` (no device available)
/// - `WasapiInputSource` (Windows)
///
/// Teardown contract: once `destroy_registration` returns, the callback registered
/// under that handle is never invoked again, and no invocation is still in flight.
pub trait AudioCaptureSource: Send + Sync {
    /// The system default input device, or `None` when there is none.
    fn default_input_device(&self) -> Option<DeviceHandle>;

    /// Register `callback` to receive deliveries from `device`.
    fn register_capture_callback(
        &self,
        device: &DeviceHandle,
        callback: CaptureCallback,
    ) -> Result<RegistrationHandle, CaptureError>;

    /// Start delivering buffers to the registered callback.
    fn start(
        &self,
        device: &DeviceHandle,
        registration: &RegistrationHandle,
    ) -> Result<(), CaptureError>;

    /// Stop the device side of a registration.
    fn stop(
        &self,
        device: &DeviceHandle,
        registration: &RegistrationHandle,
    ) -> Result<(), CaptureError>;

    /// Release the registration; the callback is dropped.
    fn destroy_registration(
        &self,
        device: &DeviceHandle,
        registration: &RegistrationHandle,
    ) -> Result<(), CaptureError>;

    /// Service the backend's event loop until `signal` is raised.
    ///
    /// Runs on the session's background thread.
    fn run_loop(&self, signal: &RunLoopSignal) {
        signal.wait();
    }

    /// Name, manufacturer, and unique id of `device`.
    fn device_info(&self, device: &DeviceHandle) -> Result<DeviceInfo, CaptureError>;

    /// Input stream format of `device`.
    fn stream_info(&self, device: &DeviceHandle) -> Result<StreamInfo, CaptureError>;
}
