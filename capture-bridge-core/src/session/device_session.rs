use std::sync::Arc;
use std::thread;

use chrono::{DateTime, Utc};

use crate::models::audio_models::{DeviceHandle, RegistrationHandle};
use crate::models::error::CaptureError;
use crate::models::state::SessionState;
use crate::traits::capture_source::{AudioCaptureSource, CaptureCallback, RunLoopSignal};

/// Live binding to one started device.
struct Binding {
    device: DeviceHandle,
    registration: RegistrationHandle,
    run_loop: RunLoopSignal,
    run_loop_thread: Option<thread::JoinHandle<()>>,
}

/// Owns the lifetime of one capture connection.
///
/// Startup: acquire default input device → register callback → start device →
/// spawn run-loop thread. Teardown runs in the reverse, mandatory order:
/// stop run loop → join its thread → destroy registration → stop device.
pub struct DeviceSession<S: AudioCaptureSource + 'static> {
    source: Arc<S>,
    state: SessionState,
    binding: Option<Binding>,
    started_at: Option<DateTime<Utc>>,
}

impl<S: AudioCaptureSource + 'static> DeviceSession<S> {
    pub fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
            state: SessionState::Uninitialized,
            binding: None,
            started_at: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn device(&self) -> Option<&DeviceHandle> {
        self.binding.as_ref().map(|b| &b.device)
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Acquire the default input device and start delivering to `callback`.
    ///
    /// On failure the session ends in `Failed` and is not retried.
    pub fn start(&mut self, callback: CaptureCallback) -> Result<(), CaptureError> {
        if !self.state.can_start() {
            return Err(CaptureError::InvalidState(format!(
                "cannot start from {:?}",
                self.state
            )));
        }

        self.set_state(SessionState::Starting);

        match self.acquire(callback) {
            Ok(binding) => {
                log::info!(
                    "capture session running on device {} (registration {})",
                    binding.device,
                    binding.registration
                );
                self.binding = Some(binding);
                self.started_at = Some(Utc::now());
                self.set_state(SessionState::Running);
                Ok(())
            }
            Err(e) => {
                log::error!("failed to start capture session: {}", e);
                self.set_state(SessionState::Failed(e.clone()));
                Err(e)
            }
        }
    }

    /// Tear the session down. Idempotent; a session that never ran is a no-op.
    pub fn shutdown(&mut self) -> Result<(), CaptureError> {
        let Some(mut binding) = self.binding.take() else {
            if self.state == SessionState::Uninitialized {
                self.set_state(SessionState::Terminated);
            }
            return Ok(());
        };

        self.set_state(SessionState::Stopping);

        binding.run_loop.request_stop();
        if let Some(handle) = binding.run_loop_thread.take() {
            if handle.join().is_err() {
                log::error!("capture run loop thread panicked");
            }
        }

        let destroyed = self
            .source
            .destroy_registration(&binding.device, &binding.registration);
        if let Err(ref e) = destroyed {
            log::error!("failed to destroy capture registration: {}", e);
        }

        let stopped = self.source.stop(&binding.device, &binding.registration);
        if let Err(ref e) = stopped {
            log::error!("failed to stop capture device: {}", e);
        }

        self.set_state(SessionState::Terminated);
        log::info!("capture session on device {} terminated", binding.device);

        destroyed.and(stopped)
    }

    fn acquire(&self, callback: CaptureCallback) -> Result<Binding, CaptureError> {
        let device = self
            .source
            .default_input_device()
            .ok_or(CaptureError::DeviceNotAvailable)?;

        self.log_device_metadata(&device);

        let registration = self.source.register_capture_callback(&device, callback)?;

        if let Err(e) = self.source.start(&device, &registration) {
            self.release_registration(&device, &registration);
            return Err(e);
        }

        let run_loop = RunLoopSignal::new();
        let loop_signal = run_loop.clone();
        let source = Arc::clone(&self.source);

        let spawned = thread::Builder::new()
            .name("capture-run-loop".into())
            .spawn(move || source.run_loop(&loop_signal));

        match spawned {
            Ok(handle) => Ok(Binding {
                device,
                registration,
                run_loop,
                run_loop_thread: Some(handle),
            }),
            Err(e) => {
                self.release_registration(&device, &registration);
                if let Err(stop_err) = self.source.stop(&device, &registration) {
                    log::warn!("failed to stop device after run loop spawn failure: {}", stop_err);
                }
                Err(CaptureError::StartFailed(format!("failed to spawn run loop thread: {}", e)))
            }
        }
    }

    fn release_registration(&self, device: &DeviceHandle, registration: &RegistrationHandle) {
        if let Err(e) = self.source.destroy_registration(device, registration) {
            log::warn!("failed to release registration {}: {}", registration, e);
        }
    }

    fn log_device_metadata(&self, device: &DeviceHandle) {
        match self.source.device_info(device) {
            Ok(info) => log::info!(
                "device {}\t\t{}\t\t{}",
                info.name,
                info.manufacturer,
                info.unique_id
            ),
            Err(e) => log::warn!("could not get device name for {}: {}", device, e),
        }

        match self.source.stream_info(device) {
            Ok(stream) => log::info!(
                "stream for device {}: sample rate {}, format {}, {} channels",
                device,
                stream.sample_rate,
                stream.format_id,
                stream.channels
            ),
            Err(e) => log::warn!("failed to get info on stream for {}: {}", device, e),
        }
    }

    fn set_state(&mut self, state: SessionState) {
        log::debug!("capture session: {:?} -> {:?}", self.state, state);
        self.state = state;
    }
}

impl<S: AudioCaptureSource + 'static> Drop for DeviceSession<S> {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            log::error!("capture session teardown failed: {}", e);
        }
    }
}
