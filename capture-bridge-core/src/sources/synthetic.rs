//! Software capture source that plays a sine tone through the capture path.
//!
//! Behaves like a hardware device: once started, a dedicated clock thread
//! delivers one transfer unit of `f32` samples per period to the registered
//! callback. Useful on machines with no input device and in tests.

use std::collections::HashMap;
use std::f64::consts::TAU;
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use crate::models::audio_models::{
    AudioBuffer, DeviceHandle, DeviceInfo, RegistrationHandle, StreamInfo, TRANSFER_UNIT,
};
use crate::models::config::SyntheticConfig;
use crate::models::error::CaptureError;
use crate::traits::capture_source::{AudioCaptureSource, CaptureCallback, RunLoopSignal};

const DEVICE_ID: &str = "synthetic-tone";

/// Callback slot shared with the clock thread. Invocations hold the lock.
type CallbackSlot = Arc<Mutex<Option<CaptureCallback>>>;

struct DeviceClock {
    signal: RunLoopSignal,
    handle: thread::JoinHandle<()>,
}

impl DeviceClock {
    fn halt(self) {
        self.signal.request_stop();
        if self.handle.join().is_err() {
            log::error!("synthetic device clock panicked");
        }
    }
}

struct Registration {
    callback: CallbackSlot,
    clock: Option<DeviceClock>,
}

/// Sine-tone capture source.
pub struct SyntheticSource {
    config: SyntheticConfig,
    device: DeviceHandle,
    registrations: Mutex<HashMap<RegistrationHandle, Registration>>,
}

impl SyntheticSource {
    pub fn new(config: SyntheticConfig) -> Result<Self, CaptureError> {
        config.validate().map_err(CaptureError::ConfigurationFailed)?;
        Ok(Self {
            config,
            device: DeviceHandle::new(DEVICE_ID),
            registrations: Mutex::new(HashMap::new()),
        })
    }

    /// Number of live registrations.
    pub fn registration_count(&self) -> usize {
        self.registrations.lock().len()
    }

    fn check_device(&self, device: &DeviceHandle) -> Result<(), CaptureError> {
        if *device == self.device {
            Ok(())
        } else {
            Err(CaptureError::DeviceNotAvailable)
        }
    }

    fn spawn_clock(&self, callback: CallbackSlot) -> Result<DeviceClock, CaptureError> {
        let signal = RunLoopSignal::new();
        let clock_signal = signal.clone();
        let config = self.config.clone();

        let handle = thread::Builder::new()
            .name("synthetic-device-clock".into())
            .spawn(move || {
                let mut tone = ToneGenerator::new(&config);
                let mut bytes = Vec::with_capacity(TRANSFER_UNIT * 4);
                while !clock_signal.wait_timeout(config.period()) {
                    tone.fill_bytes(&mut bytes);
                    let slot = callback.lock();
                    if let Some(cb) = slot.as_ref() {
                        cb(&[AudioBuffer::new(1, &bytes)]);
                    }
                }
            })
            .map_err(|e| {
                CaptureError::StartFailed(format!("failed to spawn device clock: {}", e))
            })?;

        Ok(DeviceClock { signal, handle })
    }
}

impl AudioCaptureSource for SyntheticSource {
    fn default_input_device(&self) -> Option<DeviceHandle> {
        Some(self.device.clone())
    }

    fn register_capture_callback(
        &self,
        device: &DeviceHandle,
        callback: CaptureCallback,
    ) -> Result<RegistrationHandle, CaptureError> {
        self.check_device(device)?;
        let handle = RegistrationHandle::new_v4();
        self.registrations.lock().insert(
            handle,
            Registration {
                callback: Arc::new(Mutex::new(Some(callback))),
                clock: None,
            },
        );
        Ok(handle)
    }

    fn start(
        &self,
        device: &DeviceHandle,
        registration: &RegistrationHandle,
    ) -> Result<(), CaptureError> {
        self.check_device(device)?;
        let mut registrations = self.registrations.lock();
        let entry = registrations
            .get_mut(registration)
            .ok_or_else(|| {
                CaptureError::StartFailed(format!("unknown registration {}", registration))
            })?;
        if entry.clock.is_some() {
            return Err(CaptureError::StartFailed("device already started".into()));
        }
        entry.clock = Some(self.spawn_clock(Arc::clone(&entry.callback))?);
        Ok(())
    }

    fn stop(
        &self,
        device: &DeviceHandle,
        registration: &RegistrationHandle,
    ) -> Result<(), CaptureError> {
        self.check_device(device)?;
        let clock = {
            let mut registrations = self.registrations.lock();
            let Some(entry) = registrations.get_mut(registration) else {
                return Ok(());
            };
            let clock = entry.clock.take();
            if entry.callback.lock().is_none() {
                registrations.remove(registration);
            }
            clock
        };
        if let Some(clock) = clock {
            clock.halt();
        }
        Ok(())
    }

    fn destroy_registration(
        &self,
        device: &DeviceHandle,
        registration: &RegistrationHandle,
    ) -> Result<(), CaptureError> {
        self.check_device(device)?;
        let mut registrations = self.registrations.lock();
        let entry = registrations
            .get_mut(registration)
            .ok_or_else(|| {
                CaptureError::Backend(format!("unknown registration {}", registration))
            })?;

        // Waits for an in-flight delivery to finish.
        entry.callback.lock().take();

        if entry.clock.is_none() {
            registrations.remove(registration);
        }
        Ok(())
    }

    fn run_loop(&self, signal: &RunLoopSignal) {
        signal.wait();
    }

    fn device_info(&self, device: &DeviceHandle) -> Result<DeviceInfo, CaptureError> {
        self.check_device(device)?;
        Ok(DeviceInfo {
            name: "Synthetic Tone".into(),
            manufacturer: "capture-bridge".into(),
            unique_id: self.device.id().to_string(),
        })
    }

    fn stream_info(&self, device: &DeviceHandle) -> Result<StreamInfo, CaptureError> {
        self.check_device(device)?;
        Ok(StreamInfo {
            sample_rate: self.config.sample_rate,
            format_id: "lpcm-f32".into(),
            channels: 1,
        })
    }
}

impl Drop for SyntheticSource {
    fn drop(&mut self) {
        let clocks: Vec<DeviceClock> = self
            .registrations
            .get_mut()
            .drain()
            .filter_map(|(_, mut entry)| entry.clock.take())
            .collect();
        for clock in clocks {
            clock.halt();
        }
    }
}

/// Phase-continuous sine generator producing one transfer unit per call.
struct ToneGenerator {
    phase: f64,
    step: f64,
    amplitude: f32,
}

impl ToneGenerator {
    fn new(config: &SyntheticConfig) -> Self {
        Self {
            phase: 0.0,
            step: TAU * f64::from(config.frequency) / config.sample_rate,
            amplitude: config.amplitude,
        }
    }

    fn fill_bytes(&mut self, bytes: &mut Vec<u8>) {
        bytes.clear();
        for _ in 0..TRANSFER_UNIT {
            let sample = self.amplitude * self.phase.sin() as f32;
            bytes.extend_from_slice(&sample.to_ne_bytes());
            self.phase = (self.phase + self.step) % TAU;
        }
    }
}
