//! WASAPI capture source for the default input endpoint.
//!
//! Opens the endpoint in shared mode and delivers Float32 transfer units to the
//! registered callback from a dedicated thread registered with MMCSS.

use std::collections::HashMap;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use windows::core::PCWSTR;
use windows::Win32::Media::Audio::*;
use windows::Win32::System::Com::*;
use windows::Win32::System::Threading::*;

use capture_bridge_core::models::audio_models::{
    AudioBuffer, DeviceHandle, DeviceInfo, RegistrationHandle, StreamInfo,
};
use capture_bridge_core::models::error::CaptureError;
use capture_bridge_core::traits::capture_source::{
    AudioCaptureSource, CaptureCallback, RunLoopSignal,
};

use crate::device_enumerator::{sub_format, ComScope, DeviceEnumerator};
use crate::error::WasapiError;
use crate::format::ensure_float32;
use crate::transfer::TransferUnitAssembler;

/// Callback slot shared with the capture thread. Deliveries hold the lock.
type CallbackSlot = Arc<Mutex<Option<CaptureCallback>>>;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Requested engine buffer: 100ms in 100-nanosecond units.
const BUFFER_DURATION: i64 = 1_000_000;

struct CaptureThread {
    signal: RunLoopSignal,
    handle: thread::JoinHandle<()>,
}

impl CaptureThread {
    fn halt(self) {
        self.signal.request_stop();
        if self.handle.join().is_err() {
            log::error!("WASAPI capture thread panicked");
        }
    }
}

struct Registration {
    callback: CallbackSlot,
    capture: Option<CaptureThread>,
}

/// WASAPI capture of the default input device.
#[derive(Default)]
pub struct WasapiInputSource {
    registrations: Mutex<HashMap<RegistrationHandle, Registration>>,
}

impl WasapiInputSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_enumerator<T>(
        f: impl FnOnce(&DeviceEnumerator) -> Result<T, WasapiError>,
    ) -> Result<T, WasapiError> {
        let _com = ComScope::enter()?;
        let enumerator = DeviceEnumerator::new()?;
        f(&enumerator)
    }

    fn spawn_capture(
        &self,
        device_id: String,
        callback: CallbackSlot,
    ) -> Result<CaptureThread, CaptureError> {
        let signal = RunLoopSignal::new();
        let thread_signal = signal.clone();
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<(), WasapiError>>(1);

        let handle = thread::Builder::new()
            .name("wasapi-input-capture".into())
            .spawn(move || {
                if let Err(e) = capture_loop(&device_id, &thread_signal, &callback, &ready_tx) {
                    log::error!("WASAPI capture error: {}", e);
                    let _ = ready_tx.try_send(Err(e));
                }
            })
            .map_err(|e| {
                CaptureError::StartFailed(format!("failed to spawn capture thread: {}", e))
            })?;

        let ready = ready_rx.recv().unwrap_or(Err(WasapiError::ThreadExited));
        match ready {
            Ok(()) => Ok(CaptureThread { signal, handle }),
            Err(e) => {
                signal.request_stop();
                let _ = handle.join();
                Err(CaptureError::StartFailed(e.to_string()))
            }
        }
    }
}

impl AudioCaptureSource for WasapiInputSource {
    fn default_input_device(&self) -> Option<DeviceHandle> {
        match Self::with_enumerator(|e| e.default_capture_device_id()) {
            Ok(id) => Some(DeviceHandle::new(id)),
            Err(e) => {
                log::error!("Error getting default input device: {}", e);
                None
            }
        }
    }

    fn register_capture_callback(
        &self,
        _device: &DeviceHandle,
        callback: CaptureCallback,
    ) -> Result<RegistrationHandle, CaptureError> {
        let handle = RegistrationHandle::new_v4();
        self.registrations.lock().insert(
            handle,
            Registration {
                callback: Arc::new(Mutex::new(Some(callback))),
                capture: None,
            },
        );
        Ok(handle)
    }

    fn start(
        &self,
        device: &DeviceHandle,
        registration: &RegistrationHandle,
    ) -> Result<(), CaptureError> {
        let mut registrations = self.registrations.lock();
        let entry = registrations
            .get_mut(registration)
            .ok_or_else(|| {
                CaptureError::StartFailed(format!("unknown registration {}", registration))
            })?;
        if entry.capture.is_some() {
            return Err(CaptureError::StartFailed("input capture already running".into()));
        }
        let capture = self.spawn_capture(device.id().to_string(), Arc::clone(&entry.callback))?;
        entry.capture = Some(capture);
        Ok(())
    }

    fn stop(
        &self,
        _device: &DeviceHandle,
        registration: &RegistrationHandle,
    ) -> Result<(), CaptureError> {
        let capture = {
            let mut registrations = self.registrations.lock();
            let Some(entry) = registrations.get_mut(registration) else {
                return Ok(());
            };
            let capture = entry.capture.take();
            if entry.callback.lock().is_none() {
                registrations.remove(registration);
            }
            capture
        };
        if let Some(capture) = capture {
            capture.halt();
        }
        Ok(())
    }

    fn destroy_registration(
        &self,
        _device: &DeviceHandle,
        registration: &RegistrationHandle,
    ) -> Result<(), CaptureError> {
        let mut registrations = self.registrations.lock();
        let entry = registrations
            .get_mut(registration)
            .ok_or_else(|| {
                CaptureError::Backend(format!("unknown registration {}", registration))
            })?;

        entry.callback.lock().take();
        if entry.capture.is_none() {
            registrations.remove(registration);
        }
        Ok(())
    }

    fn device_info(&self, device: &DeviceHandle) -> Result<DeviceInfo, CaptureError> {
        Ok(Self::with_enumerator(|e| e.device_info(device.id()))?)
    }

    fn stream_info(&self, device: &DeviceHandle) -> Result<StreamInfo, CaptureError> {
        Ok(Self::with_enumerator(|e| e.stream_info(device.id()))?)
    }
}

impl Drop for WasapiInputSource {
    fn drop(&mut self) {
        let threads: Vec<CaptureThread> = self
            .registrations
            .get_mut()
            .drain()
            .filter_map(|(_, mut entry)| entry.capture.take())
            .collect();
        for capture in threads {
            capture.halt();
        }
    }
}

/// Capture loop running on the dedicated thread.
///
/// Sequence:
/// 1. CoInitializeEx (MTA)
/// 2. Resolve the endpoint by id
/// 3. Activate IAudioClient, check the mix format is 32-bit IEEE float
/// 4. Initialize in shared mode
/// 5. Get IAudioCaptureClient service
/// 6. Register with MMCSS for real-time priority
/// 7. Start, report readiness, poll packets until signalled
fn capture_loop(
    device_id: &str,
    signal: &RunLoopSignal,
    callback: &CallbackSlot,
    ready: &mpsc::SyncSender<Result<(), WasapiError>>,
) -> Result<(), WasapiError> {
    let _com = ComScope::enter()?;
    let enumerator = DeviceEnumerator::new()?;
    let device = enumerator.device(device_id)?;

    unsafe {
        let audio_client: IAudioClient = device
            .Activate(CLSCTX_ALL, None)
            .map_err(|e| WasapiError::com("IMMDevice::Activate", e))?;

        let mix_format_ptr = audio_client
            .GetMixFormat()
            .map_err(|e| WasapiError::com("IAudioClient::GetMixFormat", e))?;

        let mix_format = &*mix_format_ptr;
        let channels = mix_format.nChannels as usize;
        let checked = ensure_float32(
            mix_format.wFormatTag,
            mix_format.wBitsPerSample,
            sub_format(mix_format_ptr),
        );
        if let Err(e) = checked {
            CoTaskMemFree(Some(mix_format_ptr as *const _ as *const _));
            return Err(e);
        }

        let initialized = audio_client.Initialize(
            AUDCLNT_SHAREMODE_SHARED,
            AUDCLNT_STREAMFLAGS_NOPERSIST,
            BUFFER_DURATION,
            0,
            mix_format,
            None,
        );
        CoTaskMemFree(Some(mix_format_ptr as *const _ as *const _));
        initialized.map_err(|e| WasapiError::com("IAudioClient::Initialize", e))?;

        let capture_client: IAudioCaptureClient = audio_client
            .GetService()
            .map_err(|e| WasapiError::com("IAudioClient::GetService", e))?;

        let mut task_index: u32 = 0;
        let task_name: Vec<u16> = "Pro Audio\0".encode_utf16().collect();
        let _mmcss_handle =
            AvSetMmThreadCharacteristicsW(PCWSTR(task_name.as_ptr()), &mut task_index);

        audio_client
            .Start()
            .map_err(|e| WasapiError::com("IAudioClient::Start", e))?;

        let _ = ready.try_send(Ok(()));

        let mut assembler = TransferUnitAssembler::new();
        let result = poll_packets(&capture_client, channels, signal, callback, &mut assembler);

        let _ = audio_client.Stop();
        result
    }
}

/// Drain packets every `POLL_INTERVAL` until `signal` is raised.
unsafe fn poll_packets(
    capture_client: &IAudioCaptureClient,
    channels: usize,
    signal: &RunLoopSignal,
    callback: &CallbackSlot,
    assembler: &mut TransferUnitAssembler,
) -> Result<(), WasapiError> {
    while !signal.wait_timeout(POLL_INTERVAL) {
        let mut packet_length = capture_client
            .GetNextPacketSize()
            .map_err(|e| WasapiError::com("IAudioCaptureClient::GetNextPacketSize", e))?;

        while packet_length > 0 {
            let mut buffer_ptr: *mut u8 = std::ptr::null_mut();
            let mut num_frames: u32 = 0;
            let mut flags: u32 = 0;

            capture_client
                .GetBuffer(&mut buffer_ptr, &mut num_frames, &mut flags, None, None)
                .map_err(|e| WasapiError::com("IAudioCaptureClient::GetBuffer", e))?;

            if num_frames > 0 {
                if flags & (AUDCLNT_BUFFERFLAGS_SILENT.0 as u32) != 0 || buffer_ptr.is_null() {
                    assembler.push_silence(num_frames as usize);
                } else {
                    let total_samples = num_frames as usize * channels;
                    let samples =
                        std::slice::from_raw_parts(buffer_ptr as *const f32, total_samples);
                    assembler.push_interleaved(samples, channels);
                }
            }

            capture_client
                .ReleaseBuffer(num_frames)
                .map_err(|e| WasapiError::com("IAudioCaptureClient::ReleaseBuffer", e))?;

            assembler.drain_units(|bytes| {
                let slot = callback.lock();
                if let Some(cb) = slot.as_ref() {
                    cb(&[AudioBuffer::new(1, bytes)]);
                }
            });

            packet_length = capture_client
                .GetNextPacketSize()
                .map_err(|e| WasapiError::com("IAudioCaptureClient::GetNextPacketSize", e))?;
        }
    }
    Ok(())
}
