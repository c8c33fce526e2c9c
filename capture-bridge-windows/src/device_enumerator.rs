//! Capture endpoint lookup and metadata via the MMDevice API.
//!
//! Wraps `IMMDeviceEnumerator` to resolve the default capture endpoint and read
//! the diagnostic metadata the session logs at startup.

use windows::core::*;
use windows::Win32::Devices::FunctionDiscovery::*;
use windows::Win32::Media::Audio::*;
use windows::Win32::System::Com::StructuredStorage::PropVariantClear;
use windows::Win32::System::Com::*;
use windows::Win32::System::Variant::*;
use windows::Win32::UI::Shell::PropertiesSystem::PROPERTYKEY;

use capture_bridge_core::models::audio_models::{DeviceInfo, StreamInfo};

use crate::error::WasapiError;
use crate::format::{format_name, EXTENSIBLE_CB_SIZE, WAVE_FORMAT_EXTENSIBLE};

/// COM apartment for the current thread; uninitialized on drop.
pub struct ComScope {
    owns_init: bool,
}

impl ComScope {
    /// Join the multithreaded apartment.
    ///
    /// A thread already in an apartment keeps it and this scope does not
    /// uninitialize on drop.
    pub fn enter() -> std::result::Result<Self, WasapiError> {
        let hr = unsafe { CoInitializeEx(None, COINIT_MULTITHREADED) };
        if hr.is_ok() {
            Ok(Self { owns_init: true })
        } else if hr == RPC_E_CHANGED_MODE {
            Ok(Self { owns_init: false })
        } else {
            Err(WasapiError::com("CoInitializeEx", hr))
        }
    }
}

impl Drop for ComScope {
    fn drop(&mut self) {
        if self.owns_init {
            unsafe {
                CoUninitialize();
            }
        }
    }
}

/// Capture endpoint enumerator using the Windows MMDevice API.
pub struct DeviceEnumerator {
    enumerator: IMMDeviceEnumerator,
}

impl DeviceEnumerator {
    /// Create a new device enumerator.
    ///
    /// Requires COM to be initialized on the calling thread (see `ComScope`).
    pub fn new() -> std::result::Result<Self, WasapiError> {
        unsafe {
            let enumerator: IMMDeviceEnumerator =
                CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL)
                    .map_err(|e| WasapiError::com("CoCreateInstance(MMDeviceEnumerator)", e))?;
            Ok(Self { enumerator })
        }
    }

    /// Endpoint id of the default console capture device.
    pub fn default_capture_device_id(&self) -> std::result::Result<String, WasapiError> {
        unsafe {
            let device = self
                .enumerator
                .GetDefaultAudioEndpoint(eCapture, eConsole)
                .map_err(|_| WasapiError::NoDefaultEndpoint)?;

            let id = device.GetId().map_err(|e| WasapiError::com("IMMDevice::GetId", e))?;
            let id_string = id.to_string().unwrap_or_default();
            CoTaskMemFree(Some(id.0 as *const _));
            Ok(id_string)
        }
    }

    /// Resolve an endpoint id to its device.
    pub fn device(&self, id: &str) -> std::result::Result<IMMDevice, WasapiError> {
        let wide_id: Vec<u16> = id.encode_utf16().chain(std::iter::once(0)).collect();
        unsafe {
            self.enumerator
                .GetDevice(PCWSTR(wide_id.as_ptr()))
                .map_err(|e| WasapiError::com("IMMDeviceEnumerator::GetDevice", e))
        }
    }

    /// Friendly name, adapter name, and endpoint id of a device.
    pub fn device_info(&self, id: &str) -> std::result::Result<DeviceInfo, WasapiError> {
        let device = self.device(id)?;
        let name = read_string_property(&device, &PKEY_Device_FriendlyName)
            .unwrap_or_else(|| "Unknown Device".into());
        let manufacturer = read_string_property(&device, &PKEY_DeviceInterface_FriendlyName)
            .unwrap_or_else(|| "Unknown".into());

        Ok(DeviceInfo {
            name,
            manufacturer,
            unique_id: id.to_string(),
        })
    }

    /// Shared-mode mix format of a device.
    pub fn stream_info(&self, id: &str) -> std::result::Result<StreamInfo, WasapiError> {
        let device = self.device(id)?;
        unsafe {
            let audio_client: IAudioClient = device
                .Activate(CLSCTX_ALL, None)
                .map_err(|e| WasapiError::com("IMMDevice::Activate", e))?;

            let mix_format_ptr = audio_client
                .GetMixFormat()
                .map_err(|e| WasapiError::com("IAudioClient::GetMixFormat", e))?;

            let mix_format = &*mix_format_ptr;
            let info = StreamInfo {
                sample_rate: mix_format.nSamplesPerSec as f64,
                format_id: format_name(mix_format.wFormatTag, mix_format.wBitsPerSample),
                channels: u32::from(mix_format.nChannels),
            };

            CoTaskMemFree(Some(mix_format_ptr as *const _ as *const _));
            Ok(info)
        }
    }
}

/// `SubFormat` of an extensible mix format; `None` for a plain WAVEFORMATEX.
///
/// # Safety
/// `format` must point to a mix format returned by `IAudioClient::GetMixFormat`
/// that has not been freed yet.
pub unsafe fn sub_format(format: *const WAVEFORMATEX) -> Option<u128> {
    let header = &*format;
    if header.wFormatTag != WAVE_FORMAT_EXTENSIBLE || header.cbSize < EXTENSIBLE_CB_SIZE {
        return None;
    }
    let extensible = format as *const WAVEFORMATEXTENSIBLE;
    let guid = std::ptr::addr_of!((*extensible).SubFormat).read_unaligned();
    Some(guid.to_u128())
}

/// Read a string-valued property from a device's property store.
fn read_string_property(device: &IMMDevice, key: &PROPERTYKEY) -> Option<String> {
    unsafe {
        let store = device.OpenPropertyStore(STGM_READ).ok()?;

        let mut prop_variant = store.GetValue(key).ok()?;

        let value = if prop_variant.Anonymous.Anonymous.vt == VT_LPWSTR {
            let pwsz = prop_variant.Anonymous.Anonymous.Anonymous.pwszVal;
            if !pwsz.is_null() {
                pwsz.to_string().ok()
            } else {
                None
            }
        } else {
            None
        };

        PropVariantClear(&mut prop_variant).ok();
        value
    }
}
