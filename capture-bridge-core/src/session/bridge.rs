use std::sync::Arc;

use crate::models::audio_models::{BridgeDiagnostics, StereoSample};
use crate::models::config::BridgeSettings;
use crate::models::error::CaptureError;
use crate::models::state::SessionState;
use crate::processing::capture_handler::CaptureHandler;
use crate::processing::frame_reader::FrameReader;
use crate::processing::sample_pool::SampleBufferPool;
use crate::session::device_session::DeviceSession;
use crate::traits::capture_source::AudioCaptureSource;
use crate::traits::pcm_source::PcmSource;

/// Capture bridge: one device session feeding one frame reader.
///
/// ```text
/// [AudioCaptureSource] → [CaptureHandler] → [SampleBufferPool] → [FrameReader] → consumer
/// ```
///
/// The session is started on construction. If it cannot start, the bridge stays
/// usable and every `read` reports "no data". Dropping the bridge tears the
/// session down before the pool is released.
pub struct CaptureBridge<S: AudioCaptureSource + 'static> {
    settings: BridgeSettings,
    pool: Arc<SampleBufferPool>,
    handler: Arc<CaptureHandler>,
    reader: FrameReader,
    session: DeviceSession<S>,
}

impl<S: AudioCaptureSource + 'static> CaptureBridge<S> {
    pub fn new(settings: &BridgeSettings, source: S) -> Self {
        if !settings.capture_endpoint.is_empty() {
            log::info!("capture endpoint: {}", settings.capture_endpoint);
        }

        let pool = Arc::new(SampleBufferPool::new(settings.max_queue_depth));
        let handler = Arc::new(CaptureHandler::new(Arc::clone(&pool)));
        let reader = FrameReader::with_settings(Arc::clone(&pool), settings);
        let mut session = DeviceSession::new(source);

        // Failure is already logged and recorded in the session state.
        let _ = session.start(Arc::clone(&handler).into_callback());

        Self {
            settings: settings.clone(),
            pool,
            handler,
            reader,
            session,
        }
    }

    /// Like `new`, but fails if the device session cannot start.
    pub fn try_new(settings: &BridgeSettings, source: S) -> Result<Self, CaptureError> {
        settings.validate().map_err(CaptureError::ConfigurationFailed)?;
        let bridge = Self::new(settings, source);
        if let SessionState::Failed(e) = bridge.session.state() {
            return Err(e.clone());
        }
        Ok(bridge)
    }

    pub fn settings(&self) -> &BridgeSettings {
        &self.settings
    }

    pub fn session_state(&self) -> &SessionState {
        self.session.state()
    }

    pub fn is_running(&self) -> bool {
        self.session.is_running()
    }

    pub fn source(&self) -> &S {
        self.session.source()
    }

    /// Stop capture now instead of at drop. Queued blocks stay readable.
    pub fn shutdown(&mut self) -> Result<(), CaptureError> {
        self.session.shutdown()
    }

    pub fn diagnostics(&self) -> BridgeDiagnostics {
        BridgeDiagnostics {
            callback_count: self.handler.callback_count(),
            samples_received: self.handler.samples_received(),
            queue_depth: self.pool.len(),
            overflow_flushes: self.pool.overflow_flushes(),
            blocks_dropped: self.pool.blocks_dropped(),
            blocks_delivered: self.reader.blocks_delivered(),
            frames_delivered: self.reader.frames_delivered(),
            levels: self.reader.last_levels(),
            started_at: self.session.started_at(),
        }
    }
}

impl<S: AudioCaptureSource + 'static> PcmSource for CaptureBridge<S> {
    fn read(&mut self, buffer: &mut [StereoSample], frame_count: u32) -> bool {
        self.reader.read(buffer, frame_count)
    }
}

impl<S: AudioCaptureSource + 'static> Drop for CaptureBridge<S> {
    fn drop(&mut self) {
        if let Err(e) = self.session.shutdown() {
            log::error!("capture bridge teardown failed: {}", e);
        }
    }
}
