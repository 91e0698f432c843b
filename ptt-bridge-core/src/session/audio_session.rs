use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::audio_format::{PcmFormat, StreamConfig};
use crate::models::error::BridgeError;
use crate::models::state::{AudioSessionState, PlaybackDiagnostics};
use crate::traits::audio_output::{AudioOutputBackend, PcmStream};

/// One open playback endpoint plus its bookkeeping.
struct ActiveSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    config: StreamConfig,
    stream: Box<dyn PcmStream>,
    bytes_written: u64,
}

/// Owner of the single push-to-talk playback session.
///
/// Generic over the output device via `AudioOutputBackend`. All operations
/// take `&mut self`; callers that share the manager across threads wrap it
/// in a mutex.
///
/// ```text
/// start_audio_track → [backend stream, playing] ← write_audio(bytes)*
///                                 ↓
///                          stop_audio_track
/// ```
pub struct AudioSessionManager<B: AudioOutputBackend> {
    backend: B,
    format: PcmFormat,
    active: Option<ActiveSession>,
    diagnostics: PlaybackDiagnostics,
}

impl<B: AudioOutputBackend> AudioSessionManager<B> {
    /// Manager for the fixed voice format (8 kHz, mono, s16le).
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            format: PcmFormat::VOICE,
            active: None,
            diagnostics: PlaybackDiagnostics::default(),
        }
    }

    pub fn format(&self) -> PcmFormat {
        self.format
    }

    pub fn state(&self) -> AudioSessionState {
        match &self.active {
            Some(session) => AudioSessionState::Active {
                session_id: session.id,
                started_at: session.started_at,
                bytes_written: session.bytes_written,
            },
            None => AudioSessionState::Idle,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn diagnostics(&self) -> PlaybackDiagnostics {
        self.diagnostics.clone()
    }

    /// Configuration of the active stream, if any.
    pub fn stream_config(&self) -> Option<StreamConfig> {
        self.active.as_ref().map(|s| s.config)
    }

    /// Open a new streaming session and start playback.
    ///
    /// Transitions: idle → active, or active → active' (the previous session
    /// is stopped and released before the new one is opened). On error the
    /// manager is left idle.
    pub fn start_audio_track(&mut self) -> Result<(), BridgeError> {
        if self.active.is_some() {
            log::debug!("start requested while active, releasing previous session");
            self.release_active();
        }

        if !self.backend.is_available() {
            log::warn!("no output device available");
            return Err(BridgeError::DeviceNotAvailable);
        }

        let buffer_size = self.backend.min_buffer_size(&self.format)?;
        let config = StreamConfig::speech(self.format, buffer_size, self.backend.capabilities());

        let mut stream = self.backend.open_stream(&config)?;
        if let Err(e) = stream.play() {
            stream.release();
            return Err(e);
        }

        let session = ActiveSession {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            config,
            stream,
            bytes_written: 0,
        };
        log::info!(
            "audio session {} started ({} Hz, {} byte buffer, {:?})",
            session.id,
            config.format.sample_rate,
            config.buffer_size_bytes,
            config.route
        );

        self.active = Some(session);
        self.diagnostics.sessions_started += 1;
        Ok(())
    }

    /// Queue PCM bytes on the active session.
    ///
    /// Blocks while the device buffer is full. A no-op when idle. Write
    /// failures are logged and dropped.
    pub fn write_audio(&mut self, data: &[u8]) {
        let Some(session) = self.active.as_mut() else {
            self.diagnostics.writes_while_idle += 1;
            return;
        };

        match session.stream.write(data) {
            Ok(written) => {
                session.bytes_written += written as u64;
                self.diagnostics.bytes_written += written as u64;
                if written < data.len() {
                    log::warn!(
                        "audio session {} accepted {} of {} bytes",
                        session.id,
                        written,
                        data.len()
                    );
                }
            }
            Err(e) => {
                self.diagnostics.write_failures += 1;
                log::warn!("audio session {} write failed: {}", session.id, e);
            }
        }
    }

    /// Stop playback and release the session. Idempotent.
    pub fn stop_audio_track(&mut self) {
        if self.active.is_none() {
            log::debug!("stop requested with no active session");
            return;
        }
        self.release_active();
    }

    fn release_active(&mut self) {
        let Some(mut session) = self.active.take() else {
            return;
        };

        if let Err(e) = session.stream.stop() {
            log::warn!("audio session {} stop failed: {}", session.id, e);
        }
        session.stream.release();
        self.diagnostics.sessions_released += 1;

        log::info!(
            "audio session {} released after {} bytes",
            session.id,
            session.bytes_written
        );
    }
}

impl<B: AudioOutputBackend> Drop for AudioSessionManager<B> {
    fn drop(&mut self) {
        self.release_active();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::audio_format::{RouteHint, StreamType, TransferMode};
    use crate::test_support::FakeOutput;

    #[test]
    fn write_without_session_is_noop() {
        let output = FakeOutput::new();
        let log = output.log();
        let mut manager = AudioSessionManager::new(output);

        for len in [0usize, 1, 2, 3, 320, 4097] {
            manager.write_audio(&vec![0x55; len]);
        }

        assert!(manager.state().is_idle());
        assert_eq!(manager.diagnostics().writes_while_idle, 6);
        assert_eq!(log.lock().opened, 0);
        assert!(log.lock().written.is_empty());
    }

    #[test]
    fn stop_is_idempotent() {
        let output = FakeOutput::new();
        let log = output.log();
        let mut manager = AudioSessionManager::new(output);

        manager.stop_audio_track();
        manager.stop_audio_track();
        assert!(manager.state().is_idle());

        manager.start_audio_track().unwrap();
        manager.stop_audio_track();
        manager.stop_audio_track();

        assert!(manager.state().is_idle());
        assert_eq!(log.lock().released, 1);
        assert_eq!(log.lock().stopped, 1);
    }

    #[test]
    fn start_then_stop_without_writes() {
        let output = FakeOutput::new();
        let log = output.log();
        let mut manager = AudioSessionManager::new(output);

        manager.start_audio_track().unwrap();
        assert!(manager.is_active());
        assert_eq!(log.lock().played, 1);

        manager.stop_audio_track();
        assert!(!manager.is_active());
        assert_eq!(log.lock().live(), 0);
    }

    #[test]
    fn repeated_start_releases_previous_session() {
        let output = FakeOutput::new();
        let log = output.log();
        let mut manager = AudioSessionManager::new(output);

        manager.start_audio_track().unwrap();
        let first = manager.state().session_id().unwrap();
        manager.start_audio_track().unwrap();
        let second = manager.state().session_id().unwrap();

        assert_ne!(first, second);
        assert_eq!(log.lock().opened, 2);
        assert_eq!(log.lock().released, 1);
        assert_eq!(log.lock().live(), 1);
        // The old stream is gone before the new one opens.
        assert_eq!(log.lock().max_live, 1);

        let diag = manager.diagnostics();
        assert_eq!(diag.sessions_started, 2);
        assert_eq!(diag.sessions_released, 1);
    }

    #[test]
    fn writes_reach_the_stream_in_order() {
        let output = FakeOutput::new();
        let log = output.log();
        let mut manager = AudioSessionManager::new(output);

        manager.start_audio_track().unwrap();
        manager.write_audio(&[1, 2, 3]);
        manager.write_audio(&[]);
        manager.write_audio(&[4, 5]);

        assert_eq!(log.lock().written, vec![1, 2, 3, 4, 5]);
        match manager.state() {
            AudioSessionState::Active { bytes_written, .. } => assert_eq!(bytes_written, 5),
            other => panic!("unexpected state {:?}", other),
        }
        assert_eq!(manager.diagnostics().bytes_written, 5);
    }

    #[test]
    fn write_failure_is_swallowed() {
        let output = FakeOutput::new().failing_writes();
        let mut manager = AudioSessionManager::new(output);

        manager.start_audio_track().unwrap();
        manager.write_audio(&[0; 64]);

        assert!(manager.is_active());
        assert_eq!(manager.diagnostics().write_failures, 1);
        assert_eq!(manager.diagnostics().bytes_written, 0);
    }

    #[test]
    fn open_failure_leaves_manager_idle() {
        let output = FakeOutput::new().failing_open();
        let log = output.log();
        let mut manager = AudioSessionManager::new(output);

        assert!(matches!(
            manager.start_audio_track(),
            Err(BridgeError::DeviceNotAvailable)
        ));
        assert!(manager.state().is_idle());
        assert_eq!(log.lock().live(), 0);

        manager.write_audio(&[1, 2]);
        assert_eq!(manager.diagnostics().writes_while_idle, 1);
    }

    #[test]
    fn unavailable_device_is_not_opened() {
        let output = FakeOutput::new().unavailable();
        let log = output.log();
        let mut manager = AudioSessionManager::new(output);

        assert!(matches!(
            manager.start_audio_track(),
            Err(BridgeError::DeviceNotAvailable)
        ));
        assert!(manager.state().is_idle());
        assert_eq!(log.lock().opened, 0);
        assert_eq!(manager.diagnostics().sessions_started, 0);
    }

    #[test]
    fn stream_is_configured_for_streaming_speech() {
        let output = FakeOutput::new().with_min_buffer(640);
        let mut manager = AudioSessionManager::new(output);

        manager.start_audio_track().unwrap();
        let config = manager.stream_config().unwrap();
        assert_eq!(config.format, PcmFormat::VOICE);
        assert_eq!(config.buffer_size_bytes, 640);
        assert_eq!(config.transfer_mode, TransferMode::Stream);
    }

    #[test]
    fn legacy_backend_gets_music_stream_hint() {
        let output = FakeOutput::new().legacy();
        let mut manager = AudioSessionManager::new(output);

        manager.start_audio_track().unwrap();
        let config = manager.stream_config().unwrap();
        assert_eq!(config.route, RouteHint::LegacyStream(StreamType::Music));
        assert_eq!(config.format, PcmFormat::VOICE);
    }

    #[test]
    fn drop_releases_active_session() {
        let output = FakeOutput::new();
        let log = output.log();
        {
            let mut manager = AudioSessionManager::new(output);
            manager.start_audio_track().unwrap();
        }
        assert_eq!(log.lock().released, 1);
        assert_eq!(log.lock().live(), 0);
    }
}
