use parking_lot::Mutex;

use crate::channel::method::{MethodCall, MethodCallHandler, MethodResponse, Reply};
use crate::models::error::BridgeError;
use crate::models::state::{AudioSessionState, PlaybackDiagnostics};
use crate::session::audio_session::AudioSessionManager;
use crate::traits::audio_output::AudioOutputBackend;

pub const START_AUDIO_TRACK: &str = "startAudioTrack";
pub const WRITE_AUDIO: &str = "writeAudio";
pub const STOP_AUDIO_TRACK: &str = "stopAudioTrack";

const METHODS: &[&str] = &[START_AUDIO_TRACK, WRITE_AUDIO, STOP_AUDIO_TRACK];

/// Audio track channel: forwards start/write/stop to the session manager.
///
/// The mutex serializes callers; a blocked `writeAudio` holds it until the
/// device accepts the data.
pub struct AudioTrackChannel<B: AudioOutputBackend> {
    manager: Mutex<AudioSessionManager<B>>,
}

impl<B: AudioOutputBackend> AudioTrackChannel<B> {
    pub fn new(manager: AudioSessionManager<B>) -> Self {
        Self {
            manager: Mutex::new(manager),
        }
    }

    pub fn state(&self) -> AudioSessionState {
        self.manager.lock().state()
    }

    pub fn diagnostics(&self) -> PlaybackDiagnostics {
        self.manager.lock().diagnostics()
    }

    fn handle(&self, call: &MethodCall) -> MethodResponse {
        match call.method.as_str() {
            START_AUDIO_TRACK => match self.manager.lock().start_audio_track() {
                Ok(()) => MethodResponse::null(),
                Err(e) => {
                    log::error!("{} failed: {}", START_AUDIO_TRACK, e);
                    MethodResponse::error("AUDIO_START_FAILED", e.to_string())
                }
            },
            WRITE_AUDIO => match call.arguments.as_bytes() {
                Some(bytes) => {
                    self.manager.lock().write_audio(bytes);
                    MethodResponse::null()
                }
                None => {
                    let e = BridgeError::InvalidArgument(format!("{} expects a byte buffer", WRITE_AUDIO));
                    MethodResponse::error("INVALID_ARGUMENT", e.to_string())
                }
            },
            STOP_AUDIO_TRACK => {
                self.manager.lock().stop_audio_track();
                MethodResponse::null()
            }
            other => MethodResponse::not_implemented(other),
        }
    }
}

impl<B: AudioOutputBackend> MethodCallHandler for AudioTrackChannel<B> {
    fn on_method_call(&self, call: MethodCall, reply: Reply) {
        reply(self.handle(&call));
    }

    fn methods(&self) -> &'static [&'static str] {
        METHODS
    }
}
