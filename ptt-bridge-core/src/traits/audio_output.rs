use crate::models::audio_format::{OutputCapabilities, PcmFormat, StreamConfig};
use crate::models::error::BridgeError;

/// Interface for platform-specific PCM output devices.
///
/// Implemented by:
/// - `CpalOutput` (ptt-bridge-linux, `cpal-output` feature)
pub trait AudioOutputBackend: Send {
    /// Whether an output device is currently available.
    fn is_available(&self) -> bool;

    /// Which stream construction path this backend supports.
    fn capabilities(&self) -> OutputCapabilities;

    /// Smallest buffer, in bytes, the device accepts for `format`.
    fn min_buffer_size(&self, format: &PcmFormat) -> Result<usize, BridgeError>;

    /// Open a stream. The stream is created stopped; call `play` to start it.
    fn open_stream(&mut self, config: &StreamConfig) -> Result<Box<dyn PcmStream>, BridgeError>;
}

/// An open streaming playback endpoint.
///
/// A playing stream with no queued data outputs silence until more bytes
/// arrive.
pub trait PcmStream: Send {
    /// Begin consuming queued buffers.
    fn play(&mut self) -> Result<(), BridgeError>;

    /// Queue `data` for playback. May block while the device buffer is full.
    ///
    /// Returns the number of bytes accepted.
    fn write(&mut self, data: &[u8]) -> Result<usize, BridgeError>;

    /// Halt playback. Queued data may be discarded.
    fn stop(&mut self) -> Result<(), BridgeError>;

    /// Free the device resources. The stream is unusable afterwards.
    fn release(&mut self);
}
