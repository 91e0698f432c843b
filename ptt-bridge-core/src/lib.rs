//! # ptt-bridge-core
//!
//! Platform-agnostic core of the push-to-talk bridge.
//!
//! Two independent state machines sit behind a method-channel dispatcher:
//! the PCM playback session (`AudioSessionManager`) and the A2DP profile
//! connection lifecycle (`ProfileConnector`). Platform backends implement
//! `AudioOutputBackend` and `RadioAdapter` and plug into both.
//!
//! ## Architecture
//!
//! ```text
//! ptt-bridge-core (this crate)
//! ├── traits/       ← AudioOutputBackend, PcmStream, RadioAdapter, ProfileProxy, ProfileControl
//! ├── models/       ← BridgeError, PcmFormat, StreamConfig, TransportPeer, BridgeConfiguration
//! ├── processing/   ← PcmQueue, Pcm16Decoder, RateConverter
//! ├── session/      ← AudioSessionManager
//! ├── transport/    ← ProfileConnector, ProfileBinding, Completion, HiddenMethodControl
//! └── channel/      ← MethodCall/MethodResponse, channel handlers, ChannelRegistry
//! ```

pub mod channel;
pub mod models;
pub mod processing;
pub mod session;
pub mod traits;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export key types at crate root for convenience.
pub use channel::audio_channel::AudioTrackChannel;
pub use channel::method::{CallArguments, MethodCall, MethodCallHandler, MethodResponse, Reply};
pub use channel::registry::ChannelRegistry;
pub use channel::transport_channel::TransportChannel;
pub use models::audio_format::{OutputCapabilities, PcmFormat, RouteHint, StreamConfig};
pub use models::config::{BridgeConfiguration, AUDIO_CHANNEL, TRANSPORT_CHANNEL};
pub use models::error::{BridgeError, InvocationFault};
pub use models::peer::{ProfileKind, TransportPeer, DEFAULT_PEER_NAME};
pub use models::state::{AudioSessionState, PlaybackDiagnostics, RadioStatus};
pub use processing::pcm::{Pcm16Decoder, RateConverter};
pub use processing::ring_buffer::PcmQueue;
pub use session::audio_session::AudioSessionManager;
pub use traits::audio_output::{AudioOutputBackend, PcmStream};
pub use traits::profile::{ProfileControl, ProfileProxy};
pub use traits::radio::{ProxyListener, RadioAdapter};
pub use transport::completion::ResultCallback;
pub use transport::connector::ProfileConnector;
