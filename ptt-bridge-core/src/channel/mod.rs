pub mod audio_channel;
pub mod method;
pub mod registry;
pub mod transport_channel;
