use std::collections::HashMap;
use std::sync::Arc;

use crate::channel::audio_channel::AudioTrackChannel;
use crate::channel::method::{MethodCall, MethodCallHandler, MethodResponse, Reply};
use crate::channel::transport_channel::TransportChannel;
use crate::models::config::BridgeConfiguration;
use crate::session::audio_session::AudioSessionManager;
use crate::traits::audio_output::AudioOutputBackend;
use crate::traits::radio::RadioAdapter;
use crate::transport::connector::ProfileConnector;

/// Routes method calls to the handler registered for their channel.
#[derive(Default)]
pub struct ChannelRegistry {
    handlers: HashMap<String, Arc<dyn MethodCallHandler>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bridge with only the audio track channel.
    pub fn audio_only<B>(config: &BridgeConfiguration, output: B) -> Self
    where
        B: AudioOutputBackend + 'static,
    {
        let mut registry = Self::new();
        registry.register(
            config.audio_channel.clone(),
            Arc::new(AudioTrackChannel::new(AudioSessionManager::new(output))),
        );
        registry
    }

    /// Bridge with the audio track channel and, unless disabled in
    /// `config`, the Bluetooth channel.
    pub fn with_transport<B, A>(config: &BridgeConfiguration, output: B, adapter: Arc<A>) -> Self
    where
        B: AudioOutputBackend + 'static,
        A: RadioAdapter + 'static,
    {
        let mut registry = Self::audio_only(config, output);
        if config.enable_transport {
            registry.register(
                config.transport_channel.clone(),
                Arc::new(TransportChannel::new(ProfileConnector::with_config(adapter, config))),
            );
        } else {
            log::info!("bluetooth channel disabled by configuration");
        }
        registry
    }

    /// Attach `handler` to `channel`, replacing any previous handler.
    pub fn register(&mut self, channel: impl Into<String>, handler: Arc<dyn MethodCallHandler>) {
        let channel = channel.into();
        log::debug!("registered channel {} ({:?})", channel, handler.methods());
        self.handlers.insert(channel, handler);
    }

    pub fn channels(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Deliver `call` to the handler for `channel`.
    ///
    /// Calls on unregistered channels answer `NotImplemented`.
    pub fn dispatch(&self, channel: &str, call: MethodCall, reply: Reply) {
        match self.handlers.get(channel) {
            Some(handler) => handler.on_method_call(call, reply),
            None => {
                log::debug!("no handler for channel {}", channel);
                reply(MethodResponse::not_implemented(call.method));
            }
        }
    }
}
