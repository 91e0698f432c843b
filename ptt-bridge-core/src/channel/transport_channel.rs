use crate::channel::method::{MethodCall, MethodCallHandler, MethodResponse, Reply};
use crate::traits::radio::RadioAdapter;
use crate::transport::completion::ResultCallback;
use crate::transport::connector::ProfileConnector;

pub const IS_BLUETOOTH_AUDIO_CONNECTED: &str = "isBluetoothAudioConnected";
pub const CONNECT_BLUETOOTH_AUDIO: &str = "connectBluetoothAudio";
pub const DISCONNECT_BLUETOOTH_AUDIO: &str = "disconnectBluetoothAudio";

const METHODS: &[&str] = &[
    IS_BLUETOOTH_AUDIO_CONNECTED,
    CONNECT_BLUETOOTH_AUDIO,
    DISCONNECT_BLUETOOTH_AUDIO,
];

/// Bluetooth channel: forwards the three A2DP commands to the connector.
///
/// Replies are sent from whichever thread delivers the profile proxy.
pub struct TransportChannel<A: RadioAdapter + 'static> {
    connector: ProfileConnector<A>,
}

impl<A: RadioAdapter + 'static> TransportChannel<A> {
    pub fn new(connector: ProfileConnector<A>) -> Self {
        Self { connector }
    }

    pub fn connector(&self) -> &ProfileConnector<A> {
        &self.connector
    }
}

impl<A: RadioAdapter + 'static> MethodCallHandler for TransportChannel<A> {
    fn on_method_call(&self, call: MethodCall, reply: Reply) {
        let run: fn(&ProfileConnector<A>, ResultCallback) = match call.method.as_str() {
            IS_BLUETOOTH_AUDIO_CONNECTED => ProfileConnector::is_bluetooth_audio_connected,
            CONNECT_BLUETOOTH_AUDIO => ProfileConnector::connect_bluetooth_audio,
            DISCONNECT_BLUETOOTH_AUDIO => ProfileConnector::disconnect_bluetooth_audio,
            other => {
                reply(MethodResponse::not_implemented(other));
                return;
            }
        };

        run(
            &self.connector,
            Box::new(move |value| reply(MethodResponse::boolean(value))),
        );
    }

    fn methods(&self) -> &'static [&'static str] {
        METHODS
    }
}
