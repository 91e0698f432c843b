use serde::{Deserialize, Serialize};

/// Display name of the push-to-talk accessory.
pub const DEFAULT_PEER_NAME: &str = "BTPW";

/// Transport profile a proxy is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileKind {
    /// A2DP, the local side acting as audio source towards a sink.
    A2dpSink,
}

/// A wireless accessory known to the platform.
///
/// `address` is an opaque platform handle (MAC, object path, ...). Peers are
/// only ever matched by `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportPeer {
    pub name: String,
    pub address: String,
    pub bonded: bool,
    pub connected: bool,
}

impl TransportPeer {
    pub fn matches(&self, name: &str) -> bool {
        self.name == name
    }
}

/// First peer in `peers` whose display name is `name`.
pub fn find_by_name<'a>(peers: &'a [TransportPeer], name: &str) -> Option<&'a TransportPeer> {
    peers.iter().find(|p| p.matches(name))
}
