use std::panic::{self, AssertUnwindSafe};

use crate::models::error::InvocationFault;
use crate::models::peer::TransportPeer;
use crate::traits::profile::{ProfileControl, ProfileProxy};

/// Operations the audio-sink profile implements but does not publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HiddenOperation {
    Connect,
    Disconnect,
}

impl HiddenOperation {
    /// Name the operation is looked up by on the proxy.
    pub fn method_name(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
        }
    }

    /// Channel command that triggers the operation.
    pub fn command_name(&self) -> &'static str {
        match self {
            Self::Connect => "connectBluetoothAudio",
            Self::Disconnect => "disconnectBluetoothAudio",
        }
    }
}

/// `ProfileControl` backed by by-name invocation on a profile proxy.
///
/// Every fault, including a panicking proxy, is reported as `false`.
pub struct HiddenMethodControl<'a> {
    proxy: &'a dyn ProfileProxy,
}

impl<'a> HiddenMethodControl<'a> {
    pub fn new(proxy: &'a dyn ProfileProxy) -> Self {
        Self { proxy }
    }

    pub fn perform(&self, operation: HiddenOperation, peer: &TransportPeer) -> bool {
        let method = operation.method_name();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.proxy.invoke_hidden(method, peer)))
            .unwrap_or_else(|_| Err(InvocationFault::Runtime(format!("{} panicked", method))));

        match outcome {
            Ok(reported) => {
                log::debug!("{}({}) reported {}", method, peer.address, reported);
                reported
            }
            Err(fault) => {
                log::debug!("{}({}) folded to false: {}", method, peer.address, fault);
                false
            }
        }
    }
}

impl ProfileControl for HiddenMethodControl<'_> {
    fn connect(&self, peer: &TransportPeer) -> bool {
        self.perform(HiddenOperation::Connect, peer)
    }

    fn disconnect(&self, peer: &TransportPeer) -> bool {
        self.perform(HiddenOperation::Disconnect, peer)
    }
}
