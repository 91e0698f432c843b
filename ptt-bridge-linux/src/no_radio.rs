use ptt_bridge_core::models::error::BridgeError;
use ptt_bridge_core::models::peer::{ProfileKind, TransportPeer};
use ptt_bridge_core::traits::profile::ProfileProxy;
use ptt_bridge_core::traits::radio::{ProxyListener, RadioAdapter};

/// Adapter for hosts with no Bluetooth stack. Reports itself absent.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRadio;

impl RadioAdapter for NoRadio {
    fn is_present(&self) -> bool {
        false
    }

    fn is_enabled(&self) -> bool {
        false
    }

    fn bonded_devices(&self) -> Vec<TransportPeer> {
        Vec::new()
    }

    fn request_profile_proxy(
        &self,
        _profile: ProfileKind,
        _listener: ProxyListener,
    ) -> Result<(), BridgeError> {
        Err(BridgeError::DeviceNotAvailable)
    }

    fn close_profile_proxy(&self, _profile: ProfileKind, _proxy: Box<dyn ProfileProxy>) {}
}
