use crate::models::error::InvocationFault;
use crate::models::peer::{ProfileKind, TransportPeer};

/// Transient handle to a running profile service.
///
/// Obtained through `RadioAdapter::request_profile_proxy`, used for one
/// operation, then handed back with `RadioAdapter::close_profile_proxy`.
pub trait ProfileProxy: Send {
    fn profile(&self) -> ProfileKind;

    /// Peers the profile currently has a connection to.
    fn connected_devices(&self) -> Vec<TransportPeer>;

    /// Invoke an operation the profile does not publish in its stable
    /// interface, looked up by `method` name at runtime.
    ///
    /// Returns the boolean the operation reports. Lookup and call failures
    /// come back as `InvocationFault`.
    fn invoke_hidden(&self, method: &str, peer: &TransportPeer) -> Result<bool, InvocationFault>;
}

/// Stable connect/disconnect capability over a profile.
///
/// Implementations never fail: any fault is reported as `false`.
pub trait ProfileControl {
    fn connect(&self, peer: &TransportPeer) -> bool;

    fn disconnect(&self, peer: &TransportPeer) -> bool;
}
