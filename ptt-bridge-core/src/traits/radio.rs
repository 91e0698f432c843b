use crate::models::error::BridgeError;
use crate::models::peer::{ProfileKind, TransportPeer};
use crate::models::state::RadioStatus;
use crate::traits::profile::ProfileProxy;

/// Callback invoked once when a requested profile proxy is connected.
///
/// May fire on any thread. Dropping it without calling it tells the caller
/// the bind failed.
pub type ProxyListener = Box<dyn FnOnce(ProfileKind, Box<dyn ProfileProxy>) + Send + 'static>;

/// Interface for the platform's wireless radio.
///
/// Implemented by:
/// - `BluezAdapter` (ptt-bridge-linux, Linux only)
pub trait RadioAdapter: Send + Sync {
    /// Whether the platform has a radio adapter at all.
    fn is_present(&self) -> bool;

    /// Whether the adapter is powered on.
    fn is_enabled(&self) -> bool;

    /// Peers previously paired and remembered by the platform.
    fn bonded_devices(&self) -> Vec<TransportPeer>;

    /// Presence, power and bonded peers in one reading.
    ///
    /// Backends where each query is a round trip should override this with
    /// a single snapshot. Bonded peers are only listed for a ready adapter.
    fn status(&self) -> RadioStatus {
        let present = self.is_present();
        let enabled = present && self.is_enabled();
        RadioStatus {
            present,
            enabled,
            bonded: if enabled { self.bonded_devices() } else { Vec::new() },
        }
    }

    /// Ask for a proxy to `profile`. Returns as soon as the request is
    /// issued; the proxy arrives later through `listener`.
    fn request_profile_proxy(
        &self,
        profile: ProfileKind,
        listener: ProxyListener,
    ) -> Result<(), BridgeError>;

    /// Release a proxy obtained from `request_profile_proxy`.
    fn close_profile_proxy(&self, profile: ProfileKind, proxy: Box<dyn ProfileProxy>);
}
