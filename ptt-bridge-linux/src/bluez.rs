//! BlueZ radio adapter over the system D-Bus.
//!
//! BlueZ publishes no stable "connect A2DP" call on its profile objects, so
//! connect and disconnect go through `org.bluez.Device1.ConnectProfile` /
//! `DisconnectProfile`, looked up by name on the peer's object path with the
//! A2DP sink UUID as argument.

use std::collections::HashMap;
use std::thread;

use zbus::blocking::{Connection, Proxy};
use zbus::zvariant::{OwnedObjectPath, OwnedValue, Value};

use ptt_bridge_core::models::error::{BridgeError, InvocationFault};
use ptt_bridge_core::models::peer::{ProfileKind, TransportPeer};
use ptt_bridge_core::models::state::RadioStatus;
use ptt_bridge_core::traits::profile::ProfileProxy;
use ptt_bridge_core::traits::radio::{ProxyListener, RadioAdapter};

const BLUEZ_SERVICE: &str = "org.bluez";
const ADAPTER_IFACE: &str = "org.bluez.Adapter1";
const DEVICE_IFACE: &str = "org.bluez.Device1";
const OBJECT_MANAGER_IFACE: &str = "org.freedesktop.DBus.ObjectManager";

/// Service class UUID of the A2DP audio sink role.
pub const A2DP_SINK_UUID: &str = "0000110b-0000-1000-8000-00805f9b34fb";

type Properties = HashMap<String, OwnedValue>;
type ManagedObjects = HashMap<OwnedObjectPath, HashMap<String, Properties>>;

fn managed_objects(connection: &Connection) -> zbus::Result<ManagedObjects> {
    let proxy = Proxy::new(connection, BLUEZ_SERVICE, "/", OBJECT_MANAGER_IFACE)?;
    proxy.call("GetManagedObjects", &())
}

fn string_prop(props: &Properties, key: &str) -> Option<String> {
    match props.get(key).map(|v| &**v) {
        Some(Value::Str(s)) => Some(s.as_str().to_owned()),
        _ => None,
    }
}

fn bool_prop(props: &Properties, key: &str) -> bool {
    matches!(props.get(key).map(|v| &**v), Some(Value::Bool(true)))
}

fn uuids_prop(props: &Properties) -> Vec<String> {
    match props.get("UUIDs").map(|v| &**v) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::Str(s) => Some(s.as_str().to_owned()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// The parts of an `org.bluez.Device1` object the adapter cares about.
#[derive(Debug, Clone, PartialEq)]
struct DeviceRecord {
    path: String,
    name: Option<String>,
    paired: bool,
    connected: bool,
    uuids: Vec<String>,
}

impl DeviceRecord {
    fn from_properties(path: &OwnedObjectPath, props: &Properties) -> Self {
        Self {
            path: path.as_str().to_owned(),
            name: string_prop(props, "Name").or_else(|| string_prop(props, "Alias")),
            paired: bool_prop(props, "Paired"),
            connected: bool_prop(props, "Connected"),
            uuids: uuids_prop(props),
        }
    }

    /// Devices that have not advertised services yet are given the benefit
    /// of the doubt.
    fn offers_a2dp_sink(&self) -> bool {
        self.uuids.is_empty() || self.uuids.iter().any(|u| u.eq_ignore_ascii_case(A2DP_SINK_UUID))
    }

    /// Peer handle; `address` carries the D-Bus object path.
    fn to_peer(&self) -> Option<TransportPeer> {
        Some(TransportPeer {
            name: self.name.clone()?,
            address: self.path.clone(),
            bonded: self.paired,
            connected: self.connected,
        })
    }
}

fn device_records(objects: &ManagedObjects) -> Vec<DeviceRecord> {
    let mut records: Vec<DeviceRecord> = objects
        .iter()
        .filter_map(|(path, interfaces)| {
            interfaces
                .get(DEVICE_IFACE)
                .map(|props| DeviceRecord::from_properties(path, props))
        })
        .collect();
    // HashMap order is arbitrary; keep name lookups deterministic.
    records.sort_by(|a, b| a.path.cmp(&b.path));
    records
}

fn bonded_peers(records: &[DeviceRecord]) -> Vec<TransportPeer> {
    records
        .iter()
        .filter(|r| r.paired)
        .filter_map(DeviceRecord::to_peer)
        .collect()
}

fn connected_sink_peers(records: &[DeviceRecord]) -> Vec<TransportPeer> {
    records
        .iter()
        .filter(|r| r.connected && r.offers_a2dp_sink())
        .filter_map(DeviceRecord::to_peer)
        .collect()
}

/// `Powered` of the first adapter object, if there is one.
fn adapter_powered(objects: &ManagedObjects) -> Option<bool> {
    let mut adapters: Vec<_> = objects
        .iter()
        .filter_map(|(path, ifaces)| ifaces.get(ADAPTER_IFACE).map(|props| (path, props)))
        .collect();
    adapters.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));
    adapters.first().map(|(_, props)| bool_prop(props, "Powered"))
}

fn radio_status(powered: Option<bool>, records: &[DeviceRecord]) -> RadioStatus {
    match powered {
        None => RadioStatus::default(),
        Some(enabled) => RadioStatus {
            present: true,
            enabled,
            bonded: if enabled { bonded_peers(records) } else { Vec::new() },
        },
    }
}

/// `Device1` member backing a hidden operation name.
fn device_member(method: &str) -> Option<&'static str> {
    match method {
        "connect" => Some("ConnectProfile"),
        "disconnect" => Some("DisconnectProfile"),
        _ => None,
    }
}

/// Map a D-Bus error reply for `method` onto the hidden-operation result.
fn classify_error(method: &str, error_name: &str, detail: &str) -> Result<bool, InvocationFault> {
    match error_name {
        "org.bluez.Error.AlreadyConnected" if method == "connect" => Ok(true),
        "org.bluez.Error.NotConnected" if method == "disconnect" => Ok(false),
        "org.freedesktop.DBus.Error.UnknownMethod" | "org.freedesktop.DBus.Error.UnknownInterface" => {
            Err(InvocationFault::MethodMissing(format!("{}: {}", method, detail)))
        }
        "org.freedesktop.DBus.Error.AccessDenied"
        | "org.bluez.Error.NotAuthorized"
        | "org.bluez.Error.NotPermitted" => Err(InvocationFault::AccessDenied(detail.to_owned())),
        other => Err(InvocationFault::Runtime(format!("{}: {}", other, detail))),
    }
}

/// BlueZ adapter on the system bus.
///
/// Without a system bus connection it reports itself absent.
pub struct BluezAdapter {
    connection: Option<Connection>,
}

impl BluezAdapter {
    /// Connect to the system bus.
    pub fn system() -> Self {
        match Connection::system() {
            Ok(connection) => Self::with_connection(connection),
            Err(e) => {
                log::warn!("system bus unavailable, bluetooth disabled: {}", e);
                Self { connection: None }
            }
        }
    }

    pub fn with_connection(connection: Connection) -> Self {
        Self {
            connection: Some(connection),
        }
    }

    fn objects(&self) -> Option<ManagedObjects> {
        let connection = self.connection.as_ref()?;
        match managed_objects(connection) {
            Ok(objects) => Some(objects),
            Err(e) => {
                log::debug!("GetManagedObjects failed: {}", e);
                None
            }
        }
    }
}

impl RadioAdapter for BluezAdapter {
    fn is_present(&self) -> bool {
        self.objects().and_then(|objects| adapter_powered(&objects)).is_some()
    }

    fn is_enabled(&self) -> bool {
        self.objects()
            .and_then(|objects| adapter_powered(&objects))
            .unwrap_or(false)
    }

    fn bonded_devices(&self) -> Vec<TransportPeer> {
        self.objects()
            .map(|objects| bonded_peers(&device_records(&objects)))
            .unwrap_or_default()
    }

    /// One `GetManagedObjects` round trip for the whole reading.
    fn status(&self) -> RadioStatus {
        match self.objects() {
            Some(objects) => radio_status(adapter_powered(&objects), &device_records(&objects)),
            None => RadioStatus::default(),
        }
    }

    fn request_profile_proxy(
        &self,
        profile: ProfileKind,
        listener: ProxyListener,
    ) -> Result<(), BridgeError> {
        let connection = self
            .connection
            .clone()
            .ok_or(BridgeError::DeviceNotAvailable)?;

        thread::Builder::new()
            .name("bluez-profile-bind".into())
            .spawn(move || match BluezA2dpProxy::bind(connection, profile) {
                Ok(proxy) => listener(profile, Box::new(proxy)),
                // Dropping the listener reports the failed bind.
                Err(e) => log::warn!("{:?} bind failed: {}", profile, e),
            })
            .map(|_| ())
            .map_err(|e| BridgeError::BindFailed(format!("failed to spawn bind thread: {}", e)))
    }

    fn close_profile_proxy(&self, profile: ProfileKind, proxy: Box<dyn ProfileProxy>) {
        log::debug!("closing {:?} proxy", profile);
        drop(proxy);
    }
}

/// A2DP view over BlueZ, valid while the service answers on the bus.
pub struct BluezA2dpProxy {
    connection: Connection,
    profile: ProfileKind,
}

impl BluezA2dpProxy {
    fn bind(connection: Connection, profile: ProfileKind) -> zbus::Result<Self> {
        // A round trip proves the service is up before the proxy is handed out.
        managed_objects(&connection)?;
        Ok(Self { connection, profile })
    }
}

impl ProfileProxy for BluezA2dpProxy {
    fn profile(&self) -> ProfileKind {
        self.profile
    }

    fn connected_devices(&self) -> Vec<TransportPeer> {
        match managed_objects(&self.connection) {
            Ok(objects) => connected_sink_peers(&device_records(&objects)),
            Err(e) => {
                log::debug!("GetManagedObjects failed: {}", e);
                Vec::new()
            }
        }
    }

    fn invoke_hidden(&self, method: &str, peer: &TransportPeer) -> Result<bool, InvocationFault> {
        let member = device_member(method)
            .ok_or_else(|| InvocationFault::MethodMissing(method.to_owned()))?;

        let device = Proxy::new(&self.connection, BLUEZ_SERVICE, peer.address.as_str(), DEVICE_IFACE)
            .map_err(|e| InvocationFault::Runtime(e.to_string()))?;

        let reply: zbus::Result<()> = device.call(member, &(A2DP_SINK_UUID,));
        match reply {
            Ok(()) => Ok(true),
            Err(zbus::Error::MethodError(name, detail, _)) => {
                classify_error(method, name.as_str(), detail.as_deref().unwrap_or_default())
            }
            Err(e) => Err(InvocationFault::Runtime(e.to_string())),
        }
    }
}
