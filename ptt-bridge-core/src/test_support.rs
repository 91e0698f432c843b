//! In-memory backends for unit tests.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::audio_format::{OutputCapabilities, PcmFormat, StreamConfig};
use crate::models::error::{BridgeError, InvocationFault};
use crate::models::peer::{ProfileKind, TransportPeer};
use crate::processing::pcm;
use crate::traits::audio_output::{AudioOutputBackend, PcmStream};
use crate::traits::profile::ProfileProxy;
use crate::traits::radio::{ProxyListener, RadioAdapter};

#[derive(Debug, Default)]
pub struct OutputLog {
    pub opened: usize,
    pub released: usize,
    pub played: usize,
    pub stopped: usize,
    pub max_live: usize,
    pub written: Vec<u8>,
    pub configs: Vec<StreamConfig>,
}

impl OutputLog {
    pub fn live(&self) -> usize {
        self.opened - self.released
    }
}

pub struct FakeOutput {
    log: Arc<Mutex<OutputLog>>,
    caps: OutputCapabilities,
    min_buffer: Option<usize>,
    available: bool,
    fail_open: bool,
    fail_write: bool,
}

impl FakeOutput {
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(OutputLog::default())),
            caps: OutputCapabilities {
                supports_audio_attributes: true,
            },
            min_buffer: None,
            available: true,
            fail_open: false,
            fail_write: false,
        }
    }

    pub fn log(&self) -> Arc<Mutex<OutputLog>> {
        Arc::clone(&self.log)
    }

    pub fn legacy(mut self) -> Self {
        self.caps.supports_audio_attributes = false;
        self
    }

    pub fn with_min_buffer(mut self, bytes: usize) -> Self {
        self.min_buffer = Some(bytes);
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_write = true;
        self
    }
}

impl AudioOutputBackend for FakeOutput {
    fn is_available(&self) -> bool {
        self.available
    }

    fn capabilities(&self) -> OutputCapabilities {
        self.caps
    }

    fn min_buffer_size(&self, format: &PcmFormat) -> Result<usize, BridgeError> {
        Ok(self
            .min_buffer
            .unwrap_or_else(|| pcm::min_buffer_bytes(format, pcm::DEFAULT_PERIOD_MS)))
    }

    fn open_stream(&mut self, config: &StreamConfig) -> Result<Box<dyn PcmStream>, BridgeError> {
        if self.fail_open {
            return Err(BridgeError::DeviceNotAvailable);
        }
        let mut log = self.log.lock();
        log.opened += 1;
        log.max_live = log.max_live.max(log.live());
        log.configs.push(*config);
        Ok(Box::new(FakeStream {
            log: Arc::clone(&self.log),
            fail_write: self.fail_write,
            released: false,
        }))
    }
}

struct FakeStream {
    log: Arc<Mutex<OutputLog>>,
    fail_write: bool,
    released: bool,
}

impl PcmStream for FakeStream {
    fn play(&mut self) -> Result<(), BridgeError> {
        self.log.lock().played += 1;
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, BridgeError> {
        if self.fail_write {
            return Err(BridgeError::StreamFailed("device gone".into()));
        }
        self.log.lock().written.extend_from_slice(data);
        Ok(data.len())
    }

    fn stop(&mut self) -> Result<(), BridgeError> {
        self.log.lock().stopped += 1;
        Ok(())
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.log.lock().released += 1;
        }
    }
}

/// What a fake proxy does when a hidden operation is invoked.
#[derive(Debug, Clone)]
pub enum HiddenBehavior {
    Reports(bool),
    /// Report the value after blocking for the given time.
    Slow(Duration, bool),
    Fault(InvocationFault),
    Panics,
}

/// How the fake radio answers a bind request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyDelivery {
    /// Call the listener before `request_profile_proxy` returns.
    Immediate,
    /// Call the listener from a spawned thread.
    Threaded,
    /// Keep the listener until `deliver_held` is called.
    Held,
    /// Drop the listener without calling it.
    Dropped,
    /// Refuse the request.
    Refused,
}

#[derive(Debug, Default)]
pub struct RadioLog {
    pub bind_requests: usize,
    pub closed: usize,
    pub presence_checks: usize,
    pub invocations: Vec<(String, String)>,
    /// Ordered trace of invocations, releases and anything tests record.
    pub events: Vec<String>,
}

struct RadioShared {
    connected: Vec<TransportPeer>,
    hidden: HiddenBehavior,
    log: Mutex<RadioLog>,
}

pub struct FakeRadio {
    present: bool,
    enabled: bool,
    bonded: Vec<TransportPeer>,
    delivery: ProxyDelivery,
    shared: Arc<RadioShared>,
    held: Mutex<Vec<ProxyListener>>,
}

pub fn peer(name: &str, address: &str) -> TransportPeer {
    TransportPeer {
        name: name.into(),
        address: address.into(),
        bonded: true,
        connected: false,
    }
}

impl FakeRadio {
    pub fn new() -> FakeRadioBuilder {
        FakeRadioBuilder {
            present: true,
            enabled: true,
            bonded: Vec::new(),
            connected: Vec::new(),
            hidden: HiddenBehavior::Reports(true),
            delivery: ProxyDelivery::Immediate,
        }
    }

    pub fn bind_requests(&self) -> usize {
        self.shared.log.lock().bind_requests
    }

    pub fn closed(&self) -> usize {
        self.shared.log.lock().closed
    }

    pub fn invocations(&self) -> Vec<(String, String)> {
        self.shared.log.lock().invocations.clone()
    }

    pub fn presence_checks(&self) -> usize {
        self.shared.log.lock().presence_checks
    }

    /// Append `event` to the shared trace.
    pub fn record(&self, event: impl Into<String>) {
        self.shared.log.lock().events.push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.shared.log.lock().events.clone()
    }

    /// Deliver proxies to listeners kept under `ProxyDelivery::Held`.
    pub fn deliver_held(&self) {
        let listeners: Vec<ProxyListener> = self.held.lock().drain(..).collect();
        for listener in listeners {
            listener(ProfileKind::A2dpSink, self.proxy());
        }
    }

    fn proxy(&self) -> Box<dyn ProfileProxy> {
        Box::new(FakeProxy {
            shared: Arc::clone(&self.shared),
        })
    }
}

pub struct FakeRadioBuilder {
    present: bool,
    enabled: bool,
    bonded: Vec<TransportPeer>,
    connected: Vec<TransportPeer>,
    hidden: HiddenBehavior,
    delivery: ProxyDelivery,
}

impl FakeRadioBuilder {
    pub fn absent(mut self) -> Self {
        self.present = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn bonded(mut self, peer: TransportPeer) -> Self {
        self.bonded.push(peer);
        self
    }

    pub fn connected(mut self, mut peer: TransportPeer) -> Self {
        peer.connected = true;
        self.connected.push(peer);
        self
    }

    pub fn hidden(mut self, behavior: HiddenBehavior) -> Self {
        self.hidden = behavior;
        self
    }

    pub fn delivery(mut self, delivery: ProxyDelivery) -> Self {
        self.delivery = delivery;
        self
    }

    pub fn build(self) -> FakeRadio {
        FakeRadio {
            present: self.present,
            enabled: self.enabled,
            bonded: self.bonded,
            delivery: self.delivery,
            shared: Arc::new(RadioShared {
                connected: self.connected,
                hidden: self.hidden,
                log: Mutex::new(RadioLog::default()),
            }),
            held: Mutex::new(Vec::new()),
        }
    }
}

impl RadioAdapter for FakeRadio {
    fn is_present(&self) -> bool {
        self.shared.log.lock().presence_checks += 1;
        self.present
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn bonded_devices(&self) -> Vec<TransportPeer> {
        self.bonded.clone()
    }

    fn request_profile_proxy(
        &self,
        profile: ProfileKind,
        listener: ProxyListener,
    ) -> Result<(), BridgeError> {
        self.shared.log.lock().bind_requests += 1;
        match self.delivery {
            ProxyDelivery::Immediate => listener(profile, self.proxy()),
            ProxyDelivery::Threaded => {
                let proxy = self.proxy();
                std::thread::spawn(move || listener(profile, proxy));
            }
            ProxyDelivery::Held => self.held.lock().push(listener),
            ProxyDelivery::Dropped => drop(listener),
            ProxyDelivery::Refused => {
                return Err(BridgeError::BindFailed("service unavailable".into()))
            }
        }
        Ok(())
    }

    fn close_profile_proxy(&self, _profile: ProfileKind, _proxy: Box<dyn ProfileProxy>) {
        let mut log = self.shared.log.lock();
        log.closed += 1;
        log.events.push("released".into());
    }
}

struct FakeProxy {
    shared: Arc<RadioShared>,
}

impl ProfileProxy for FakeProxy {
    fn profile(&self) -> ProfileKind {
        ProfileKind::A2dpSink
    }

    fn connected_devices(&self) -> Vec<TransportPeer> {
        self.shared.connected.clone()
    }

    fn invoke_hidden(&self, method: &str, peer: &TransportPeer) -> Result<bool, InvocationFault> {
        {
            let mut log = self.shared.log.lock();
            log.invocations.push((method.to_string(), peer.address.clone()));
            log.events.push(format!("invoked {}", method));
        }
        match &self.shared.hidden {
            HiddenBehavior::Reports(value) => Ok(*value),
            HiddenBehavior::Slow(delay, value) => {
                thread::sleep(*delay);
                Ok(*value)
            }
            HiddenBehavior::Fault(fault) => Err(fault.clone()),
            HiddenBehavior::Panics => panic!("proxy blew up"),
        }
    }
}
