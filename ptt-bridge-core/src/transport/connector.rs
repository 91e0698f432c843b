use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use crate::models::config::BridgeConfiguration;
use crate::models::peer::{self, ProfileKind, DEFAULT_PEER_NAME};
use crate::models::state::{BindingState, RadioStatus};
use crate::traits::profile::ProfileProxy;
use crate::traits::radio::{ProxyListener, RadioAdapter};
use crate::transport::binding::ProfileBinding;
use crate::transport::completion::{Completion, Deadline, ResultCallback};
use crate::transport::control::{HiddenMethodControl, HiddenOperation};

/// Default wait for a profile proxy before answering `false`.
pub const DEFAULT_BIND_TIMEOUT: Duration = Duration::from_secs(5);

/// Answers connection questions about one named peer over the A2DP profile.
///
/// Every command opens its own short-lived binding:
/// ```text
/// unbound → request proxy → [async] → bound → operation → release → result
/// ```
/// Results arrive through a callback, exactly once, always as a definite
/// boolean. A missing or powered-off adapter, a missing peer, a failed or
/// timed-out bind, and any fault in the operation all answer `false`.
pub struct ProfileConnector<A: RadioAdapter + 'static> {
    adapter: Arc<A>,
    profile: ProfileKind,
    peer_name: String,
    bind_timeout: Duration,
    next_call: AtomicU64,
}

impl<A: RadioAdapter + 'static> ProfileConnector<A> {
    pub fn new(adapter: Arc<A>) -> Self {
        Self {
            adapter,
            profile: ProfileKind::A2dpSink,
            peer_name: DEFAULT_PEER_NAME.into(),
            bind_timeout: DEFAULT_BIND_TIMEOUT,
            next_call: AtomicU64::new(1),
        }
    }

    pub fn with_config(adapter: Arc<A>, config: &BridgeConfiguration) -> Self {
        Self::new(adapter)
            .with_peer_name(config.peer_name.clone())
            .with_bind_timeout(config.bind_timeout())
    }

    pub fn with_peer_name(mut self, name: impl Into<String>) -> Self {
        self.peer_name = name.into();
        self
    }

    pub fn with_bind_timeout(mut self, timeout: Duration) -> Self {
        self.bind_timeout = timeout;
        self
    }

    pub fn peer_name(&self) -> &str {
        &self.peer_name
    }

    pub fn adapter(&self) -> &Arc<A> {
        &self.adapter
    }

    /// Whether a peer with the configured name is connected on the profile.
    pub fn is_bluetooth_audio_connected(&self, callback: ResultCallback) {
        let completion = Completion::new("isBluetoothAudioConnected", callback);
        if self.radio_ready(&completion).is_none() {
            return;
        }

        let name = self.peer_name.clone();
        self.with_proxy(completion, move |proxy| {
            proxy.connected_devices().iter().any(|p| p.matches(&name))
        });
    }

    /// Ask the profile to connect the bonded peer.
    pub fn connect_bluetooth_audio(&self, callback: ResultCallback) {
        self.run_hidden(HiddenOperation::Connect, callback);
    }

    /// Ask the profile to disconnect the bonded peer.
    pub fn disconnect_bluetooth_audio(&self, callback: ResultCallback) {
        self.run_hidden(HiddenOperation::Disconnect, callback);
    }

    pub fn is_bluetooth_audio_connected_blocking(&self) -> bool {
        wait_for(|cb| self.is_bluetooth_audio_connected(cb))
    }

    pub fn connect_bluetooth_audio_blocking(&self) -> bool {
        wait_for(|cb| self.connect_bluetooth_audio(cb))
    }

    pub fn disconnect_bluetooth_audio_blocking(&self) -> bool {
        wait_for(|cb| self.disconnect_bluetooth_audio(cb))
    }

    fn run_hidden(&self, operation: HiddenOperation, callback: ResultCallback) {
        let completion = Completion::new(operation.command_name(), callback);
        let Some(status) = self.radio_ready(&completion) else {
            return;
        };

        let Some(target) = peer::find_by_name(&status.bonded, &self.peer_name).cloned() else {
            log::debug!(
                "{}: no bonded peer named {:?}",
                operation.command_name(),
                self.peer_name
            );
            completion.resolve(false);
            return;
        };

        self.with_proxy(completion, move |proxy| {
            HiddenMethodControl::new(proxy).perform(operation, &target)
        });
    }

    /// One adapter reading for the command, or `None` after answering
    /// `false` when the radio is absent or off.
    fn radio_ready(&self, completion: &Completion) -> Option<RadioStatus> {
        let status = self.adapter.status();
        if !status.is_ready() {
            log::debug!("{}: radio absent or disabled", completion.operation());
            completion.resolve(false);
            return None;
        }
        Some(status)
    }

    /// Bind, run `operation` on the proxy, release, then resolve.
    fn with_proxy<F>(&self, completion: Completion, operation: F)
    where
        F: FnOnce(&dyn ProfileProxy) -> bool + Send + 'static,
    {
        let call = self.next_call.fetch_add(1, Ordering::Relaxed);
        let op = completion.operation();
        trace(call, op, BindingState::Binding);

        let deadline = Deadline::arm(self.bind_timeout, completion.clone());
        let adapter = Arc::clone(&self.adapter);
        let pending = completion.clone();

        let listener: ProxyListener = Box::new(move |profile, proxy| {
            let binding = ProfileBinding::new(adapter, profile, proxy);
            trace(call, op, BindingState::Bound);

            if !pending.claim() {
                log::warn!("{} #{}: proxy arrived after the result was given, releasing", op, call);
                binding.release();
                trace(call, op, BindingState::Released);
                return;
            }
            // The deadline covers the wait for the proxy, not the operation.
            drop(deadline);

            let result = binding.proxy().map(operation).unwrap_or(false);
            binding.release();
            trace(call, op, BindingState::Released);
            pending.resolve(result);
        });

        if let Err(e) = self.adapter.request_profile_proxy(self.profile, listener) {
            log::warn!("{} #{}: {}", op, call, e);
            trace(call, op, BindingState::Released);
            completion.resolve(false);
        }
    }
}

fn trace(call: u64, operation: &str, state: BindingState) {
    log::debug!("{} #{}: {:?}", operation, call, state);
}

/// Run an async command and wait for its callback.
fn wait_for(start: impl FnOnce(ResultCallback)) -> bool {
    let (tx, rx) = mpsc::channel();
    start(Box::new(move |value| {
        let _ = tx.send(value);
    }));
    rx.recv().unwrap_or(false)
}
