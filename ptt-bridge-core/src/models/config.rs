use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::BridgeError;
use super::peer::DEFAULT_PEER_NAME;

/// Method channel carrying the audio track commands.
pub const AUDIO_CHANNEL: &str = "bygelectronics.pw/audio_track";

/// Method channel carrying the Bluetooth audio commands.
pub const TRANSPORT_CHANNEL: &str = "pwseries.bluetooth";

/// Configuration for the bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfiguration {
    /// Display name of the accessory to look for (default: "BTPW").
    pub peer_name: String,

    /// How long to wait for a profile proxy before answering `false`
    /// (default: 5000 ms).
    pub bind_timeout_ms: u64,

    /// Channel name for the audio track commands.
    pub audio_channel: String,

    /// Channel name for the Bluetooth commands.
    pub transport_channel: String,

    /// Register the Bluetooth channel. `false` gives the audio-only bridge.
    pub enable_transport: bool,
}

impl BridgeConfiguration {
    pub fn bind_timeout(&self) -> Duration {
        Duration::from_millis(self.bind_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.peer_name.is_empty() {
            return Err("peer name must not be empty".into());
        }
        if self.bind_timeout_ms == 0 {
            return Err("bind timeout must be positive".into());
        }
        if self.audio_channel.is_empty() || self.transport_channel.is_empty() {
            return Err("channel names must not be empty".into());
        }
        if self.audio_channel == self.transport_channel {
            return Err(format!("channel name used twice: {}", self.audio_channel));
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, BridgeError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| BridgeError::ConfigurationFailed(format!("failed to parse config: {}", e)))?;
        config.validate().map_err(BridgeError::ConfigurationFailed)?;
        Ok(config)
    }
}

impl Default for BridgeConfiguration {
    fn default() -> Self {
        Self {
            peer_name: DEFAULT_PEER_NAME.into(),
            bind_timeout_ms: 5000,
            audio_channel: AUDIO_CHANNEL.into(),
            transport_channel: TRANSPORT_CHANNEL.into(),
            enable_transport: true,
        }
    }
}
