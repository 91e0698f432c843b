//! # ptt-bridge-linux
//!
//! Linux backends for ptt-bridge.
//!
//! Provides:
//! - `BluezAdapter`: radio adapter over the BlueZ D-Bus API; connects and
//!   disconnects A2DP by invoking `Device1` methods by name
//! - `CpalOutput`: PCM playback through the default cpal output device
//!   (`cpal-output` feature)
//! - `WavFileOutput`: writes each playback session to a WAV file (files are
//!   never removed)
//! - `NoRadio`: stand-in adapter for hosts without a Bluetooth stack
//! - `host`: JSON-lines front end used by the `ptt-bridge` binary
//!
//! ## Platform Requirements
//! - BlueZ 5 on the system bus for `BluezAdapter`
//! - libasound for the `cpal-output` feature
//!
//! ## Usage
//! ```ignore
//! use std::sync::Arc;
//! use ptt_bridge_core::{BridgeConfiguration, ChannelRegistry};
//! use ptt_bridge_linux::{BluezAdapter, WavFileOutput};
//!
//! let config = BridgeConfiguration::default();
//! let registry = ChannelRegistry::with_transport(
//!     &config,
//!     WavFileOutput::new(std::env::temp_dir()),
//!     Arc::new(BluezAdapter::system()),
//! );
//! ```

#[cfg(target_os = "linux")]
pub mod bluez;
#[cfg(feature = "cpal-output")]
pub mod cpal_output;
pub mod host;
pub mod no_radio;
pub mod wav_output;

#[cfg(target_os = "linux")]
pub use bluez::BluezAdapter;
#[cfg(feature = "cpal-output")]
pub use cpal_output::CpalOutput;
pub use no_radio::NoRadio;
pub use wav_output::WavFileOutput;
