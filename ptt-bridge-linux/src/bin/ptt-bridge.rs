use std::env;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use ptt_bridge_core::traits::radio::RadioAdapter;
use ptt_bridge_core::{BridgeConfiguration, ChannelRegistry};
use ptt_bridge_linux::{host, WavFileOutput};

// One file per session; the directory is never pruned.
fn wav_output() -> WavFileOutput {
    let dir = env::var_os("PTT_BRIDGE_WAV_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(env::temp_dir);
    log::info!("recording playback to {}", dir.display());
    WavFileOutput::new(dir)
}

#[cfg(feature = "cpal-output")]
fn build_registry<A: RadioAdapter + 'static>(config: &BridgeConfiguration, adapter: Arc<A>) -> ChannelRegistry {
    if env::var("PTT_BRIDGE_OUTPUT").as_deref() == Ok("wav") {
        ChannelRegistry::with_transport(config, wav_output(), adapter)
    } else {
        ChannelRegistry::with_transport(config, ptt_bridge_linux::CpalOutput::new(), adapter)
    }
}

#[cfg(not(feature = "cpal-output"))]
fn build_registry<A: RadioAdapter + 'static>(config: &BridgeConfiguration, adapter: Arc<A>) -> ChannelRegistry {
    ChannelRegistry::with_transport(config, wav_output(), adapter)
}

#[cfg(target_os = "linux")]
fn registry(config: &BridgeConfiguration) -> ChannelRegistry {
    if config.enable_transport {
        build_registry(config, Arc::new(ptt_bridge_linux::BluezAdapter::system()))
    } else {
        build_registry(config, Arc::new(ptt_bridge_linux::NoRadio))
    }
}

#[cfg(not(target_os = "linux"))]
fn registry(config: &BridgeConfiguration) -> ChannelRegistry {
    build_registry(config, Arc::new(ptt_bridge_linux::NoRadio))
}

fn main() -> ExitCode {
    env_logger::init();

    let config = match host::config_from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let registry = registry(&config);
    log::info!("serving {:?}", registry.channels());

    match host::serve(&registry, io::stdin().lock(), io::stdout().lock()) {
        Ok(answered) => {
            log::info!("input closed after {} requests", answered);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
