//! Line-oriented JSON front end for a `ChannelRegistry`.
//!
//! Each input line is one request:
//! `{"channel": "...", "method": "...", "arguments": null | [u8, ...] | <json>}`.
//! Each request produces exactly one `MethodResponse` line, in order.

use std::env;
use std::fs;
use std::io::{BufRead, Write};
use std::sync::mpsc;

use serde::Deserialize;
use thiserror::Error;

use ptt_bridge_core::channel::method::{CallArguments, MethodCall, MethodResponse};
use ptt_bridge_core::channel::registry::ChannelRegistry;
use ptt_bridge_core::models::config::BridgeConfiguration;
use ptt_bridge_core::models::error::BridgeError;

/// Path of a JSON `BridgeConfiguration` file.
pub const CONFIG_ENV: &str = "PTT_BRIDGE_CONFIG";

#[derive(Debug, Error)]
pub enum HostError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct Request {
    channel: String,
    method: String,
    #[serde(default)]
    arguments: CallArguments,
}

/// Configuration from the file named by `PTT_BRIDGE_CONFIG`, or defaults.
pub fn config_from_env() -> Result<BridgeConfiguration, BridgeError> {
    match env::var(CONFIG_ENV) {
        Ok(path) => {
            let text = fs::read_to_string(&path).map_err(|e| {
                BridgeError::ConfigurationFailed(format!("cannot read {}: {}", path, e))
            })?;
            BridgeConfiguration::from_json_str(&text)
        }
        Err(_) => Ok(BridgeConfiguration::default()),
    }
}

/// Answer one request line. Waits for asynchronous replies.
pub fn handle_line(registry: &ChannelRegistry, line: &str) -> MethodResponse {
    let request: Request = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => return MethodResponse::error("BAD_REQUEST", e.to_string()),
    };

    let (tx, rx) = mpsc::channel();
    registry.dispatch(
        &request.channel,
        MethodCall {
            method: request.method,
            arguments: request.arguments,
        },
        Box::new(move |response| {
            let _ = tx.send(response);
        }),
    );

    rx.recv()
        .unwrap_or_else(|_| MethodResponse::error("NO_REPLY", "handler dropped the call"))
}

/// Serve requests from `input` until EOF. Returns the number answered.
pub fn serve<R: BufRead, W: Write>(
    registry: &ChannelRegistry,
    input: R,
    mut output: W,
) -> Result<usize, HostError> {
    let mut answered = 0;
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_line(registry, &line);
        serde_json::to_writer(&mut output, &response)?;
        output.write_all(b"\n")?;
        output.flush()?;
        answered += 1;
    }
    Ok(answered)
}
