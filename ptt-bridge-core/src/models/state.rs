use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::peer::TransportPeer;

/// Playback session state machine.
///
/// State transitions:
/// ```text
/// idle → active → idle
///          ↓ start (release old, open new)
///        active'
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum AudioSessionState {
    Idle,
    Active {
        session_id: Uuid,
        started_at: DateTime<Utc>,
        bytes_written: u64,
    },
}

impl AudioSessionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    pub fn session_id(&self) -> Option<Uuid> {
        match self {
            Self::Active { session_id, .. } => Some(*session_id),
            Self::Idle => None,
        }
    }
}

/// Lifecycle of a single profile binding.
///
/// ```text
/// binding → bound → released
///    ↓
/// released (bind failed / deadline passed)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    Binding,
    Bound,
    Released,
}

/// One reading of the radio adapter, taken once per transport command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RadioStatus {
    pub present: bool,
    pub enabled: bool,
    pub bonded: Vec<TransportPeer>,
}

impl RadioStatus {
    pub fn is_ready(&self) -> bool {
        self.present && self.enabled
    }
}

/// Counters for debugging playback sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackDiagnostics {
    pub sessions_started: u64,
    pub sessions_released: u64,
    pub bytes_written: u64,
    pub writes_while_idle: u64,
    pub write_failures: u64,
}
