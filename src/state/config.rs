//! Lobby configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Maximum players per lobby.
pub const MAX_LOBBY_PLAYERS: usize = 8;

/// Default ceiling for settling the machine (3 seconds).
pub const DEFAULT_SETTLE_TIMEOUT: Duration = Duration::from_millis(3_000);

/// Length of generated lobby codes.
pub const LOBBY_CODE_LENGTH: usize = 8;

/// Tunables shared by the machine, the interpreter and the session layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LobbyConfig {
    /// Players allowed before joins are rejected
    pub max_players: usize,

    /// Maximum time the interpreter may spend settling, in milliseconds
    pub settle_timeout_ms: u64,

    /// Length of generated and accepted lobby codes
    pub code_length: usize,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            max_players: MAX_LOBBY_PLAYERS,
            settle_timeout_ms: DEFAULT_SETTLE_TIMEOUT.as_millis() as u64,
            code_length: LOBBY_CODE_LENGTH,
        }
    }
}

impl LobbyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn settle_timeout(&self) -> Duration {
        Duration::from_millis(self.settle_timeout_ms)
    }
}
