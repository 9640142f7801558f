//! Lobby roster and turn order.
//!
//! A lobby is an ordered roster of players. Join order is turn order: the
//! roster is only ever appended to or filtered, never reordered, and turns
//! advance by moving the active-player pointer through it.

use serde::{Deserialize, Serialize};

use super::machine::MachineError;
use super::player::{Player, PlayerId};

/// Lobby state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lobby {
    /// Shareable code, an uninterpreted label
    pub code: String,

    /// Players in join order
    #[serde(default)]
    players: Vec<Player>,

    /// Whose turn it is. May briefly name a player who already left.
    pub active_player: Option<PlayerId>,
}

impl Lobby {
    /// Create an empty lobby.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            players: Vec::new(),
            active_player: None,
        }
    }

    /// Append a player to the end of the turn order.
    ///
    /// Returns `false` (and leaves the roster alone) if the id is taken.
    pub fn add_player(&mut self, player: Player) -> bool {
        if self.has_player(&player.id) {
            return false;
        }
        self.players.push(player);
        true
    }

    /// Remove a player, keeping everyone else in order.
    pub fn remove_player(&mut self, player_id: &str) -> Option<Player> {
        let index = self.players.iter().position(|p| p.id == player_id)?;
        Some(self.players.remove(index))
    }

    pub fn get_player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn get_player_mut(&mut self, player_id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == player_id)
    }

    pub fn has_player(&self, player_id: &str) -> bool {
        self.players.iter().any(|p| p.id == player_id)
    }

    /// Check whether a nickname is already used in this lobby.
    pub fn nickname_taken(&self, nickname: &str) -> bool {
        self.players.iter().any(|p| p.nickname == nickname)
    }

    /// Players in turn order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn is_full(&self, max_players: usize) -> bool {
        self.players.len() >= max_players
    }

    /// Check if it's a player's turn.
    pub fn is_active(&self, player_id: &str) -> bool {
        self.active_player.as_deref() == Some(player_id)
    }

    /// True when the active player is the last one in the live roster.
    ///
    /// With an empty roster (and therefore no active player) this is also
    /// true: there is nobody left to hand the turn to.
    pub fn active_is_last(&self) -> bool {
        self.players.last().map(|p| p.id.as_str()) == self.active_player.as_deref()
    }
}

/// Round-robin turn order: the player after the active one.
///
/// Falls back to the first player when nobody is active, the active player
/// is no longer in the roster, or the active player is last.
pub fn next_player(lobby: &Lobby) -> Result<&PlayerId, MachineError> {
    let first = lobby.players.first().ok_or(MachineError::EmptyRoster)?;

    let next = lobby
        .active_player
        .as_deref()
        .and_then(|active| lobby.players.iter().position(|p| p.id == active))
        .and_then(|index| lobby.players.get(index + 1))
        .unwrap_or(first);

    Ok(&next.id)
}

/// Lobby plus the per-evaluation view the machine runs with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LobbyContext {
    #[serde(flatten)]
    pub lobby: Lobby,

    /// Who "you" are for this evaluation
    pub current_player: Option<PlayerId>,

    /// Set once the game is over
    pub winner: Option<PlayerId>,
}

impl LobbyContext {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            lobby: Lobby::new(code),
            current_player: None,
            winner: None,
        }
    }

    /// Whether the evaluating player is the one whose turn it is.
    pub fn current_player_is_active(&self) -> bool {
        match &self.current_player {
            Some(current) => self.lobby.is_active(current),
            None => false,
        }
    }
}
