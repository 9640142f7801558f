//! Lobby state machine.
//!
//! Drives a lobby from the waiting room through each player's turn to the
//! end of the game.
//!
//! # State Diagram
//!
//! ```text
//!                      JOIN_GAME on a full roster (from any live phase)
//!                 ┌─────────────────────────────────────────────────────┐
//!                 │                                                     ▼
//! ┌──────────┐ START_GAME ┌────────────┐  current == active  ┌──────────┐   ┌──────┐
//! │ pregame  │───────────▶│ spectating │────────────────────▶│ guessing │   │ full │
//! └──────────┘            └────────────┘       (eager)       └────┬─────┘   └──────┘
//!                               ▲                                 │ ▲
//!                               │ STAY (not last,           GUESS │ │ HIT
//!                               │       advance turn)             ▼ │
//!                               │                          ┌─────────────┐
//!                               └──────────────────────────│ hit-or-stay │
//!                                                          └──────┬──────┘
//!                                                                 │ STAY (last player)
//!                                                                 ▼
//!                                                             ┌──────┐
//!                                                             │ done │
//!                                                             └──────┘
//! ```
//!
//! `PLAYER_LEFT` is handled in every live phase and never changes phase.
//! `GAME_FINISHED` ends the game from any in-progress phase. Events that
//! a phase does not handle are ignored and leave the snapshot untouched.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::config::LobbyConfig;
use super::lobby::{next_player, Lobby, LobbyContext};
use super::player::{Guess as PlayerGuess, Player, PlayerId};

/// Machine phases. The string forms double as route segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    /// Waiting room, players join here
    #[default]
    Pregame,
    /// Someone else's turn
    Spectating,
    /// The active player is entering a guess
    Guessing,
    /// The active player decides to refine or lock in
    HitOrStay,
    /// Game over
    Done,
    /// Lobby rejected a join because it was full
    Full,
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Self::Pregame,
        Self::Spectating,
        Self::Guessing,
        Self::HitOrStay,
        Self::Done,
        Self::Full,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pregame => "pregame",
            Self::Spectating => "spectating",
            Self::Guessing => "guessing",
            Self::HitOrStay => "hit-or-stay",
            Self::Done => "done",
            Self::Full => "full",
        }
    }

    /// Look up a phase by its route name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == name)
    }

    /// Check if phase is terminal (cannot change).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Full)
    }

    /// Check if the machine stops here and waits for the next event.
    pub fn is_pausable(&self) -> bool {
        matches!(
            self,
            Self::Pregame | Self::Spectating | Self::Guessing | Self::HitOrStay
        )
    }

    /// Check if a game is underway.
    pub fn is_in_progress(&self) -> bool {
        matches!(self, Self::Spectating | Self::Guessing | Self::HitOrStay)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events the lobby reacts to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LobbyEvent {
    /// The evaluating participant joins. Capacity-checked.
    JoinGame { player: Player },
    /// Someone else joined; sync the roster while waiting.
    PlayerJoined { player: Player },
    #[serde(rename_all = "camelCase")]
    PlayerLeft { player_id: PlayerId },
    StartGame,
    #[serde(rename_all = "camelCase")]
    Guess {
        movie_id: String,
        score_guess: u8,
        #[serde(default)]
        actual_score: Option<f64>,
    },
    Hit,
    Stay,
    GameFinished,
}

impl LobbyEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinGame { .. } => "JOIN_GAME",
            Self::PlayerJoined { .. } => "PLAYER_JOINED",
            Self::PlayerLeft { .. } => "PLAYER_LEFT",
            Self::StartGame => "START_GAME",
            Self::Guess { .. } => "GUESS",
            Self::Hit => "HIT",
            Self::Stay => "STAY",
            Self::GameFinished => "GAME_FINISHED",
        }
    }
}

/// Failures the machine can raise.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MachineError {
    /// Turn order was asked for on a lobby with no players.
    #[error("cannot pick the next player from an empty roster")]
    EmptyRoster,

    /// The interpreter did not reach a pausable or terminal phase in time.
    #[error("lobby did not settle within {waited:?} (stuck in {phase})")]
    SettleTimeout { phase: Phase, waited: Duration },
}

/// Persistable machine state: the phase plus the full context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LobbySnapshot {
    phase: Phase,
    context: LobbyContext,
}

impl LobbySnapshot {
    /// Fresh snapshot for a lobby code, in the initial phase.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            phase: Phase::Pregame,
            context: LobbyContext::new(code),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn matches(&self, phase: Phase) -> bool {
        self.phase == phase
    }

    pub fn context(&self) -> &LobbyContext {
        &self.context
    }

    pub fn lobby(&self) -> &Lobby {
        &self.context.lobby
    }

    pub fn winner(&self) -> Option<&str> {
        self.context.winner.as_deref()
    }

    /// Evaluate as a given participant.
    pub fn with_current_player(mut self, player_id: impl Into<PlayerId>) -> Self {
        self.context.current_player = Some(player_id.into());
        self
    }

    /// Terminal, or waiting for an external event.
    pub fn is_quiescent(&self) -> bool {
        self.phase.is_terminal() || self.phase.is_pausable()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// The machine definition: capacity rules plus the default context.
#[derive(Debug, Clone, Default)]
pub struct LobbyMachine {
    config: LobbyConfig,
    code: String,
}

impl LobbyMachine {
    pub fn new(config: LobbyConfig) -> Self {
        Self {
            config,
            code: String::new(),
        }
    }

    /// Set the lobby code used for fresh snapshots.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn config(&self) -> &LobbyConfig {
        &self.config
    }

    pub fn initial_snapshot(&self) -> LobbySnapshot {
        LobbySnapshot::new(self.code.clone())
    }

    /// Apply an event, returning the new snapshot.
    ///
    /// Unhandled events return an identical copy of `snapshot`.
    pub fn apply(
        &self,
        snapshot: &LobbySnapshot,
        event: &LobbyEvent,
    ) -> Result<LobbySnapshot, MachineError> {
        let mut next = snapshot.clone();
        if self.transition(&mut next, event)? {
            tracing::debug!(
                lobby = %next.context.lobby.code,
                event = event.name(),
                from = %snapshot.phase,
                to = %next.phase,
                "Lobby transition"
            );
            Ok(next)
        } else {
            tracing::trace!(
                lobby = %snapshot.context.lobby.code,
                event = event.name(),
                phase = %snapshot.phase,
                "Event ignored in current phase"
            );
            Ok(snapshot.clone())
        }
    }

    /// One pass of the eager transitions.
    ///
    /// Returns `None` when nothing applies.
    pub fn settle_step(&self, snapshot: &LobbySnapshot) -> Option<LobbySnapshot> {
        match snapshot.phase {
            Phase::Spectating if snapshot.context.current_player_is_active() => {
                let mut next = snapshot.clone();
                next.phase = Phase::Guessing;
                tracing::debug!(
                    lobby = %next.context.lobby.code,
                    player = ?next.context.current_player,
                    "Player's turn, moving to guessing"
                );
                Some(next)
            }
            _ => None,
        }
    }

    /// Apply an event in place. Returns whether anything was handled.
    ///
    /// Must not touch `s` on paths that return `Ok(false)`.
    fn transition(&self, s: &mut LobbySnapshot, event: &LobbyEvent) -> Result<bool, MachineError> {
        use LobbyEvent::*;
        use Phase::*;

        match (s.phase, event) {
            // Terminal phases freeze everything
            (Done | Full, _) => Ok(false),

            // Global handlers
            (_, JoinGame { player }) => {
                self.join_game(s, player);
                Ok(true)
            }
            (_, PlayerLeft { player_id }) => player_left(&mut s.context, player_id),

            // Pregame
            (Pregame, PlayerJoined { player }) => Ok(self.player_joined(&mut s.context, player)),
            (Pregame, StartGame) => {
                if s.context.lobby.is_empty() {
                    return Ok(false);
                }
                advance_active_player(&mut s.context)?;
                s.phase = Spectating;
                Ok(true)
            }
            (Pregame, LobbyEvent::Guess { .. } | Hit | Stay | GameFinished) => Ok(false),

            // Guessing
            (
                Guessing,
                LobbyEvent::Guess {
                    movie_id,
                    score_guess,
                    actual_score,
                },
            ) => {
                let guess = PlayerGuess::new(movie_id.clone(), *score_guess, *actual_score);
                record_guess(&mut s.context, guess);
                s.phase = HitOrStay;
                Ok(true)
            }

            // Hit or stay
            (HitOrStay, Hit) => {
                s.phase = Guessing;
                Ok(true)
            }
            (HitOrStay, Stay) => {
                if s.context.lobby.active_is_last() {
                    enter_done(s);
                } else {
                    advance_active_player(&mut s.context)?;
                    s.phase = Spectating;
                }
                Ok(true)
            }

            (Spectating | Guessing | HitOrStay, GameFinished) => {
                enter_done(s);
                Ok(true)
            }

            (Spectating | Guessing | HitOrStay, PlayerJoined { .. } | StartGame) => Ok(false),
            (Spectating | HitOrStay, LobbyEvent::Guess { .. }) => Ok(false),
            (Spectating | Guessing, Hit | Stay) => Ok(false),
        }
    }

    fn join_game(&self, s: &mut LobbySnapshot, player: &Player) {
        let lobby = &s.context.lobby;

        // A returning member is recognized before the capacity check
        if lobby.has_player(&player.id) {
            s.context.current_player = Some(player.id.clone());
            return;
        }

        if lobby.is_full(self.config.max_players) {
            tracing::info!(
                lobby = %lobby.code,
                player = %player.id,
                players = lobby.player_count(),
                "Lobby full, rejecting join"
            );
            s.phase = Phase::Full;
            return;
        }

        s.context.current_player = Some(player.id.clone());
        s.context.lobby.add_player(player.clone());
        tracing::info!(
            lobby = %s.context.lobby.code,
            player = %player.id,
            nickname = %player.nickname,
            "Player joined lobby"
        );
    }

    fn player_joined(&self, ctx: &mut LobbyContext, player: &Player) -> bool {
        if ctx.lobby.is_full(self.config.max_players) {
            return false;
        }
        ctx.lobby.add_player(player.clone())
    }
}

fn player_left(ctx: &mut LobbyContext, player_id: &str) -> Result<bool, MachineError> {
    let was_active = ctx.lobby.is_active(player_id);
    if ctx.lobby.remove_player(player_id).is_none() {
        return Ok(false);
    }

    if was_active {
        if ctx.lobby.is_empty() {
            ctx.lobby.active_player = None;
        } else {
            advance_active_player(ctx)?;
        }
    }

    tracing::info!(
        lobby = %ctx.lobby.code,
        player = %player_id,
        active = ?ctx.lobby.active_player,
        "Player left lobby"
    );
    Ok(true)
}

fn advance_active_player(ctx: &mut LobbyContext) -> Result<(), MachineError> {
    let next = next_player(&ctx.lobby)?.clone();
    ctx.lobby.active_player = Some(next);
    Ok(())
}

fn record_guess(ctx: &mut LobbyContext, guess: PlayerGuess) {
    let Some(active) = ctx.lobby.active_player.clone() else {
        return;
    };
    if let Some(player) = ctx.lobby.get_player_mut(&active) {
        player.record_guess(guess);
    }
}

fn enter_done(s: &mut LobbySnapshot) {
    s.phase = Phase::Done;
    s.context.winner = calculate_winner(&s.context.lobby).cloned();
    tracing::info!(
        lobby = %s.context.lobby.code,
        winner = ?s.context.winner,
        "Game finished"
    );
}

/// The player with the smallest total error over revealed guesses.
///
/// Ties go to whoever joined first. Players without a revealed guess are
/// not ranked, so there is no winner until someone has one.
pub fn calculate_winner(lobby: &Lobby) -> Option<&PlayerId> {
    let mut best: Option<(&PlayerId, f64)> = None;
    for player in lobby.players() {
        let Some(error) = player.total_error() else {
            continue;
        };
        if best.map_or(true, |(_, best_error)| error.total_cmp(&best_error).is_lt()) {
            best = Some((&player.id, error));
        }
    }
    best.map(|(id, _)| id)
}
