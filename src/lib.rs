//! Movie Blackjack State Library
//!
//! This crate provides the lobby state machine for Movie Blackjack, a party
//! game where players take turns guessing movie scores.
//!
//! # Overview
//!
//! The state module provides:
//!
//! - **Lobby Roster** - Players in join order, which is also turn order.
//!
//! - **Turn Order** - Round-robin rotation of the active player.
//!
//! - **Lobby State Machine** - `pregame`, `spectating`, `guessing`,
//!   `hit-or-stay`, `done` and `full`, driven by a closed set of events.
//!
//! - **Interpreter** - Applies one event and settles automatic transitions.
//!
//! - **Sessions** - Loads and saves serialized snapshots per request identity.
//!
//! # Design Principles
//!
//! 1. **Snapshots in, snapshots out** - The machine keeps nothing between calls.
//!    Callers persist the snapshot it returns.
//!
//! 2. **Unhandled events are ignored** - Sending an event a phase does not
//!    handle is not an error and changes nothing.
//!
//! 3. **No networking** - This crate is pure state, no HTTP or rendering.
//!
//! 4. **Serialization-ready** - Snapshots and events round-trip through JSON,
//!    and phase names are stable route segments.
//!
//! # Example
//!
//! ```rust
//! use blackjack_state::state::{
//!     LobbyConfig, LobbyEvent, LobbySessions, MemorySessionStore, Phase,
//! };
//!
//! let lobbies = LobbySessions::new(MemorySessionStore::new(), LobbyConfig::default());
//! let code = lobbies.create_lobby();
//!
//! // Join and start from one browser session
//! lobbies.join_game("session-abc", &code, "Alice").unwrap();
//! let state = lobbies
//!     .send_event("session-abc", &code, &LobbyEvent::StartGame)
//!     .unwrap();
//! assert_eq!(state.phase(), Phase::Guessing);
//!
//! let state = lobbies
//!     .send_event(
//!         "session-abc",
//!         &code,
//!         &LobbyEvent::Guess { movie_id: "603".into(), score_guess: 8, actual_score: Some(8.2) },
//!     )
//!     .unwrap();
//! assert_eq!(state.phase(), Phase::HitOrStay);
//!
//! // Alice is the only player, so staying ends the game
//! let state = lobbies
//!     .send_event("session-abc", &code, &LobbyEvent::Stay)
//!     .unwrap();
//! assert_eq!(state.phase(), Phase::Done);
//! assert!(state.winner().is_some());
//! ```

pub mod state;

// Re-export everything from state module at crate root
pub use state::*;
