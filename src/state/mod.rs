//! Lobby state for Movie Blackjack.
//!
//! - `player` - Players and their guesses
//! - `lobby` - Roster, turn order and the machine's context
//! - `machine` - Phases, events and transitions
//! - `interpreter` - Runs the machine until it settles
//! - `session` - Snapshot persistence per request identity
//! - `code` - Lobby codes and player ids
//! - `config` - Tunables
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                      LobbySessions<S: SessionStore>                   │
//! │                                                                       │
//! │   identity ──load──▶ snapshot JSON ──▶ LobbySnapshot                  │
//! │                                            │                          │
//! │                                            ▼                          │
//! │  ┌─────────────────────────────────────────────────────────────────┐  │
//! │  │                         Interpreter::run                         │  │
//! │  │                                                                  │  │
//! │  │   apply(event) ──▶ settle_step* ──▶ pausable or terminal phase   │  │
//! │  │        │                                                         │  │
//! │  │        └──▶ LobbyMachine: guards + actions ──▶ next_player()     │  │
//! │  └─────────────────────────────────────────────────────────────────┘  │
//! │                                            │                          │
//! │   identity ◀──save── snapshot JSON ◀───────┘                          │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust
//! use blackjack_state::state::{
//!     config::LobbyConfig,
//!     interpreter::run,
//!     machine::{LobbyEvent, LobbyMachine, Phase},
//!     player::Player,
//! };
//! use std::time::Duration;
//!
//! let machine = LobbyMachine::new(LobbyConfig::default()).with_code("ABCD1234");
//! let wait = Duration::from_secs(3);
//!
//! let join = LobbyEvent::JoinGame { player: Player::with_id("p1", "Alice") };
//! let lobby = run(&machine, wait, None, Some(&join))?;
//! let lobby = run(&machine, wait, Some(lobby), Some(&LobbyEvent::StartGame))?;
//!
//! // Alice joined last, so she is "you" and it is her turn
//! assert_eq!(lobby.phase(), Phase::Guessing);
//! # Ok::<(), blackjack_state::state::machine::MachineError>(())
//! ```

pub mod code;
pub mod config;
pub mod interpreter;
pub mod lobby;
pub mod machine;
pub mod player;
pub mod session;

// Re-export commonly used types
pub use code::{generate_lobby_code, generate_player_id, normalize_lobby_code};
pub use config::{LobbyConfig, DEFAULT_SETTLE_TIMEOUT, LOBBY_CODE_LENGTH, MAX_LOBBY_PLAYERS};
pub use interpreter::{run, Interpreter};
pub use lobby::{next_player, Lobby, LobbyContext};
pub use machine::{calculate_winner, LobbyEvent, LobbyMachine, LobbySnapshot, MachineError, Phase};
pub use player::{clamp_score_guess, Guess, Player, PlayerId, MAX_SCORE_GUESS};
pub use session::{LobbySessions, MemorySessionStore, SessionError, SessionStore, StoredSession};
