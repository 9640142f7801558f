//! Session storage for lobby snapshots.
//!
//! The machine keeps no state between calls. Each request identity (a
//! browser session, say) owns one serialized snapshot; this module loads
//! it, runs the interpreter, and saves the result.
//!
//! Stores must make [`SessionStore::update`] atomic per identity so that
//! two events for the same session are applied one after the other rather
//! than both to the same stale read.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use thiserror::Error;

use super::code::{generate_lobby_code_with_rng, normalize_lobby_code};
use super::config::LobbyConfig;
use super::interpreter::Interpreter;
use super::machine::{LobbyEvent, LobbyMachine, LobbySnapshot, MachineError, Phase};
use super::player::Player;

/// Session-layer errors.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Machine(#[from] MachineError),

    #[error("stored lobby snapshot is unreadable: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("invalid lobby code: {0:?}")]
    InvalidLobbyCode(String),

    #[error("nickname already taken: {0}")]
    NicknameTaken(String),

    #[error("nickname must not be empty")]
    EmptyNickname,

    #[error("lobby is in {actual}, not {expected}")]
    WrongPhase { expected: Phase, actual: Phase },

    #[error("session store unavailable: {0}")]
    StoreUnavailable(String),
}

/// Persistence for serialized snapshots, keyed by request identity.
pub trait SessionStore {
    fn load(&self, identity: &str) -> Result<Option<String>, SessionError>;

    fn save(&self, identity: &str, snapshot: String) -> Result<(), SessionError>;

    fn clear(&self, identity: &str) -> Result<(), SessionError>;

    /// Atomic read-modify-write of one identity's snapshot.
    ///
    /// `f` gets the stored snapshot (if any) and returns the snapshot to
    /// store plus a value handed back to the caller. Nothing is written if
    /// `f` fails.
    fn update<T, F>(&self, identity: &str, f: F) -> Result<T, SessionError>
    where
        F: FnOnce(Option<&str>) -> Result<(String, T), SessionError>;
}

/// A stored snapshot and its bookkeeping.
#[derive(Debug, Clone)]
pub struct StoredSession {
    pub snapshot: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl StoredSession {
    fn new(snapshot: String) -> Self {
        let now = chrono::Utc::now();
        Self {
            snapshot,
            created_at: now,
            updated_at: now,
        }
    }

    fn replace(&mut self, snapshot: String) {
        self.snapshot = snapshot;
        self.updated_at = chrono::Utc::now();
    }
}

/// In-process store. One mutex guards every session.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, StoredSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, StoredSession>>, SessionError> {
        self.sessions
            .lock()
            .map_err(|e| SessionError::StoreUnavailable(e.to_string()))
    }

    /// Get a copy of a stored session.
    pub fn get(&self, identity: &str) -> Result<Option<StoredSession>, SessionError> {
        Ok(self.lock()?.get(identity).cloned())
    }

    /// Count stored sessions.
    pub fn count(&self) -> Result<usize, SessionError> {
        Ok(self.lock()?.len())
    }

    /// Drop sessions not updated within `max_idle`.
    pub fn cleanup_idle(&self, max_idle: chrono::Duration) -> Result<Vec<String>, SessionError> {
        let mut sessions = self.lock()?;
        let cutoff = chrono::Utc::now() - max_idle;

        let idle: Vec<String> = sessions
            .iter()
            .filter(|(_, s)| s.updated_at < cutoff)
            .map(|(id, _)| id.clone())
            .collect();

        for id in &idle {
            sessions.remove(id);
        }

        if !idle.is_empty() {
            tracing::debug!(count = idle.len(), "Removed idle lobby sessions");
        }
        Ok(idle)
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self, identity: &str) -> Result<Option<String>, SessionError> {
        Ok(self.lock()?.get(identity).map(|s| s.snapshot.clone()))
    }

    fn save(&self, identity: &str, snapshot: String) -> Result<(), SessionError> {
        let mut sessions = self.lock()?;
        match sessions.get_mut(identity) {
            Some(existing) => existing.replace(snapshot),
            None => {
                sessions.insert(identity.to_string(), StoredSession::new(snapshot));
            }
        }
        Ok(())
    }

    fn clear(&self, identity: &str) -> Result<(), SessionError> {
        self.lock()?.remove(identity);
        Ok(())
    }

    fn update<T, F>(&self, identity: &str, f: F) -> Result<T, SessionError>
    where
        F: FnOnce(Option<&str>) -> Result<(String, T), SessionError>,
    {
        let mut sessions = self.lock()?;
        let current = sessions.get(identity).map(|s| s.snapshot.as_str());
        let (snapshot, value) = f(current)?;

        match sessions.get_mut(identity) {
            Some(existing) => existing.replace(snapshot),
            None => {
                sessions.insert(identity.to_string(), StoredSession::new(snapshot));
            }
        }
        Ok(value)
    }
}

/// Lobby operations on top of a session store.
#[derive(Debug)]
pub struct LobbySessions<S> {
    store: S,
    interpreter: Interpreter,
    config: LobbyConfig,
}

impl<S: SessionStore> LobbySessions<S> {
    pub fn new(store: S, config: LobbyConfig) -> Self {
        let interpreter = Interpreter::new(LobbyMachine::new(config.clone()));
        Self {
            store,
            interpreter,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Make up a code for a new lobby.
    pub fn create_lobby(&self) -> String {
        let code = generate_lobby_code_with_rng(&mut rand::rng(), self.config.code_length);
        tracing::info!(lobby = %code, "Created lobby code");
        code
    }

    /// Check a code someone typed in and return its canonical form.
    pub fn join_lobby(&self, input: &str) -> Result<String, SessionError> {
        normalize_lobby_code(input, self.config.code_length)
    }

    /// Current snapshot for `code`, created and stored on first sight.
    ///
    /// A stored snapshot for a different lobby is replaced by a fresh one.
    pub fn lobby_state(&self, identity: &str, code: &str) -> Result<LobbySnapshot, SessionError> {
        self.modify(identity, code, Ok)
    }

    /// Fail unless the lobby is currently in `expected`.
    pub fn require_phase(
        &self,
        identity: &str,
        code: &str,
        expected: Phase,
    ) -> Result<LobbySnapshot, SessionError> {
        let snapshot = self.lobby_state(identity, code)?;
        if !snapshot.matches(expected) {
            return Err(SessionError::WrongPhase {
                expected,
                actual: snapshot.phase(),
            });
        }
        Ok(snapshot)
    }

    /// Run an event against the stored snapshot and store the result.
    pub fn send_event(
        &self,
        identity: &str,
        code: &str,
        event: &LobbyEvent,
    ) -> Result<LobbySnapshot, SessionError> {
        self.modify(identity, code, |snapshot| {
            Ok(self.interpreter.send(snapshot, event)?)
        })
    }

    /// Join as a new player with `nickname`.
    pub fn join_game(
        &self,
        identity: &str,
        code: &str,
        nickname: &str,
    ) -> Result<LobbySnapshot, SessionError> {
        let nickname = nickname.trim();
        if nickname.is_empty() {
            return Err(SessionError::EmptyNickname);
        }

        self.modify(identity, code, |snapshot| {
            if snapshot.lobby().nickname_taken(nickname) {
                return Err(SessionError::NicknameTaken(nickname.to_string()));
            }
            let event = LobbyEvent::JoinGame {
                player: Player::new(nickname),
            };
            Ok(self.interpreter.send(snapshot, &event)?)
        })
    }

    /// Forget this identity's lobby.
    pub fn reset(&self, identity: &str) -> Result<(), SessionError> {
        tracing::debug!(identity, "Resetting lobby session");
        self.store.clear(identity)
    }

    fn modify<F>(&self, identity: &str, code: &str, f: F) -> Result<LobbySnapshot, SessionError>
    where
        F: FnOnce(LobbySnapshot) -> Result<LobbySnapshot, SessionError>,
    {
        self.store.update(identity, |stored| {
            let current = match stored {
                Some(json) => {
                    let snapshot = LobbySnapshot::from_json(json)?;
                    if snapshot.lobby().code == code {
                        snapshot
                    } else {
                        tracing::debug!(
                            identity,
                            from = %snapshot.lobby().code,
                            to = %code,
                            "Session switched lobbies"
                        );
                        self.interpreter.start(code)?
                    }
                }
                None => self.interpreter.start(code)?,
            };

            let next = f(current)?;
            Ok((next.to_json()?, next))
        })
    }
}
