//! Synchronous interpreter.
//!
//! Runs the lobby machine to quiescence: apply at most one external event,
//! then keep taking eager transitions until the machine sits in a terminal
//! phase or one that waits for input.

use std::time::{Duration, Instant};

use super::machine::{LobbyEvent, LobbyMachine, LobbySnapshot, MachineError};

/// Start `machine` at `snapshot` (or its initial snapshot), apply `event`
/// if given, and settle.
///
/// Fails with [`MachineError::SettleTimeout`] if settling needs more than
/// `max_wait`, or stalls in a phase that would never pause. Errors raised
/// by the event itself are passed through.
pub fn run(
    machine: &LobbyMachine,
    max_wait: Duration,
    snapshot: Option<LobbySnapshot>,
    event: Option<&LobbyEvent>,
) -> Result<LobbySnapshot, MachineError> {
    let started = Instant::now();

    let mut state = snapshot.unwrap_or_else(|| machine.initial_snapshot());
    if let Some(event) = event {
        state = machine.apply(&state, event)?;
    }

    let mut hops = 0usize;
    loop {
        match machine.settle_step(&state) {
            None if state.is_quiescent() => {
                tracing::trace!(phase = %state.phase(), hops, "Lobby settled");
                return Ok(state);
            }
            None => break,
            Some(next) => {
                if started.elapsed() >= max_wait {
                    break;
                }
                state = next;
                hops += 1;
            }
        }
    }

    let waited = started.elapsed();
    tracing::warn!(
        lobby = %state.lobby().code,
        phase = %state.phase(),
        hops,
        ?waited,
        "Lobby failed to settle"
    );
    Err(MachineError::SettleTimeout {
        phase: state.phase(),
        waited,
    })
}

/// A machine bundled with its settle timeout.
#[derive(Debug, Clone)]
pub struct Interpreter {
    machine: LobbyMachine,
    max_wait: Duration,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(LobbyMachine::default())
    }
}

impl Interpreter {
    pub fn new(machine: LobbyMachine) -> Self {
        let max_wait = machine.config().settle_timeout();
        Self { machine, max_wait }
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    pub fn machine(&self) -> &LobbyMachine {
        &self.machine
    }

    /// Fresh, settled snapshot for a lobby code.
    pub fn start(&self, code: &str) -> Result<LobbySnapshot, MachineError> {
        run(
            &self.machine,
            self.max_wait,
            Some(LobbySnapshot::new(code)),
            None,
        )
    }

    /// Apply an event to a snapshot and settle.
    pub fn send(
        &self,
        snapshot: LobbySnapshot,
        event: &LobbyEvent,
    ) -> Result<LobbySnapshot, MachineError> {
        run(&self.machine, self.max_wait, Some(snapshot), Some(event))
    }
}
