//! Full games played through the interpreter.

use std::time::Duration;

use blackjack_state::{
    next_player, run, LobbyConfig, LobbyEvent, LobbyMachine, LobbySnapshot, Phase, Player,
};
use pretty_assertions::assert_eq;

const WAIT: Duration = Duration::from_secs(3);

fn machine() -> LobbyMachine {
    LobbyMachine::new(LobbyConfig::default()).with_code("MOVIE123")
}

fn send(m: &LobbyMachine, s: LobbySnapshot, event: LobbyEvent) -> LobbySnapshot {
    run(m, WAIT, Some(s), Some(&event)).unwrap()
}

fn settle_as(m: &LobbyMachine, s: LobbySnapshot, player: &str) -> LobbySnapshot {
    run(m, WAIT, Some(s.with_current_player(player)), None).unwrap()
}

fn join(id: &str) -> LobbyEvent {
    LobbyEvent::JoinGame {
        player: Player::with_id(id, format!("Player {}", id)),
    }
}

fn guess(score: u8, actual: f64) -> LobbyEvent {
    LobbyEvent::Guess {
        movie_id: "550".to_string(),
        score_guess: score,
        actual_score: Some(actual),
    }
}

#[test]
fn two_player_game() {
    let m = machine();

    let s = run(&m, WAIT, None, None).unwrap();
    assert_eq!(s.phase(), Phase::Pregame);

    let s = send(&m, s, join("p1"));
    let s = send(&m, s, join("p2"));
    assert_eq!(s.lobby().player_count(), 2);

    // p1 starts the game and goes first
    let s = send(&m, s.with_current_player("p1"), LobbyEvent::StartGame);
    assert_eq!(s.lobby().active_player.as_deref(), Some("p1"));
    assert_eq!(s.phase(), Phase::Guessing);

    let s = send(&m, s, guess(6, 7.8));
    assert_eq!(s.phase(), Phase::HitOrStay);

    // Not the last player: turn passes to p2
    let s = send(&m, s, LobbyEvent::Stay);
    assert_eq!(s.phase(), Phase::Spectating);
    assert_eq!(s.lobby().active_player.as_deref(), Some("p2"));

    // Still spectating as p1; p2 picks it up
    let s = settle_as(&m, s, "p1");
    assert_eq!(s.phase(), Phase::Spectating);
    let s = settle_as(&m, s, "p2");
    assert_eq!(s.phase(), Phase::Guessing);

    let s = send(&m, s, guess(8, 7.8));
    assert_eq!(s.phase(), Phase::HitOrStay);

    // p2 is last
    let s = send(&m, s, LobbyEvent::Stay);
    assert_eq!(s.phase(), Phase::Done);
    assert_eq!(s.winner(), Some("p2"));

    // Frozen from here on
    let frozen = send(&m, s.clone(), join("p3"));
    assert_eq!(frozen, s);
}

#[test]
fn hit_refines_the_guess() {
    let m = machine();
    let s = send(&m, run(&m, WAIT, None, None).unwrap(), join("solo"));
    let s = send(&m, s, LobbyEvent::StartGame);
    assert_eq!(s.phase(), Phase::Guessing);

    let s = send(&m, s, guess(3, 6.0));
    let s = send(&m, s, LobbyEvent::Hit);
    assert_eq!(s.phase(), Phase::Guessing);
    let s = send(&m, s, guess(6, 6.0));
    let s = send(&m, s, LobbyEvent::Stay);

    assert_eq!(s.phase(), Phase::Done);
    let solo = s.lobby().get_player("solo").unwrap();
    let scores: Vec<u8> = solo.guesses.iter().map(|g| g.score_guess).collect();
    assert_eq!(scores, vec![3, 6]);
}

#[test]
fn departures_mid_game() {
    let m = machine();
    let mut s = run(&m, WAIT, None, None).unwrap();
    for id in ["a", "b", "c"] {
        s = send(&m, s, join(id));
    }
    let s = send(&m, s.with_current_player("a"), LobbyEvent::StartGame);
    let s = send(&m, s, guess(5, 5.0));
    let s = send(&m, s, LobbyEvent::Stay);
    assert_eq!(s.lobby().active_player.as_deref(), Some("b"));

    // A spectator leaving does not move the turn
    let s = send(&m, s, LobbyEvent::PlayerLeft { player_id: "c".into() });
    assert_eq!(s.lobby().active_player.as_deref(), Some("b"));
    assert_eq!(s.phase(), Phase::Spectating);

    // b is now last, so staying ends the game
    let s = settle_as(&m, s, "b");
    let s = send(&m, s, guess(4, 5.0));
    let s = send(&m, s, LobbyEvent::Stay);
    assert_eq!(s.phase(), Phase::Done);
    assert_eq!(s.winner(), Some("a"));
}

#[test]
fn active_player_leaving_hands_the_turn_on() {
    let m = machine();
    let mut s = run(&m, WAIT, None, None).unwrap();
    for id in ["a", "b"] {
        s = send(&m, s, join(id));
    }
    let s = send(&m, s, LobbyEvent::StartGame);
    assert_eq!(s.lobby().active_player.as_deref(), Some("a"));

    let s = send(&m, s, LobbyEvent::PlayerLeft { player_id: "a".into() });
    assert_eq!(s.lobby().active_player.as_deref(), Some("b"));
    // Evaluated as b (the last joiner), the turn is picked up right away
    assert_eq!(s.phase(), Phase::Guessing);
}

#[test]
fn rotation_returns_to_start() {
    let m = machine();
    let mut s = run(&m, WAIT, None, None).unwrap();
    for id in ["a", "b", "c", "d"] {
        s = send(&m, s, join(id));
    }
    let s = send(&m, s, LobbyEvent::StartGame);

    let mut lobby = s.lobby().clone();
    let start = lobby.active_player.clone();
    for _ in 0..lobby.player_count() {
        lobby.active_player = Some(next_player(&lobby).unwrap().clone());
    }
    assert_eq!(lobby.active_player, start);
}

#[test]
fn snapshot_survives_storage() {
    let m = machine();
    let s = send(&m, run(&m, WAIT, None, None).unwrap(), join("p1"));
    let s = send(&m, s, join("p2"));
    let s = send(&m, s, LobbyEvent::StartGame);

    let restored = LobbySnapshot::from_json(&s.to_json().unwrap()).unwrap();
    assert_eq!(restored, s);

    let next = settle_as(&m, restored, "p1");
    assert_eq!(next.phase(), Phase::Guessing);
}
