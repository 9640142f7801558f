//! Players and their guesses.
//!
//! Player records are created outside the machine (when someone picks a
//! nickname) and then handed to it in a join event. From there on the
//! machine owns them: the only mutation is appending guesses.

use serde::{Deserialize, Serialize};

use super::code::generate_player_id;

/// Opaque player identifier, unique within a lobby.
pub type PlayerId = String;

/// Highest score a guess may carry.
pub const MAX_SCORE_GUESS: u8 = 10;

/// A single guess at a movie's score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guess {
    /// Movie being guessed
    pub movie_id: String,

    /// The player's estimate, expected in `0..=10`
    pub score_guess: u8,

    /// The revealed score, once known
    pub actual_score: Option<f64>,
}

impl Guess {
    pub fn new(movie_id: String, score_guess: u8, actual_score: Option<f64>) -> Self {
        Self {
            movie_id,
            score_guess,
            actual_score,
        }
    }

    /// Absolute distance from the revealed score, if revealed.
    ///
    /// A non-finite score counts as unrevealed.
    pub fn error(&self) -> Option<f64> {
        self.actual_score
            .filter(|actual| actual.is_finite())
            .map(|actual| (f64::from(self.score_guess) - actual).abs())
    }
}

/// A participant in a lobby.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,

    /// Display name
    pub nickname: String,

    /// Guesses in the order they were made
    #[serde(default)]
    pub guesses: Vec<Guess>,

    /// When this player record was created
    pub joined_at: chrono::DateTime<chrono::Utc>,
}

impl Player {
    /// Create a player with a freshly generated id.
    pub fn new(nickname: impl Into<String>) -> Self {
        Self::with_id(generate_player_id(), nickname)
    }

    /// Create a player with a known id (for restoring state and tests).
    pub fn with_id(id: impl Into<PlayerId>, nickname: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            nickname: nickname.into(),
            guesses: Vec::new(),
            joined_at: chrono::Utc::now(),
        }
    }

    pub fn record_guess(&mut self, guess: Guess) {
        self.guesses.push(guess);
    }

    /// Sum of absolute errors over revealed guesses.
    ///
    /// `None` when the player has no revealed guess yet.
    pub fn total_error(&self) -> Option<f64> {
        self.guesses
            .iter()
            .filter_map(Guess::error)
            .fold(None, |acc, e| Some(acc.unwrap_or(0.0) + e))
    }
}

/// Turn raw form input into a score guess.
///
/// Anything that is not a non-negative number becomes 0; larger values are
/// capped at [`MAX_SCORE_GUESS`].
pub fn clamp_score_guess(raw: &str) -> u8 {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => {
            value.min(f64::from(MAX_SCORE_GUESS)) as u8
        }
        Ok(value) if value == f64::INFINITY => MAX_SCORE_GUESS,
        _ => 0,
    }
}
