//! Lobby codes and player ids.
//!
//! Codes are opaque labels to the machine. This module only produces them
//! and checks what users type in when joining.

use rand::prelude::*;

use super::config::LOBBY_CODE_LENGTH;
use super::session::SessionError;

/// Alphabet for lobby codes (upper-case alphanumerics).
const CODE_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Alphabet for player ids (URL-safe).
const ID_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz_-";

/// Length of generated player ids.
pub const PLAYER_ID_LENGTH: usize = 8;

fn random_string<R: Rng>(rng: &mut R, alphabet: &[u8], len: usize) -> String {
    (0..len)
        .map(|_| alphabet[rng.random_range(0..alphabet.len())] as char)
        .collect()
}

/// Generate a new lobby code.
pub fn generate_lobby_code() -> String {
    generate_lobby_code_with_rng(&mut rand::rng(), LOBBY_CODE_LENGTH)
}

/// Generate a lobby code using a specific RNG (for testing/seeding).
pub fn generate_lobby_code_with_rng<R: Rng>(rng: &mut R, len: usize) -> String {
    random_string(rng, CODE_ALPHABET, len)
}

/// Generate a new player id.
pub fn generate_player_id() -> String {
    random_string(&mut rand::rng(), ID_ALPHABET, PLAYER_ID_LENGTH)
}

/// Validate a user-supplied lobby code and return its canonical form.
///
/// Codes are case-insensitive and must be exactly `len` ASCII alphanumerics.
pub fn normalize_lobby_code(input: &str, len: usize) -> Result<String, SessionError> {
    let trimmed = input.trim();
    if trimmed.len() != len || !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(SessionError::InvalidLobbyCode(input.to_string()));
    }
    Ok(trimmed.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generated_code_shape() {
        let code = generate_lobby_code();
        assert_eq!(code.len(), LOBBY_CODE_LENGTH);
        assert!(code
            .bytes()
            .all(|b| b.is_ascii_digit() || b.is_ascii_uppercase()));
        // Generated codes must pass our own validation
        assert_eq!(normalize_lobby_code(&code, LOBBY_CODE_LENGTH).unwrap(), code);
    }

    #[test]
    fn test_seeded_codes_repeat() {
        let a = generate_lobby_code_with_rng(&mut StdRng::seed_from_u64(7), 8);
        let b = generate_lobby_code_with_rng(&mut StdRng::seed_from_u64(7), 8);
        assert_eq!(a, b);
    }

    #[test]
    fn test_player_id_shape() {
        let id = generate_player_id();
        assert_eq!(id.len(), PLAYER_ID_LENGTH);
        assert!(id.bytes().all(|b| ID_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_lobby_code("abcd1234", 8).unwrap(), "ABCD1234");
        assert_eq!(normalize_lobby_code(" ABCD1234 ", 8).unwrap(), "ABCD1234");

        assert!(matches!(
            normalize_lobby_code("abc", 8),
            Err(SessionError::InvalidLobbyCode(_))
        ));
        assert!(normalize_lobby_code("abcd-234", 8).is_err());
        assert!(normalize_lobby_code("abcd12345", 8).is_err());
    }
}
