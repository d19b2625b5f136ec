//! Short timer id generation.
//!
//! Ids are short enough to type into a command by hand. Uniqueness is enforced
//! by checking the store (see [`super::lifecycle`]), not here; with 26^4
//! possible ids and realistic timer counts a collision retry is rare.

use rand::Rng;

/// Fixed id length.
pub const TIMER_ID_LENGTH: usize = 4;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// Generate a candidate id: TIMER_ID_LENGTH lowercase letters, each drawn from
/// a cryptographically secure RNG.
pub fn random_id() -> String {
    let mut rng = rand::rng();
    (0..TIMER_ID_LENGTH)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_has_fixed_length() {
        for _ in 0..100 {
            assert_eq!(random_id().len(), TIMER_ID_LENGTH);
        }
    }

    #[test]
    fn test_id_is_lowercase_ascii() {
        for _ in 0..100 {
            let id = random_id();
            assert!(id.chars().all(|c| c.is_ascii_lowercase()), "bad id: {id}");
        }
    }

    #[test]
    fn test_ids_are_not_constant() {
        let first = random_id();
        // 1000 draws from a 456976-id space all equal to the first would mean
        // the RNG is broken
        assert!((0..1000).any(|_| random_id() != first));
    }
}
