//! Short identifier generation

use rand::Rng;

/// Alphabet for generated identifiers. URL-safe, no escaping needed.
pub const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Length of generated identifiers. 62^7 ids keep the collision odds
/// negligible relative to expected volume.
pub const SHORT_ID_LEN: usize = 7;

/// Generate a random short identifier.
///
/// No uniqueness check happens here; the storage layer rejects a
/// colliding id with [`crate::storage::StorageError::Conflict`].
pub fn generate() -> String {
    let mut rng = rand::rng();
    (0..SHORT_ID_LEN)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}
