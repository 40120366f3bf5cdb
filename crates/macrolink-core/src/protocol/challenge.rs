//! Shared-secret challenge/response primitives.
//!
//! The responder proves that the initiator knows the shared secret without
//! the secret ever crossing the wire:
//!
//! ```text
//! Responder                                 Initiator
//! ─────────                                 ─────────
//! c = generate_challenge()   ── c ──►
//!                            ◄── h ──       h = hash_challenge(c, secret)
//! validate_response(h, c, secret)
//!                            ── AUTH_SUCCESS / AUTH_FAILED ──►
//! ```
//!
//! The digest is keyed but not a MAC construction and the channel is not
//! encrypted afterwards; this only gates who may drive the responder.

use rand::{rngs::OsRng, Rng};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Token sent by the responder when the digest matched.
pub const AUTH_SUCCESS: &str = "AUTH_SUCCESS";

/// Token sent by the responder when the digest did not match.
pub const AUTH_FAILED: &str = "AUTH_FAILED";

/// Number of decimal digits in a challenge.
pub const CHALLENGE_DIGITS: usize = 6;

/// Generates a fresh 6-digit numeric challenge from the OS CSPRNG.
pub fn generate_challenge() -> String {
    let n: u32 = OsRng.gen_range(100_000..1_000_000);
    n.to_string()
}

/// Lowercase hex SHA-256 of `challenge ++ secret`.
///
/// # Examples
///
/// ```rust
/// use macrolink_core::protocol::challenge::{hash_challenge, validate_response};
///
/// let digest = hash_challenge("123456", "secret");
/// assert_eq!(digest.len(), 64);
/// assert!(validate_response(&digest, "123456", "secret"));
/// ```
pub fn hash_challenge(challenge: &str, secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(challenge.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Returns `true` when `response` equals `hash_challenge(challenge, secret)`.
///
/// The comparison runs in constant time over equal-length inputs.
pub fn validate_response(response: &str, challenge: &str, secret: &str) -> bool {
    let expected = hash_challenge(challenge, secret);
    response.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Returns `true` when `challenge` has the shape the responder produces.
pub fn is_well_formed_challenge(challenge: &str) -> bool {
    !challenge.is_empty() && challenge.bytes().all(|b| b.is_ascii_digit())
}
