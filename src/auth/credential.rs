//! Room credential hashing and comparison
//!
//! Secrets are never stored or compared in cleartext. A secret is reduced to
//! the base64 encoding of its SHA-512 hash, and digests are compared in
//! constant time.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha512};

/// Comparable one-way digest of a room secret
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Digest(String);

/// Hash a secret into a comparable digest. Deterministic and one-way.
pub fn digest(secret: &str) -> Digest {
    let hash = Sha512::digest(secret.as_bytes());
    Digest(STANDARD.encode(hash))
}

impl Digest {
    /// Compare two digests without leaking a match prefix through timing.
    /// A length mismatch returns early; digests produced here are all the
    /// same length.
    pub fn matches(&self, other: &Digest) -> bool {
        constant_time_eq(self.0.as_bytes(), other.0.as_bytes())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (byte_a, byte_b) in a.iter().zip(b.iter()) {
        result |= byte_a ^ byte_b;
    }

    result == 0
}
