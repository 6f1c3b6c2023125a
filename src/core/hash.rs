//! Hashing Primitives
//!
//! Two hash families live here:
//! - keccak-256 for everything that must match the off-chain tree generator
//!   (leaves, pair combination, roots)
//! - SHA-256 state digests for snapshot integrity and replay comparison

use alloy_primitives::{Address, B256, U256};
use sha2::{Digest, Sha256};

pub use alloy_primitives::keccak256;

/// Digest output type (256 bits / 32 bytes).
pub type StateHash = [u8; 32];

/// Deterministic hasher for ledger state.
///
/// Wraps SHA-256 with helpers for ledger types.
/// Order of updates is critical for determinism.
pub struct StateHasher {
    hasher: Sha256,
}

impl StateHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for the full ledger state.
    pub fn for_ledger_state() -> Self {
        Self::new(b"SQUAD_LEDGER_STATE_V1")
    }

    /// Update with a u8 value.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Update with a u64 value (little-endian).
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a boolean.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u8(value as u8);
    }

    /// Update with a 20-byte address.
    #[inline]
    pub fn update_address(&mut self, address: &Address) {
        self.hasher.update(address.as_slice());
    }

    /// Update with a 256-bit integer (big-endian, fixed width).
    #[inline]
    pub fn update_u256(&mut self, value: &U256) {
        self.hasher.update(value.to_be_bytes::<32>());
    }

    /// Update with a 32-byte word.
    #[inline]
    pub fn update_b256(&mut self, value: &B256) {
        self.hasher.update(value.as_slice());
    }

    /// Update with a length-prefixed string.
    pub fn update_str(&mut self, value: &str) {
        self.update_u64(value.len() as u64);
        self.hasher.update(value.as_bytes());
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> StateHash {
        self.hasher.finalize().into()
    }
}

/// keccak-256 over the concatenation of two byte strings.
#[inline]
pub fn keccak_concat(left: &[u8], right: &[u8]) -> B256 {
    let mut buf = Vec::with_capacity(left.len() + right.len());
    buf.extend_from_slice(left);
    buf.extend_from_slice(right);
    keccak256(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_hasher_determinism() {
        let make_hash = || {
            let mut hasher = StateHasher::for_ledger_state();
            hasher.update_u64(12345);
            hasher.update_address(&Address::repeat_byte(0x11));
            hasher.update_u256(&U256::from(7u64));
            hasher.update_str("2-1-30");
            hasher.update_bool(true);
            hasher.finalize()
        };

        assert_eq!(make_hash(), make_hash());
    }

    #[test]
    fn test_hash_order_matters() {
        let hash1 = {
            let mut h = StateHasher::new(b"test");
            h.update_u64(1);
            h.update_u64(2);
            h.finalize()
        };

        let hash2 = {
            let mut h = StateHasher::new(b"test");
            h.update_u64(2);
            h.update_u64(1);
            h.finalize()
        };

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_string_length_prefix_prevents_ambiguity() {
        let hash1 = {
            let mut h = StateHasher::new(b"test");
            h.update_str("ab");
            h.update_str("c");
            h.finalize()
        };

        let hash2 = {
            let mut h = StateHasher::new(b"test");
            h.update_str("a");
            h.update_str("bc");
            h.finalize()
        };

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_keccak_concat_matches_single_buffer() {
        let a = [0xaau8; 32];
        let b = [0xbbu8; 32];
        let mut joined = a.to_vec();
        joined.extend_from_slice(&b);

        assert_eq!(keccak_concat(&a, &b), keccak256(&joined));
        assert_ne!(keccak_concat(&a, &b), keccak_concat(&b, &a));
    }

    #[test]
    fn test_keccak_empty_vector() {
        // Well-known keccak-256 of the empty string.
        let expected: B256 = "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
            .parse()
            .unwrap();
        assert_eq!(keccak256(b""), expected);
    }
}
