//! Core primitives.
//!
//! Hashing and the value types every other layer is written against.

pub mod hash;
pub mod types;

// Re-export core types
pub use hash::{keccak256, StateHash, StateHasher};
pub use types::{ether, milliether, Address, ClubId, TokenId, Wei, B256, U256};
