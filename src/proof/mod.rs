//! Commitment Proofs
//!
//! Authorizes ledger actions without storing the allowlist:
//! - Sorted-pair keccak Merkle verification
//! - Canonical leaf encodings (allowlist, ETH prize, token prize)
//! - Rotatable commitment roots
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PROOF SYSTEM                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  merkle.rs       - Proof verifier + off-chain tree builder  │
//! │  leaf.rs         - ABI-encoded leaf hashing                 │
//! │  commitment.rs   - Rotatable root with version counter      │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod commitment;
pub mod leaf;
pub mod merkle;

// Re-export key types
pub use commitment::{CommitmentRoot, RootRotation};
pub use leaf::{AllowlistLeaf, EthPrizeLeaf, Leaf, TokenPrizeLeaf};
pub use merkle::{hash_pair, verify, MerkleTree};
