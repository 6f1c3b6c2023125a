//! Rotatable Commitment Roots
//!
//! A commitment root pins the set of valid leaves for one economic
//! subsystem. Rotating it swaps the whole leaf set at once: proofs built for
//! a superseded tree stop verifying immediately.

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

use crate::core::hash::StateHasher;
use crate::proof::leaf::Leaf;
use crate::proof::merkle;

/// One rotatable 32-byte root.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitmentRoot {
    /// Active root value.
    value: B256,
    /// Bumped on every rotation.
    version: u64,
}

/// Record of a single rotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootRotation {
    /// Root that was active before the rotation.
    pub previous: B256,
    /// Root that is active now.
    pub current: B256,
    /// Version after the rotation.
    pub version: u64,
}

impl CommitmentRoot {
    /// Create a root at version 0.
    pub fn new(value: B256) -> Self {
        Self { value, version: 0 }
    }

    /// Active root value.
    pub fn current(&self) -> B256 {
        self.value
    }

    /// Number of rotations applied so far.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Replace the active root unconditionally.
    ///
    /// No check is made that `new_root` belongs to a real tree. Rotating to
    /// the same value still bumps the version.
    pub fn rotate(&mut self, new_root: B256) -> RootRotation {
        let previous = self.value;
        self.value = new_root;
        self.version += 1;
        RootRotation {
            previous,
            current: new_root,
            version: self.version,
        }
    }

    /// Verify a leaf hash against the active root.
    pub fn verify_hash(&self, leaf_hash: B256, proof: &[B256]) -> bool {
        merkle::verify(leaf_hash, proof, self.value)
    }

    /// Verify a typed leaf against the active root.
    pub fn verify<L: Leaf>(&self, leaf: &L, proof: &[B256]) -> bool {
        self.verify_hash(leaf.leaf_hash(), proof)
    }

    /// Feed this root into a state digest.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_b256(&self.value);
        hasher.update_u64(self.version);
    }
}
