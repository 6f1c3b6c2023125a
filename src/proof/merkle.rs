//! Merkle Tree Commitments
//!
//! Binary keccak-256 Merkle tree with sorted-pair node hashing.
//! Because every parent is `keccak256(min(a, b) ++ max(a, b))`, a proof is a
//! plain list of sibling hashes and verification never needs left/right flags.

use alloy_primitives::B256;

use crate::core::hash::keccak_concat;
use crate::proof::leaf::Leaf;

/// Combine two child nodes into their parent (order independent).
#[inline]
pub fn hash_pair(a: &B256, b: &B256) -> B256 {
    if a <= b {
        keccak_concat(a.as_slice(), b.as_slice())
    } else {
        keccak_concat(b.as_slice(), a.as_slice())
    }
}

/// Fold a proof onto a leaf hash and return the resulting root.
pub fn process_proof(leaf: B256, proof: &[B256]) -> B256 {
    proof
        .iter()
        .fold(leaf, |current, sibling| hash_pair(&current, sibling))
}

/// Verify a leaf hash against a root using a sorted-pair proof.
///
/// Pure function; the only failure mode is returning `false`.
#[inline]
pub fn verify(leaf: B256, proof: &[B256], root: B256) -> bool {
    process_proof(leaf, proof) == root
}

/// Sorted-pair Merkle tree, used to generate roots and proofs off-chain.
///
/// Leaves keep their insertion order. An unpaired node at the end of a level
/// is promoted unchanged to the next level.
#[derive(Clone, Debug, Default)]
pub struct MerkleTree {
    /// All tree levels (leaves at index 0, root at last index).
    levels: Vec<Vec<B256>>,
}

impl MerkleTree {
    /// Build a tree from pre-hashed leaves.
    pub fn new(leaves: Vec<B256>) -> Self {
        let mut tree = Self { levels: Vec::new() };
        tree.build(leaves);
        tree
    }

    /// Build a tree from typed leaves.
    pub fn from_leaves<L: Leaf>(leaves: &[L]) -> Self {
        Self::new(leaves.iter().map(Leaf::leaf_hash).collect())
    }

    fn build(&mut self, leaves: Vec<B256>) {
        self.levels.clear();
        if leaves.is_empty() {
            return;
        }

        let mut current_level = leaves;
        while current_level.len() > 1 {
            let next_level: Vec<B256> = current_level
                .chunks(2)
                .map(|chunk| match chunk {
                    [left, right] => hash_pair(left, right),
                    [single] => *single,
                    _ => unreachable!("chunks(2) yields one or two nodes"),
                })
                .collect();

            self.levels.push(current_level);
            current_level = next_level;
        }
        self.levels.push(current_level);
    }

    /// Root hash. `B256::ZERO` for an empty tree.
    pub fn root(&self) -> B256 {
        self.levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or(B256::ZERO)
    }

    /// Number of leaves in the tree.
    pub fn leaf_count(&self) -> usize {
        self.levels.first().map_or(0, Vec::len)
    }

    /// Leaf hashes in insertion order.
    pub fn leaves(&self) -> &[B256] {
        self.levels.first().map(Vec::as_slice).unwrap_or_default()
    }

    /// Tree depth (number of hashing levels above the leaves).
    pub fn depth(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }

    /// Generate an inclusion proof for the leaf at `index`.
    ///
    /// Returns None if index is out of bounds.
    pub fn proof(&self, index: usize) -> Option<Vec<B256>> {
        if index >= self.leaf_count() {
            return None;
        }

        let mut siblings = Vec::with_capacity(self.depth());
        let mut current_index = index;

        for level in &self.levels[..self.depth()] {
            let sibling_index = current_index ^ 1;
            if let Some(sibling) = level.get(sibling_index) {
                siblings.push(*sibling);
            }
            current_index /= 2;
        }

        Some(siblings)
    }

    /// Generate a proof for the first leaf with the given hash.
    pub fn proof_for(&self, leaf_hash: &B256) -> Option<Vec<B256>> {
        let index = self.leaves().iter().position(|leaf| leaf == leaf_hash)?;
        self.proof(index)
    }

    /// Generate a proof for a typed leaf.
    pub fn proof_for_leaf<L: Leaf>(&self, leaf: &L) -> Option<Vec<B256>> {
        self.proof_for(&leaf.leaf_hash())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hash::keccak256;

    fn leaf(i: u64) -> B256 {
        keccak256(i.to_be_bytes())
    }

    #[test]
    fn test_empty_tree() {
        let tree = MerkleTree::new(Vec::new());
        assert_eq!(tree.root(), B256::ZERO);
        assert_eq!(tree.leaf_count(), 0);
        assert!(tree.proof(0).is_none());
    }

    #[test]
    fn test_single_leaf() {
        let tree = MerkleTree::new(vec![leaf(1)]);

        // Root of a one-leaf tree is the leaf itself
        assert_eq!(tree.root(), leaf(1));
        let proof = tree.proof(0).unwrap();
        assert!(proof.is_empty());
        assert!(verify(leaf(1), &proof, tree.root()));
    }

    #[test]
    fn test_hash_pair_is_commutative() {
        let (a, b) = (leaf(1), leaf(2));
        assert_eq!(hash_pair(&a, &b), hash_pair(&b, &a));
        assert_ne!(hash_pair(&a, &b), hash_pair(&a, &a));
    }

    #[test]
    fn test_merkle_root_determinism() {
        let leaves: Vec<B256> = (0..4).map(leaf).collect();

        let tree1 = MerkleTree::new(leaves.clone());
        let tree2 = MerkleTree::new(leaves);

        assert_eq!(tree1.root(), tree2.root());
    }

    #[test]
    fn test_different_leaves_different_root() {
        let tree1 = MerkleTree::new(vec![leaf(1), leaf(2)]);
        let tree2 = MerkleTree::new(vec![leaf(1), leaf(3)]);

        assert_ne!(tree1.root(), tree2.root());
    }

    #[test]
    fn test_two_leaf_root() {
        let tree = MerkleTree::new(vec![leaf(1), leaf(2)]);
        assert_eq!(tree.root(), hash_pair(&leaf(1), &leaf(2)));
        assert_eq!(tree.proof(0).unwrap(), vec![leaf(2)]);
        assert_eq!(tree.proof(1).unwrap(), vec![leaf(1)]);
    }

    #[test]
    fn test_every_proof_verifies_for_many_sizes() {
        for size in 1..=17u64 {
            let leaves: Vec<B256> = (0..size).map(leaf).collect();
            let tree = MerkleTree::new(leaves.clone());
            let root = tree.root();

            for (i, l) in leaves.iter().enumerate() {
                let proof = tree.proof(i).unwrap();
                assert!(verify(*l, &proof, root), "size {} leaf {}", size, i);
            }
        }
    }

    #[test]
    fn test_odd_number_of_leaves_promotes_last() {
        let tree = MerkleTree::new(vec![leaf(1), leaf(2), leaf(3)]);
        let expected = hash_pair(&hash_pair(&leaf(1), &leaf(2)), &leaf(3));
        assert_eq!(tree.root(), expected);

        // The promoted leaf has a single sibling: the left subtree root
        assert_eq!(tree.proof(2).unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_proof_fails() {
        let leaves: Vec<B256> = (0..4).map(leaf).collect();
        let tree = MerkleTree::new(leaves);
        let proof = tree.proof(0).unwrap();

        // Proof for wrong data should fail
        assert!(!verify(leaf(99), &proof, tree.root()));

        // Proof against the wrong root should fail
        assert!(!verify(leaf(0), &proof, leaf(42)));

        // Truncated proof should fail
        assert!(!verify(leaf(0), &proof[..1], tree.root()));
    }

    #[test]
    fn test_single_bit_flip_in_proof_fails() {
        let leaves: Vec<B256> = (0..8).map(leaf).collect();
        let tree = MerkleTree::new(leaves);
        let proof = tree.proof(5).unwrap();

        for i in 0..proof.len() {
            for bit in [0usize, 7, 128, 255] {
                let mut tampered = proof.clone();
                tampered[i].0[bit / 8] ^= 1 << (bit % 8);
                assert!(!verify(leaf(5), &tampered, tree.root()));
            }
        }
    }

    #[test]
    fn test_proof_out_of_bounds() {
        let tree = MerkleTree::new(vec![leaf(1), leaf(2)]);
        assert!(tree.proof(10).is_none());
    }

    #[test]
    fn test_proof_for_hash_lookup() {
        let tree = MerkleTree::new((0..5).map(leaf).collect());
        assert_eq!(tree.proof_for(&leaf(3)), tree.proof(3));
        assert!(tree.proof_for(&leaf(77)).is_none());
    }

    #[test]
    fn test_large_tree() {
        let leaves: Vec<B256> = (0..100).map(leaf).collect();
        let tree = MerkleTree::new(leaves.clone());
        let root = tree.root();

        assert_eq!(tree.depth(), 7);
        for i in [0, 50, 99] {
            let proof = tree.proof(i).unwrap();
            assert!(verify(leaves[i], &proof, root));
        }
    }
}
