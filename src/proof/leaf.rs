//! Allowlist and prize leaves.
//!
//! Leaf hashes use Solidity parameter ABI encoding so roots produced by
//! standard Ethereum tooling verify here unchanged:
//! - allowlist leaves are double hashed: `keccak256(keccak256(abi.encode(..)))`
//! - prize leaves are hashed once: `keccak256(abi.encode(..))`

use alloy_primitives::{keccak256, Address, B256, U256};
use alloy_sol_types::SolValue;
use serde::{Deserialize, Serialize};

use crate::core::types::Wei;

/// Anything that can sit at the bottom of a commitment tree.
pub trait Leaf {
    /// Canonical 32-byte hash of this leaf.
    fn leaf_hash(&self) -> B256;
}

/// One authorized discrete mint: `(subjectId, itemKey, priceWei)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AllowlistLeaf {
    /// Owning subject (the club the player is minted for).
    pub subject_id: U256,
    /// Item slot identifier, e.g. `"2-1-30"`.
    pub item_key: String,
    /// Exact price to pay, in wei.
    pub price: Wei,
}

impl AllowlistLeaf {
    /// Create a new allowlist leaf.
    pub fn new(subject_id: U256, item_key: impl Into<String>, price: Wei) -> Self {
        Self {
            subject_id,
            item_key: item_key.into(),
            price,
        }
    }
}

impl Leaf for AllowlistLeaf {
    fn leaf_hash(&self) -> B256 {
        let encoded = (self.subject_id, self.item_key.clone(), self.price).abi_encode_params();
        keccak256(keccak256(encoded))
    }
}

/// Native-currency prize entitlement: `(account, cumulativeAmount)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EthPrizeLeaf {
    /// Beneficiary account.
    pub account: Address,
    /// Running total owed as of the root this leaf belongs to.
    pub cumulative_amount: U256,
}

impl Leaf for EthPrizeLeaf {
    fn leaf_hash(&self) -> B256 {
        keccak256((self.account, self.cumulative_amount).abi_encode_params())
    }
}

/// Token-denominated prize entitlement: `(token, account, cumulativeAmount)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenPrizeLeaf {
    /// Token contract the prize is paid in.
    pub token: Address,
    /// Beneficiary account.
    pub account: Address,
    /// Running total owed as of the root this leaf belongs to.
    pub cumulative_amount: U256,
}

impl Leaf for TokenPrizeLeaf {
    fn leaf_hash(&self) -> B256 {
        keccak256((self.token, self.account, self.cumulative_amount).abi_encode_params())
    }
}
