//! Prize Distributor
//!
//! Cumulative, replay-safe prize claims. Leaves state a running total
//! entitlement; the ledger pays only the part not yet claimed. Claimed
//! amounts are keyed independently of the root, so rotating to a schedule
//! with higher totals pays exactly the difference.

use std::collections::BTreeMap;

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::hash::StateHasher;
use crate::ledger::error::LedgerError;
use crate::ledger::events::LedgerEvent;
use crate::ledger::guard::AccessGuard;
use crate::ledger::ports::Env;
use crate::ledger::tx::Commitment;
use crate::proof::commitment::CommitmentRoot;
use crate::proof::leaf::{EthPrizeLeaf, TokenPrizeLeaf};

/// Claimed-so-far bookkeeping for one key space.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimLedger<K: Ord> {
    claimed: BTreeMap<K, U256>,
}

impl<K: Ord> ClaimLedger<K> {
    /// Amount already claimed for `key` (zero if never claimed).
    pub fn claimed(&self, key: &K) -> U256 {
        self.claimed.get(key).copied().unwrap_or_default()
    }

    /// Record a claim against a cumulative entitlement and return the delta
    /// owed. Never underflows: a stale or lower entitlement yields zero.
    pub fn settle(&mut self, key: K, cumulative: U256) -> U256 {
        let claimed = self.claimed.entry(key).or_default();
        let delta = cumulative.saturating_sub(*claimed);
        *claimed = (*claimed).max(cumulative);
        delta
    }

    /// Iterate recorded claims in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &U256)> {
        self.claimed.iter()
    }

    /// Number of keys with a record.
    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    /// Whether nothing has been claimed.
    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }
}

/// ETH and token prize claims under two independent roots.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizeDistributor {
    address: Address,
    guard: AccessGuard,
    eth_root: CommitmentRoot,
    token_root: CommitmentRoot,
    eth_claims: ClaimLedger<Address>,
    /// token -> per-account claims
    token_claims: BTreeMap<Address, ClaimLedger<Address>>,
}

impl PrizeDistributor {
    /// Create the distributor with initial roots.
    pub fn new(address: Address, admin: Address, eth_root: B256, token_root: B256) -> Self {
        Self {
            address,
            guard: AccessGuard::new(admin),
            eth_root: CommitmentRoot::new(eth_root),
            token_root: CommitmentRoot::new(token_root),
            eth_claims: ClaimLedger::default(),
            token_claims: BTreeMap::new(),
        }
    }

    /// Contract address; prizes are paid from its balances.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Access guard.
    pub fn guard(&self) -> &AccessGuard {
        &self.guard
    }

    pub(crate) fn guard_mut(&mut self) -> &mut AccessGuard {
        &mut self.guard
    }

    /// Active ETH prize root.
    pub fn eth_root(&self) -> &CommitmentRoot {
        &self.eth_root
    }

    /// Active token prize root.
    pub fn token_root(&self) -> &CommitmentRoot {
        &self.token_root
    }

    /// ETH claimed so far by `account`.
    pub fn eth_claimed(&self, account: Address) -> U256 {
        self.eth_claims.claimed(&account)
    }

    /// Tokens claimed so far by `account`.
    pub fn token_claimed(&self, token: Address, account: Address) -> U256 {
        self.token_claims
            .get(&token)
            .map(|claims| claims.claimed(&account))
            .unwrap_or_default()
    }

    /// Rotate one of the two prize roots (admin).
    pub fn rotate_root(
        &mut self,
        caller: Address,
        commitment: Commitment,
        new_root: B256,
        events: &mut Vec<LedgerEvent>,
    ) -> Result<(), LedgerError> {
        self.guard.ensure_owner(caller)?;
        let root = match commitment {
            Commitment::EthPrize => &mut self.eth_root,
            Commitment::TokenPrize => &mut self.token_root,
            Commitment::Allowlist => {
                return Err(LedgerError::WrongSubsystem {
                    resource: format!("{commitment:?}"),
                    owner: commitment.owner(),
                })
            }
        };
        let rotation = root.rotate(new_root);
        events.push(LedgerEvent::RootChanged {
            contract: self.address,
            commitment,
            root: rotation.current,
            version: rotation.version,
        });
        Ok(())
    }

    /// Claim the unpaid part of a native-currency entitlement.
    ///
    /// Emits `ClaimEth` even when nothing is owed.
    pub fn claim_eth(
        &mut self,
        env: &mut Env<'_>,
        account: Address,
        cumulative_amount: U256,
        proof: &[B256],
    ) -> Result<U256, LedgerError> {
        self.guard.ensure_active()?;
        ensure_account(env.caller(), account)?;

        let leaf = EthPrizeLeaf { account, cumulative_amount };
        if !self.eth_root.verify(&leaf, proof) {
            return Err(LedgerError::InvalidProof);
        }

        let amount = self.eth_claims.settle(account, cumulative_amount);
        env.treasury.transfer_native(self.address, account, amount)?;

        debug!(%account, %cumulative_amount, %amount, "eth prize claim");
        env.emit(LedgerEvent::ClaimEth { account, amount });
        Ok(amount)
    }

    /// Claim the unpaid part of a token entitlement.
    ///
    /// Emits `ClaimToken` even when nothing is owed.
    pub fn claim_token(
        &mut self,
        env: &mut Env<'_>,
        token: Address,
        account: Address,
        cumulative_amount: U256,
        proof: &[B256],
    ) -> Result<U256, LedgerError> {
        self.guard.ensure_active()?;
        ensure_account(env.caller(), account)?;

        let leaf = TokenPrizeLeaf { token, account, cumulative_amount };
        if !self.token_root.verify(&leaf, proof) {
            return Err(LedgerError::InvalidProof);
        }

        let amount = self
            .token_claims
            .entry(token)
            .or_default()
            .settle(account, cumulative_amount);
        env.treasury.transfer_token(token, self.address, account, amount)?;

        debug!(%token, %account, %cumulative_amount, %amount, "token prize claim");
        env.emit(LedgerEvent::ClaimToken { token, account, amount });
        Ok(amount)
    }

    /// Feed this subsystem into a state digest.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_address(&self.address);
        self.guard.hash_into(hasher);
        self.eth_root.hash_into(hasher);
        self.token_root.hash_into(hasher);
        hasher.update_u64(self.eth_claims.len() as u64);
        for (account, claimed) in self.eth_claims.iter() {
            hasher.update_address(account);
            hasher.update_u256(claimed);
        }
        hasher.update_u64(self.token_claims.len() as u64);
        for (token, claims) in &self.token_claims {
            hasher.update_address(token);
            hasher.update_u64(claims.len() as u64);
            for (account, claimed) in claims.iter() {
                hasher.update_address(account);
                hasher.update_u256(claimed);
            }
        }
    }
}

fn ensure_account(caller: Address, account: Address) -> Result<(), LedgerError> {
    if caller == account {
        Ok(())
    } else {
        Err(LedgerError::InvalidAccount { caller, account })
    }
}
