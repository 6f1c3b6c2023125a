//! Academy: allowlist one-shot mint.
//!
//! Each allowlisted item key can be minted exactly once, for exactly its
//! listed price, by presenting a proof against the active allowlist root.
//! Minted flags survive root rotation.

use std::collections::BTreeSet;

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::hash::StateHasher;
use crate::core::types::{TokenId, Wei};
use crate::ledger::error::LedgerError;
use crate::ledger::events::LedgerEvent;
use crate::ledger::guard::AccessGuard;
use crate::ledger::ports::Env;
use crate::ledger::tx::{Commitment, RegistrySlot};
use crate::proof::commitment::CommitmentRoot;
use crate::proof::leaf::AllowlistLeaf;

/// Allowlist mint gate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Academy {
    address: Address,
    guard: AccessGuard,
    root: CommitmentRoot,
    minted: BTreeSet<String>,
    players_registry: Address,
}

impl Academy {
    /// Create the gate with an initial root.
    pub fn new(address: Address, admin: Address, root: B256, players_registry: Address) -> Self {
        Self {
            address,
            guard: AccessGuard::new(admin),
            root: CommitmentRoot::new(root),
            minted: BTreeSet::new(),
            players_registry,
        }
    }

    /// Contract address; payments accumulate here.
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

    /// Active allowlist root.
    pub fn root(&self) -> &CommitmentRoot {
        &self.root
    }

    /// Player registry mints are sent to.
    pub fn players_registry(&self) -> Address {
        self.players_registry
    }

    /// Whether `item_key` has been minted.
    pub fn is_minted(&self, item_key: &str) -> bool {
        self.minted.contains(item_key)
    }

    /// Rotate the allowlist root (admin).
    pub fn rotate_root(
        &mut self,
        caller: Address,
        new_root: B256,
        events: &mut Vec<LedgerEvent>,
    ) -> Result<(), LedgerError> {
        self.guard.ensure_owner(caller)?;
        let rotation = self.root.rotate(new_root);
        events.push(LedgerEvent::RootChanged {
            contract: self.address,
            commitment: Commitment::Allowlist,
            root: rotation.current,
            version: rotation.version,
        });
        Ok(())
    }

    /// Rewire the player registry pointer (admin, unchecked).
    pub fn set_players_registry(
        &mut self,
        caller: Address,
        registry: Address,
        events: &mut Vec<LedgerEvent>,
    ) -> Result<(), LedgerError> {
        self.guard.ensure_owner(caller)?;
        self.players_registry = registry;
        events.push(LedgerEvent::RegistryAddressChanged {
            slot: RegistrySlot::AcademyPlayers,
            address: registry,
        });
        Ok(())
    }

    /// Claim one allowlisted item.
    ///
    /// The attached value must already sit in the academy balance when this
    /// runs; it is kept there on success. Checks run in order: pause, proof,
    /// exact payment, already-minted.
    pub fn claim(
        &mut self,
        env: &mut Env<'_>,
        leaf: &AllowlistLeaf,
        proof: &[B256],
    ) -> Result<TokenId, LedgerError> {
        self.guard.ensure_active()?;

        if !self.root.verify(leaf, proof) {
            return Err(LedgerError::InvalidProof);
        }

        let paid = env.tx.value;
        if paid != leaf.price {
            return Err(LedgerError::InsufficientPayment {
                expected: leaf.price,
                paid,
            });
        }

        if self.minted.contains(&leaf.item_key) {
            return Err(LedgerError::AlreadyMinted {
                item_key: leaf.item_key.clone(),
            });
        }
        self.minted.insert(leaf.item_key.clone());

        let to = env.caller();
        let token_id = env.assets.mint_player(
            self.players_registry,
            self.address,
            to,
            &leaf.item_key,
            env.events,
        )?;

        debug!(item_key = %leaf.item_key, %to, token_id, "allowlist mint");
        env.emit(LedgerEvent::PlayerMinted {
            subject_id: leaf.subject_id,
            item_key: leaf.item_key.clone(),
            to,
            token_id,
            price: leaf.price,
        });
        Ok(token_id)
    }

    /// Send the whole accumulated balance to the admin (admin).
    ///
    /// A zero balance is a no-op that emits nothing.
    pub fn withdraw(&mut self, env: &mut Env<'_>) -> Result<Wei, LedgerError> {
        self.guard.ensure_owner(env.caller())?;

        let amount = env.treasury.balance(self.address);
        if amount == U256::ZERO {
            return Ok(amount);
        }

        let admin = self.guard.admin();
        env.treasury.transfer_native(self.address, admin, amount)?;
        env.emit(LedgerEvent::Withdrawal {
            contract: self.address,
            to: admin,
            amount,
        });
        Ok(amount)
    }

    /// Feed this subsystem into a state digest.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_address(&self.address);
        self.guard.hash_into(hasher);
        self.root.hash_into(hasher);
        hasher.update_address(&self.players_registry);
        hasher.update_u64(self.minted.len() as u64);
        for key in &self.minted {
            hasher.update_str(key);
        }
    }
}
