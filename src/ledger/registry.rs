//! Asset Registries
//!
//! In-memory club and player registries. Each registry keeps an explicit
//! capability table of components allowed to mint, checked on every mint.
//! [`RegistryDirectory`] resolves registry calls by contract address, so a
//! rewired pointer that names no registry fails at call time.

use std::collections::{BTreeMap, BTreeSet};

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::hash::StateHasher;
use crate::core::types::{ClubId, TokenId};
use crate::ledger::error::LedgerError;
use crate::ledger::events::LedgerEvent;
use crate::ledger::guard::AccessGuard;
use crate::ledger::ports::AssetLedger;

/// Registry-side mint failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// No registry of the expected type lives at this address.
    #[error("no registry at {address}")]
    UnknownRegistry {
        /// Address that was called.
        address: Address,
    },

    /// Caller is not in the registry's minter table.
    #[error("{minter} lacks the minter role on {registry}")]
    MissingMinterRole {
        /// Registry address.
        registry: Address,
        /// Rejected minter.
        minter: Address,
    },

    /// Token already exists.
    #[error("token {token} already minted on {registry}")]
    AlreadyMinted {
        /// Registry address.
        registry: Address,
        /// Token id or item key.
        token: String,
    },

    /// Registry is paused.
    #[error("registry {registry} is paused")]
    Paused {
        /// Registry address.
        registry: Address,
    },
}

/// Explicit set of components allowed to mint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinterTable {
    minters: BTreeSet<Address>,
}

impl MinterTable {
    /// Whether `minter` holds the role.
    pub fn contains(&self, minter: &Address) -> bool {
        self.minters.contains(minter)
    }

    /// Grant. Returns false if already granted.
    pub fn grant(&mut self, minter: Address) -> bool {
        self.minters.insert(minter)
    }

    /// Revoke. Returns false if not granted.
    pub fn revoke(&mut self, minter: &Address) -> bool {
        self.minters.remove(minter)
    }

    fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u64(self.minters.len() as u64);
        for minter in &self.minters {
            hasher.update_address(minter);
        }
    }
}

/// Club ownership ledger; token ids are chosen by the minter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClubRegistry {
    address: Address,
    guard: AccessGuard,
    minters: MinterTable,
    owners: BTreeMap<ClubId, Address>,
    balances: BTreeMap<Address, u64>,
}

impl ClubRegistry {
    /// Empty registry at `address`.
    pub fn new(address: Address, admin: Address) -> Self {
        Self {
            address,
            guard: AccessGuard::new(admin),
            minters: MinterTable::default(),
            owners: BTreeMap::new(),
            balances: BTreeMap::new(),
        }
    }

    /// Contract address.
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

    /// Minter capability table.
    pub fn minters(&self) -> &MinterTable {
        &self.minters
    }

    /// Owner of a club.
    pub fn owner_of(&self, club_id: ClubId) -> Option<Address> {
        self.owners.get(&club_id).copied()
    }

    /// Number of clubs held by `account`.
    pub fn balance_of(&self, account: Address) -> u64 {
        self.balances.get(&account).copied().unwrap_or(0)
    }

    /// Total clubs minted.
    pub fn total_supply(&self) -> usize {
        self.owners.len()
    }

    /// Grant the minter role (registry admin).
    pub fn grant_minter(&mut self, caller: Address, minter: Address) -> Result<bool, LedgerError> {
        self.guard.ensure_owner(caller)?;
        Ok(self.minters.grant(minter))
    }

    /// Revoke the minter role (registry admin).
    pub fn revoke_minter(&mut self, caller: Address, minter: Address) -> Result<bool, LedgerError> {
        self.guard.ensure_owner(caller)?;
        Ok(self.minters.revoke(&minter))
    }

    /// Mint `club_id` to `to`.
    pub fn mint(
        &mut self,
        minter: Address,
        to: Address,
        club_id: ClubId,
        events: &mut Vec<LedgerEvent>,
    ) -> Result<(), RegistryError> {
        if self.guard.is_paused() {
            return Err(RegistryError::Paused { registry: self.address });
        }
        if !self.minters.contains(&minter) {
            return Err(RegistryError::MissingMinterRole {
                registry: self.address,
                minter,
            });
        }
        if self.owners.contains_key(&club_id) {
            return Err(RegistryError::AlreadyMinted {
                registry: self.address,
                token: club_id.to_string(),
            });
        }

        self.owners.insert(club_id, to);
        *self.balances.entry(to).or_insert(0) += 1;
        events.push(LedgerEvent::Transfer {
            registry: self.address,
            from: Address::ZERO,
            to,
            token_id: club_id,
        });
        Ok(())
    }

    fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_address(&self.address);
        self.guard.hash_into(hasher);
        self.minters.hash_into(hasher);
        hasher.update_u64(self.owners.len() as u64);
        for (club_id, owner) in &self.owners {
            hasher.update_u256(club_id);
            hasher.update_address(owner);
        }
    }
}

/// Player ownership ledger; token ids are sequential from 1 and each item
/// key may be minted once.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRegistry {
    address: Address,
    guard: AccessGuard,
    minters: MinterTable,
    next_token_id: TokenId,
    owners: BTreeMap<TokenId, Address>,
    keys: BTreeMap<String, TokenId>,
    balances: BTreeMap<Address, u64>,
}

impl PlayerRegistry {
    /// Empty registry at `address`.
    pub fn new(address: Address, admin: Address) -> Self {
        Self {
            address,
            guard: AccessGuard::new(admin),
            minters: MinterTable::default(),
            next_token_id: 1,
            owners: BTreeMap::new(),
            keys: BTreeMap::new(),
            balances: BTreeMap::new(),
        }
    }

    /// Contract address.
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

    /// Minter capability table.
    pub fn minters(&self) -> &MinterTable {
        &self.minters
    }

    /// Owner of a player token.
    pub fn owner_of(&self, token_id: TokenId) -> Option<Address> {
        self.owners.get(&token_id).copied()
    }

    /// Token minted for an item key.
    pub fn token_for_key(&self, item_key: &str) -> Option<TokenId> {
        self.keys.get(item_key).copied()
    }

    /// Number of players held by `account`.
    pub fn balance_of(&self, account: Address) -> u64 {
        self.balances.get(&account).copied().unwrap_or(0)
    }

    /// Total players minted.
    pub fn total_supply(&self) -> usize {
        self.owners.len()
    }

    /// Grant the minter role (registry admin).
    pub fn grant_minter(&mut self, caller: Address, minter: Address) -> Result<bool, LedgerError> {
        self.guard.ensure_owner(caller)?;
        Ok(self.minters.grant(minter))
    }

    /// Revoke the minter role (registry admin).
    pub fn revoke_minter(&mut self, caller: Address, minter: Address) -> Result<bool, LedgerError> {
        self.guard.ensure_owner(caller)?;
        Ok(self.minters.revoke(&minter))
    }

    /// Mint the player for `item_key` to `to`.
    pub fn mint(
        &mut self,
        minter: Address,
        to: Address,
        item_key: &str,
        events: &mut Vec<LedgerEvent>,
    ) -> Result<TokenId, RegistryError> {
        if self.guard.is_paused() {
            return Err(RegistryError::Paused { registry: self.address });
        }
        if !self.minters.contains(&minter) {
            return Err(RegistryError::MissingMinterRole {
                registry: self.address,
                minter,
            });
        }
        if self.keys.contains_key(item_key) {
            return Err(RegistryError::AlreadyMinted {
                registry: self.address,
                token: item_key.to_string(),
            });
        }

        let token_id = self.next_token_id;
        self.next_token_id += 1;
        self.owners.insert(token_id, to);
        self.keys.insert(item_key.to_string(), token_id);
        *self.balances.entry(to).or_insert(0) += 1;
        events.push(LedgerEvent::Transfer {
            registry: self.address,
            from: Address::ZERO,
            to,
            token_id: U256::from(token_id),
        });
        Ok(token_id)
    }

    fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_address(&self.address);
        self.guard.hash_into(hasher);
        self.minters.hash_into(hasher);
        hasher.update_u64(self.next_token_id);
        hasher.update_u64(self.keys.len() as u64);
        for (key, token_id) in &self.keys {
            hasher.update_str(key);
            hasher.update_u64(*token_id);
            if let Some(owner) = self.owners.get(token_id) {
                hasher.update_address(owner);
            }
        }
    }
}

/// Both registries, resolved by contract address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryDirectory {
    /// Club registry.
    pub clubs: ClubRegistry,
    /// Player registry.
    pub players: PlayerRegistry,
}

impl RegistryDirectory {
    /// Directory over the two registries.
    pub fn new(clubs: ClubRegistry, players: PlayerRegistry) -> Self {
        Self { clubs, players }
    }

    /// Feed both registries into a state digest.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        self.clubs.hash_into(hasher);
        self.players.hash_into(hasher);
    }
}

impl AssetLedger for RegistryDirectory {
    fn mint_club(
        &mut self,
        registry: Address,
        minter: Address,
        to: Address,
        club_id: ClubId,
        events: &mut Vec<LedgerEvent>,
    ) -> Result<(), RegistryError> {
        if registry != self.clubs.address() {
            return Err(RegistryError::UnknownRegistry { address: registry });
        }
        self.clubs.mint(minter, to, club_id, events)
    }

    fn mint_player(
        &mut self,
        registry: Address,
        minter: Address,
        to: Address,
        item_key: &str,
        events: &mut Vec<LedgerEvent>,
    ) -> Result<TokenId, RegistryError> {
        if registry != self.players.address() {
            return Err(RegistryError::UnknownRegistry { address: registry });
        }
        self.players.mint(minter, to, item_key, events)
    }
}
