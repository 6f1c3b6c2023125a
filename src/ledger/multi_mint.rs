//! Club Minter: atomic club + squad mint.
//!
//! Mints one club and its starting squad to the same recipient. The minter
//! itself holds only two registry pointers; atomicity comes from running the
//! whole call inside the ledger's staged transaction, so a failing sub-mint
//! discards the ones before it.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::hash::StateHasher;
use crate::core::types::{ClubId, TokenId};
use crate::ledger::error::LedgerError;
use crate::ledger::events::LedgerEvent;
use crate::ledger::guard::AccessGuard;
use crate::ledger::ports::Env;
use crate::ledger::tx::RegistrySlot;

/// Item key of squad slot `slot` for `club_id`.
pub fn squad_item_key(club_id: ClubId, slot: u32) -> String {
    format!("{}-{}", club_id, slot)
}

/// Group mint orchestrator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClubMinter {
    address: Address,
    guard: AccessGuard,
    players_registry: Address,
    clubs_registry: Address,
    squad_size: u32,
}

impl ClubMinter {
    /// Create the minter.
    pub fn new(
        address: Address,
        admin: Address,
        players_registry: Address,
        clubs_registry: Address,
        squad_size: u32,
    ) -> Self {
        Self {
            address,
            guard: AccessGuard::new(admin),
            players_registry,
            clubs_registry,
            squad_size,
        }
    }

    /// Contract address; this is the minter identity registries check.
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

    /// Players registry pointer.
    pub fn players_registry(&self) -> Address {
        self.players_registry
    }

    /// Clubs registry pointer.
    pub fn clubs_registry(&self) -> Address {
        self.clubs_registry
    }

    /// Players minted per club.
    pub fn squad_size(&self) -> u32 {
        self.squad_size
    }

    /// Rewire a registry pointer (admin, unchecked).
    pub fn set_registry(
        &mut self,
        caller: Address,
        slot: RegistrySlot,
        registry: Address,
        events: &mut Vec<LedgerEvent>,
    ) -> Result<(), LedgerError> {
        self.guard.ensure_owner(caller)?;
        match slot {
            RegistrySlot::MinterClubs => self.clubs_registry = registry,
            RegistrySlot::MinterPlayers => self.players_registry = registry,
            RegistrySlot::AcademyPlayers => {
                return Err(LedgerError::WrongSubsystem {
                    resource: format!("{slot:?}"),
                    owner: slot.owner(),
                })
            }
        }
        events.push(LedgerEvent::RegistryAddressChanged {
            slot,
            address: registry,
        });
        Ok(())
    }

    /// Mint `club_id` and players `"{club_id}-1"` to `"{club_id}-N"` to
    /// `recipient`, club first. Returns the player token ids in slot order.
    pub fn mint_group(
        &mut self,
        env: &mut Env<'_>,
        recipient: Address,
        club_id: ClubId,
    ) -> Result<Vec<TokenId>, LedgerError> {
        let caller = env.caller();
        if caller != self.guard.admin() {
            return Err(LedgerError::Unauthorized { caller });
        }
        self.guard.ensure_active()?;

        env.assets
            .mint_club(self.clubs_registry, self.address, recipient, club_id, env.events)?;

        let mut player_tokens = Vec::with_capacity(self.squad_size as usize);
        for slot in 1..=self.squad_size {
            let key = squad_item_key(club_id, slot);
            let token_id = env.assets.mint_player(
                self.players_registry,
                self.address,
                recipient,
                &key,
                env.events,
            )?;
            player_tokens.push(token_id);
        }

        debug!(%club_id, %recipient, players = player_tokens.len(), "group mint");
        env.emit(LedgerEvent::ClubMinted {
            club_id,
            to: recipient,
            player_tokens: player_tokens.clone(),
        });
        Ok(player_tokens)
    }

    /// Feed this subsystem into a state digest.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_address(&self.address);
        self.guard.hash_into(hasher);
        hasher.update_address(&self.players_registry);
        hasher.update_address(&self.clubs_registry);
        hasher.update_u64(self.squad_size as u64);
    }
}
