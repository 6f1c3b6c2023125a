//! Ledger State
//!
//! Every subsystem plus the collaborator ledgers, and the dispatch of one
//! call against them. Dispatch mutates in place; the host runs it against a
//! staged clone so a failed call leaves the live state untouched.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::LedgerConfig;
use crate::core::hash::{StateHash, StateHasher};
use crate::ledger::bank::Bank;
use crate::ledger::claims::PrizeDistributor;
use crate::ledger::error::LedgerError;
use crate::ledger::events::LedgerEvent;
use crate::ledger::guard::AccessGuard;
use crate::ledger::mint_gate::Academy;
use crate::ledger::multi_mint::ClubMinter;
use crate::ledger::ports::{Env, Treasury};
use crate::ledger::registry::{ClubRegistry, PlayerRegistry, RegistryDirectory};
use crate::ledger::tx::{Call, CallOutput, Commitment, RegistryKind, Subsystem, Tx};
use crate::proof::commitment::CommitmentRoot;

/// Complete ledger state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    /// Allowlist mint gate.
    pub academy: Academy,
    /// Prize claims.
    pub prizes: PrizeDistributor,
    /// Group mint orchestrator.
    pub minter: ClubMinter,
    /// Asset registries.
    pub registries: RegistryDirectory,
    /// Balances.
    pub bank: Bank,
}

impl LedgerState {
    // =========================================================================
    // GENESIS
    // =========================================================================

    /// Build the initial state described by `config`.
    pub fn genesis(config: &LedgerConfig) -> Self {
        let admin = config.admin;
        let contracts = &config.contracts;

        let mut clubs = ClubRegistry::new(contracts.club_registry, admin);
        let mut players = PlayerRegistry::new(contracts.player_registry, admin);
        if config.grant_default_minters {
            // Admin is the registry owner, so these grants cannot fail
            let _ = clubs.grant_minter(admin, contracts.club_minter);
            let _ = players.grant_minter(admin, contracts.club_minter);
            let _ = players.grant_minter(admin, contracts.academy);
        }

        let mut bank = Bank::new();
        for entry in &config.genesis {
            match entry.token {
                Some(token) => bank.credit_token(token, entry.account, entry.amount),
                None => bank.credit_native(entry.account, entry.amount),
            }
        }

        Self {
            academy: Academy::new(
                contracts.academy,
                admin,
                config.allowlist_root,
                contracts.player_registry,
            ),
            prizes: PrizeDistributor::new(
                contracts.prize_distributor,
                admin,
                config.eth_prize_root,
                config.token_prize_root,
            ),
            minter: ClubMinter::new(
                contracts.club_minter,
                admin,
                contracts.player_registry,
                contracts.club_registry,
                config.squad_size,
            ),
            registries: RegistryDirectory::new(clubs, players),
            bank,
        }
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Contract address of a subsystem.
    pub fn address_of(&self, subsystem: Subsystem) -> Address {
        match subsystem {
            Subsystem::Academy => self.academy.address(),
            Subsystem::PrizeDistributor => self.prizes.address(),
            Subsystem::ClubMinter => self.minter.address(),
            Subsystem::ClubRegistry => self.registries.clubs.address(),
            Subsystem::PlayerRegistry => self.registries.players.address(),
        }
    }

    /// Guard of a subsystem.
    pub fn guard(&self, subsystem: Subsystem) -> &AccessGuard {
        match subsystem {
            Subsystem::Academy => self.academy.guard(),
            Subsystem::PrizeDistributor => self.prizes.guard(),
            Subsystem::ClubMinter => self.minter.guard(),
            Subsystem::ClubRegistry => self.registries.clubs.guard(),
            Subsystem::PlayerRegistry => self.registries.players.guard(),
        }
    }

    fn guard_mut(&mut self, subsystem: Subsystem) -> (Address, &mut AccessGuard) {
        let address = self.address_of(subsystem);
        let guard = match subsystem {
            Subsystem::Academy => self.academy.guard_mut(),
            Subsystem::PrizeDistributor => self.prizes.guard_mut(),
            Subsystem::ClubMinter => self.minter.guard_mut(),
            Subsystem::ClubRegistry => self.registries.clubs.guard_mut(),
            Subsystem::PlayerRegistry => self.registries.players.guard_mut(),
        };
        (address, guard)
    }

    /// A commitment root.
    pub fn root(&self, commitment: Commitment) -> &CommitmentRoot {
        match commitment {
            Commitment::Allowlist => self.academy.root(),
            Commitment::EthPrize => self.prizes.eth_root(),
            Commitment::TokenPrize => self.prizes.token_root(),
        }
    }

    /// Native balance of `account`.
    pub fn balance(&self, account: Address) -> U256 {
        self.bank.balance(account)
    }

    // =========================================================================
    // DISPATCH
    // =========================================================================

    /// Execute one call in place, appending emitted events to `events`.
    ///
    /// On error the state may be partially modified; callers run this on a
    /// staged copy.
    pub fn execute(
        &mut self,
        tx: &Tx,
        call: &Call,
        events: &mut Vec<LedgerEvent>,
    ) -> Result<CallOutput, LedgerError> {
        let caller = tx.caller;

        if !tx.value.is_zero() {
            if !call.is_payable() {
                return Err(LedgerError::UnexpectedValue { value: tx.value });
            }
            let target = match call {
                Call::Fund { target } => *target,
                _ => self.academy.address(),
            };
            self.bank.transfer_native(caller, target, tx.value)?;
        }

        match call {
            Call::RotateRoot { commitment, root } => {
                match commitment.owner() {
                    Subsystem::Academy => self.academy.rotate_root(caller, *root, events)?,
                    _ => self.prizes.rotate_root(caller, *commitment, *root, events)?,
                }
                info!(?commitment, %root, "root rotated");
                Ok(CallOutput::None)
            }

            Call::Pause { subsystem } => {
                let (contract, guard) = self.guard_mut(*subsystem);
                if guard.pause(caller)? {
                    info!(?subsystem, "paused");
                    events.push(LedgerEvent::Paused { contract, account: caller });
                }
                Ok(CallOutput::None)
            }

            Call::Activate { subsystem } => {
                let (contract, guard) = self.guard_mut(*subsystem);
                if guard.activate(caller)? {
                    info!(?subsystem, "activated");
                    events.push(LedgerEvent::Unpaused { contract, account: caller });
                }
                Ok(CallOutput::None)
            }

            Call::TransferOwnership { subsystem, new_admin } => {
                let (contract, guard) = self.guard_mut(*subsystem);
                let previous_owner = guard.transfer_ownership(caller, *new_admin)?;
                info!(?subsystem, %new_admin, "ownership transferred");
                events.push(LedgerEvent::OwnershipTransferred {
                    contract,
                    previous_owner,
                    new_owner: *new_admin,
                });
                Ok(CallOutput::None)
            }

            Call::ClaimAllowlistMint { leaf, proof } => {
                let mut env = Env {
                    tx,
                    assets: &mut self.registries,
                    treasury: &mut self.bank,
                    events,
                };
                let token_id = self.academy.claim(&mut env, leaf, proof)?;
                Ok(CallOutput::Minted { token_id })
            }

            Call::ClaimEthPrize { account, cumulative_amount, proof } => {
                let mut env = Env {
                    tx,
                    assets: &mut self.registries,
                    treasury: &mut self.bank,
                    events,
                };
                let amount = self
                    .prizes
                    .claim_eth(&mut env, *account, *cumulative_amount, proof)?;
                Ok(CallOutput::Paid { amount })
            }

            Call::ClaimTokenPrize { token, account, cumulative_amount, proof } => {
                let mut env = Env {
                    tx,
                    assets: &mut self.registries,
                    treasury: &mut self.bank,
                    events,
                };
                let amount = self
                    .prizes
                    .claim_token(&mut env, *token, *account, *cumulative_amount, proof)?;
                Ok(CallOutput::Paid { amount })
            }

            Call::MintGroup { recipient, club_id } => {
                let mut env = Env {
                    tx,
                    assets: &mut self.registries,
                    treasury: &mut self.bank,
                    events,
                };
                let player_tokens = self.minter.mint_group(&mut env, *recipient, *club_id)?;
                info!(%club_id, %recipient, "club minted");
                Ok(CallOutput::GroupMinted {
                    club_id: *club_id,
                    player_tokens,
                })
            }

            Call::Withdraw => {
                let mut env = Env {
                    tx,
                    assets: &mut self.registries,
                    treasury: &mut self.bank,
                    events,
                };
                let amount = self.academy.withdraw(&mut env)?;
                info!(%amount, "academy withdrawal");
                Ok(CallOutput::Withdrawn { amount })
            }

            Call::SetRegistryAddress { slot, address } => {
                match slot.owner() {
                    Subsystem::Academy => {
                        self.academy.set_players_registry(caller, *address, events)?
                    }
                    _ => self.minter.set_registry(caller, *slot, *address, events)?,
                }
                info!(?slot, %address, "registry address changed");
                Ok(CallOutput::None)
            }

            Call::GrantMinter { registry, minter } => {
                let granted = match registry {
                    RegistryKind::Clubs => self.registries.clubs.grant_minter(caller, *minter)?,
                    RegistryKind::Players => self.registries.players.grant_minter(caller, *minter)?,
                };
                if granted {
                    events.push(LedgerEvent::MinterGranted {
                        registry: self.address_of(registry.subsystem()),
                        minter: *minter,
                    });
                }
                Ok(CallOutput::None)
            }

            Call::RevokeMinter { registry, minter } => {
                let revoked = match registry {
                    RegistryKind::Clubs => self.registries.clubs.revoke_minter(caller, *minter)?,
                    RegistryKind::Players => self.registries.players.revoke_minter(caller, *minter)?,
                };
                if revoked {
                    events.push(LedgerEvent::MinterRevoked {
                        registry: self.address_of(registry.subsystem()),
                        minter: *minter,
                    });
                }
                Ok(CallOutput::None)
            }

            Call::Fund { target } => {
                events.push(LedgerEvent::Funded {
                    from: caller,
                    target: *target,
                    amount: tx.value,
                });
                Ok(CallOutput::None)
            }
        }
    }

    // =========================================================================
    // HASHING
    // =========================================================================

    /// Deterministic digest of the whole state.
    pub fn compute_hash(&self) -> StateHash {
        let mut hasher = StateHasher::for_ledger_state();
        self.academy.hash_into(&mut hasher);
        self.prizes.hash_into(&mut hasher);
        self.minter.hash_into(&mut hasher);
        self.registries.hash_into(&mut hasher);
        self.bank.hash_into(&mut hasher);
        hasher.finalize()
    }
}

impl Default for LedgerState {
    fn default() -> Self {
        Self::genesis(&LedgerConfig::default())
    }
}

// =============================================================================
// TESTS
// =============================================================================
