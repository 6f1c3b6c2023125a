//! Collaborator ports.
//!
//! The core never writes asset ownership or currency balances directly; it
//! calls into these traits. Both are implemented in-memory
//! ([`RegistryDirectory`](crate::ledger::registry::RegistryDirectory),
//! [`Bank`](crate::ledger::bank::Bank)) and staged together with the rest of
//! the ledger state, so their effects share the transaction boundary.

use alloy_primitives::{Address, U256};

use crate::core::types::{ClubId, TokenId, Wei};
use crate::ledger::bank::TransferError;
use crate::ledger::events::LedgerEvent;
use crate::ledger::registry::RegistryError;
use crate::ledger::tx::Tx;

/// External asset registries, addressed by contract address.
pub trait AssetLedger {
    /// Mint club `club_id` to `to` through the registry at `registry`.
    fn mint_club(
        &mut self,
        registry: Address,
        minter: Address,
        to: Address,
        club_id: ClubId,
        events: &mut Vec<LedgerEvent>,
    ) -> Result<(), RegistryError>;

    /// Mint the player identified by `item_key` to `to`.
    fn mint_player(
        &mut self,
        registry: Address,
        minter: Address,
        to: Address,
        item_key: &str,
        events: &mut Vec<LedgerEvent>,
    ) -> Result<TokenId, RegistryError>;
}

/// Native currency and token balances.
pub trait Treasury {
    /// Native balance of `account`.
    fn balance(&self, account: Address) -> Wei;

    /// Token balance of `account`.
    fn token_balance(&self, token: Address, account: Address) -> U256;

    /// Move native currency.
    fn transfer_native(&mut self, from: Address, to: Address, amount: Wei) -> Result<(), TransferError>;

    /// Move tokens.
    fn transfer_token(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), TransferError>;
}

/// Per-call execution context handed to subsystem operations.
pub struct Env<'a> {
    /// Caller and attached value.
    pub tx: &'a Tx,
    /// Asset registries.
    pub assets: &'a mut dyn AssetLedger,
    /// Balances.
    pub treasury: &'a mut dyn Treasury,
    /// Output buffer for emitted events.
    pub events: &'a mut Vec<LedgerEvent>,
}

impl Env<'_> {
    /// Authenticated caller.
    #[inline]
    pub fn caller(&self) -> Address {
        self.tx.caller
    }

    /// Append an event.
    #[inline]
    pub fn emit(&mut self, event: LedgerEvent) {
        self.events.push(event);
    }
}
