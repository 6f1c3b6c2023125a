//! Native and token balances.
//!
//! Reference in-memory [`Treasury`]. Contract subsystems hold their payable
//! balances here under their own addresses.

use std::collections::BTreeMap;

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::hash::StateHasher;
use crate::core::types::Wei;
use crate::ledger::ports::Treasury;

/// Currency transfer failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// Sender lacks native currency.
    #[error("account {account} holds {available} wei, needs {needed}")]
    InsufficientBalance {
        /// Paying account.
        account: Address,
        /// Requested amount.
        needed: U256,
        /// Current balance.
        available: U256,
    },

    /// Sender lacks the token.
    #[error("account {account} holds {available} of token {token}, needs {needed}")]
    InsufficientTokenBalance {
        /// Token contract.
        token: Address,
        /// Paying account.
        account: Address,
        /// Requested amount.
        needed: U256,
        /// Current balance.
        available: U256,
    },
}

/// Balance book keyed by address.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    native: BTreeMap<Address, Wei>,
    /// token -> account -> balance
    tokens: BTreeMap<Address, BTreeMap<Address, U256>>,
}

impl Bank {
    /// Empty bank.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint native currency to `account` (genesis and test funding).
    pub fn credit_native(&mut self, account: Address, amount: Wei) {
        let balance = self.native.entry(account).or_default();
        *balance = balance.saturating_add(amount);
    }

    /// Mint tokens to `account` (genesis and test funding).
    pub fn credit_token(&mut self, token: Address, account: Address, amount: U256) {
        let balance = self.tokens.entry(token).or_default().entry(account).or_default();
        *balance = balance.saturating_add(amount);
    }

    /// Sum of all native balances.
    pub fn total_native(&self) -> Wei {
        self.native
            .values()
            .fold(U256::ZERO, |acc, balance| acc.saturating_add(*balance))
    }

    /// Feed all balances into a state digest.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u64(self.native.len() as u64);
        for (account, balance) in &self.native {
            hasher.update_address(account);
            hasher.update_u256(balance);
        }
        hasher.update_u64(self.tokens.len() as u64);
        for (token, holders) in &self.tokens {
            hasher.update_address(token);
            hasher.update_u64(holders.len() as u64);
            for (account, balance) in holders {
                hasher.update_address(account);
                hasher.update_u256(balance);
            }
        }
    }
}

impl Treasury for Bank {
    fn balance(&self, account: Address) -> Wei {
        self.native.get(&account).copied().unwrap_or_default()
    }

    fn token_balance(&self, token: Address, account: Address) -> U256 {
        self.tokens
            .get(&token)
            .and_then(|holders| holders.get(&account))
            .copied()
            .unwrap_or_default()
    }

    fn transfer_native(&mut self, from: Address, to: Address, amount: Wei) -> Result<(), TransferError> {
        let available = self.balance(from);
        if available < amount {
            return Err(TransferError::InsufficientBalance {
                account: from,
                needed: amount,
                available,
            });
        }
        if amount.is_zero() || from == to {
            return Ok(());
        }
        self.native.insert(from, available - amount);
        self.credit_native(to, amount);
        Ok(())
    }

    fn transfer_token(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), TransferError> {
        let available = self.token_balance(token, from);
        if available < amount {
            return Err(TransferError::InsufficientTokenBalance {
                token,
                account: from,
                needed: amount,
                available,
            });
        }
        if amount.is_zero() || from == to {
            return Ok(());
        }
        self.tokens
            .entry(token)
            .or_default()
            .insert(from, available - amount);
        self.credit_token(token, to, amount);
        Ok(())
    }
}
