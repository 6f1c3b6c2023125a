//! Access Guard
//!
//! Owner gate and pause gate, composed onto every mutating operation.
//! State machine: `Active ⇄ Paused`, initial `Active`. Re-pausing a paused
//! subsystem or re-activating an active one is accepted and reports no change.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::core::hash::StateHasher;
use crate::ledger::error::LedgerError;

/// Single administrator plus paused flag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGuard {
    admin: Address,
    paused: bool,
}

impl AccessGuard {
    /// Create an active guard owned by `admin`.
    pub fn new(admin: Address) -> Self {
        Self { admin, paused: false }
    }

    /// Current administrator.
    pub fn admin(&self) -> Address {
        self.admin
    }

    /// Whether claim and mint operations are blocked.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Fail with `NotOwner` unless `caller` is the administrator.
    #[inline]
    pub fn ensure_owner(&self, caller: Address) -> Result<(), LedgerError> {
        if caller == self.admin {
            Ok(())
        } else {
            Err(LedgerError::NotOwner { caller })
        }
    }

    /// Fail with `ContractPaused` while paused.
    #[inline]
    pub fn ensure_active(&self) -> Result<(), LedgerError> {
        if self.paused {
            Err(LedgerError::ContractPaused)
        } else {
            Ok(())
        }
    }

    /// Pause. Returns whether the state changed.
    pub fn pause(&mut self, caller: Address) -> Result<bool, LedgerError> {
        self.ensure_owner(caller)?;
        let changed = !self.paused;
        self.paused = true;
        Ok(changed)
    }

    /// Resume. Returns whether the state changed.
    pub fn activate(&mut self, caller: Address) -> Result<bool, LedgerError> {
        self.ensure_owner(caller)?;
        let changed = self.paused;
        self.paused = false;
        Ok(changed)
    }

    /// Hand administration to `new_admin`. Returns the previous admin.
    pub fn transfer_ownership(
        &mut self,
        caller: Address,
        new_admin: Address,
    ) -> Result<Address, LedgerError> {
        self.ensure_owner(caller)?;
        let previous = self.admin;
        self.admin = new_admin;
        Ok(previous)
    }

    /// Feed this guard into a state digest.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_address(&self.admin);
        hasher.update_bool(self.paused);
    }
}
