//! Ledger error taxonomy.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::Wei;
use crate::ledger::bank::TransferError;
use crate::ledger::registry::RegistryError;
use crate::ledger::tx::Subsystem;

/// Coarse rejection kind reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Caller is not the subsystem administrator.
    NotOwner,
    /// Subsystem is paused.
    ContractPaused,
    /// Proof does not resolve to the active root.
    InvalidProof,
    /// Caller tried to claim for another account.
    InvalidAccount,
    /// Item was already minted.
    AlreadyMinted,
    /// Attached payment does not match the price.
    InsufficientPayment,
    /// Caller lacks the authority for this operation.
    Unauthorized,
    /// A collaborator call failed (unknown registry, missing funds, stray value).
    CallFailed,
}

impl ErrorKind {
    /// Wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotOwner => "not_owner",
            ErrorKind::ContractPaused => "contract_paused",
            ErrorKind::InvalidProof => "invalid_proof",
            ErrorKind::InvalidAccount => "invalid_account",
            ErrorKind::AlreadyMinted => "already_minted",
            ErrorKind::InsufficientPayment => "insufficient_payment",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::CallFailed => "call_failed",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejection of a single transaction. The transaction has no effect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Admin-only operation attempted by someone else.
    #[error("caller {caller} is not the owner")]
    NotOwner {
        /// Rejected caller.
        caller: Address,
    },

    /// Claim or mint attempted while paused.
    #[error("contract is paused")]
    ContractPaused,

    /// Proof does not verify against the active root.
    #[error("invalid merkle proof")]
    InvalidProof,

    /// Prize claim submitted on behalf of another account.
    #[error("caller {caller} cannot claim for account {account}")]
    InvalidAccount {
        /// Authenticated caller.
        caller: Address,
        /// Account named in the claim.
        account: Address,
    },

    /// Allowlisted item already minted.
    #[error("item {item_key} already minted")]
    AlreadyMinted {
        /// Item slot identifier.
        item_key: String,
    },

    /// Attached payment differs from the leaf price.
    #[error("payment mismatch: expected {expected} wei, paid {paid} wei")]
    InsufficientPayment {
        /// Price from the leaf.
        expected: Wei,
        /// Value attached to the transaction.
        paid: Wei,
    },

    /// Group mint attempted by a non-administrator.
    #[error("caller {caller} is not authorized")]
    Unauthorized {
        /// Rejected caller.
        caller: Address,
    },

    /// Value attached to a non-payable call.
    #[error("call is not payable ({value} wei attached)")]
    UnexpectedValue {
        /// Attached value.
        value: U256,
    },

    /// Root or registry slot routed to a subsystem that does not own it.
    #[error("{resource} is managed by {owner:?}")]
    WrongSubsystem {
        /// Commitment or slot name.
        resource: String,
        /// Subsystem that does own it.
        owner: Subsystem,
    },

    /// Asset registry refused the mint.
    #[error("registry call failed: {0}")]
    Registry(#[from] RegistryError),

    /// Currency transfer failed.
    #[error("transfer failed: {0}")]
    Transfer(#[from] TransferError),
}

impl LedgerError {
    /// Map onto the coarse kind reported to callers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::NotOwner { .. } => ErrorKind::NotOwner,
            LedgerError::ContractPaused => ErrorKind::ContractPaused,
            LedgerError::InvalidProof => ErrorKind::InvalidProof,
            LedgerError::InvalidAccount { .. } => ErrorKind::InvalidAccount,
            LedgerError::AlreadyMinted { .. } => ErrorKind::AlreadyMinted,
            LedgerError::InsufficientPayment { .. } => ErrorKind::InsufficientPayment,
            LedgerError::Unauthorized { .. } => ErrorKind::Unauthorized,
            LedgerError::UnexpectedValue { .. } => ErrorKind::CallFailed,
            LedgerError::WrongSubsystem { .. } => ErrorKind::CallFailed,
            LedgerError::Registry(err) => match err {
                RegistryError::MissingMinterRole { .. } => ErrorKind::Unauthorized,
                RegistryError::AlreadyMinted { .. } => ErrorKind::AlreadyMinted,
                RegistryError::Paused { .. } => ErrorKind::ContractPaused,
                RegistryError::UnknownRegistry { .. } => ErrorKind::CallFailed,
            },
            LedgerError::Transfer(_) => ErrorKind::CallFailed,
        }
    }
}
