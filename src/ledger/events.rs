//! Ledger Events
//!
//! Structured events emitted by committed transactions. Events are threaded
//! through each operation as an output buffer and appended to the
//! [`EventLog`] only when the transaction commits.

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

use crate::core::types::{ClubId, TokenId, Wei};
use crate::ledger::tx::{Commitment, RegistrySlot};

/// One observable side effect.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// A commitment root was rotated.
    RootChanged {
        /// Subsystem contract address.
        contract: Address,
        /// Which root.
        commitment: Commitment,
        /// New root value.
        root: B256,
        /// Version after rotation.
        version: u64,
    },
    /// Subsystem paused.
    Paused {
        /// Subsystem contract address.
        contract: Address,
        /// Admin that paused it.
        account: Address,
    },
    /// Subsystem resumed.
    Unpaused {
        /// Subsystem contract address.
        contract: Address,
        /// Admin that resumed it.
        account: Address,
    },
    /// Administration handed over.
    OwnershipTransferred {
        /// Subsystem contract address.
        contract: Address,
        /// Previous admin.
        previous_owner: Address,
        /// New admin.
        new_owner: Address,
    },
    /// Allowlisted player minted through the academy.
    PlayerMinted {
        /// Owning subject id from the leaf.
        subject_id: U256,
        /// Item slot identifier.
        item_key: String,
        /// Recipient (the caller).
        to: Address,
        /// Player token id.
        token_id: TokenId,
        /// Price paid.
        price: Wei,
    },
    /// Native prize claim; `amount` may be zero.
    ClaimEth {
        /// Beneficiary.
        account: Address,
        /// Delta paid.
        amount: U256,
    },
    /// Token prize claim; `amount` may be zero.
    ClaimToken {
        /// Token paid out.
        token: Address,
        /// Beneficiary.
        account: Address,
        /// Delta paid.
        amount: U256,
    },
    /// Club and its starting squad minted.
    ClubMinted {
        /// Club id.
        club_id: ClubId,
        /// Recipient of the group.
        to: Address,
        /// Player tokens in slot order.
        player_tokens: Vec<TokenId>,
    },
    /// Registry ownership change (mint when `from` is zero).
    Transfer {
        /// Registry contract address.
        registry: Address,
        /// Previous owner.
        from: Address,
        /// New owner.
        to: Address,
        /// Token id within the registry.
        token_id: U256,
    },
    /// Academy balance withdrawn.
    Withdrawal {
        /// Subsystem contract address.
        contract: Address,
        /// Receiving admin.
        to: Address,
        /// Amount moved.
        amount: Wei,
    },
    /// Registry pointer rewired.
    RegistryAddressChanged {
        /// Which pointer.
        slot: RegistrySlot,
        /// New address.
        address: Address,
    },
    /// Minter capability granted.
    MinterGranted {
        /// Registry contract address.
        registry: Address,
        /// Component granted.
        minter: Address,
    },
    /// Minter capability revoked.
    MinterRevoked {
        /// Registry contract address.
        registry: Address,
        /// Component revoked.
        minter: Address,
    },
    /// Value moved by a `fund` call.
    Funded {
        /// Payer.
        from: Address,
        /// Recipient.
        target: Address,
        /// Amount moved.
        amount: Wei,
    },
}

impl LedgerEvent {
    /// Event type name.
    pub fn name(&self) -> &'static str {
        match self {
            LedgerEvent::RootChanged { .. } => "root_changed",
            LedgerEvent::Paused { .. } => "paused",
            LedgerEvent::Unpaused { .. } => "unpaused",
            LedgerEvent::OwnershipTransferred { .. } => "ownership_transferred",
            LedgerEvent::PlayerMinted { .. } => "player_minted",
            LedgerEvent::ClaimEth { .. } => "claim_eth",
            LedgerEvent::ClaimToken { .. } => "claim_token",
            LedgerEvent::ClubMinted { .. } => "club_minted",
            LedgerEvent::Transfer { .. } => "transfer",
            LedgerEvent::Withdrawal { .. } => "withdrawal",
            LedgerEvent::RegistryAddressChanged { .. } => "registry_address_changed",
            LedgerEvent::MinterGranted { .. } => "minter_granted",
            LedgerEvent::MinterRevoked { .. } => "minter_revoked",
            LedgerEvent::Funded { .. } => "funded",
        }
    }
}

/// Event with its position in the log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Transaction sequence that emitted the event.
    pub sequence: u64,
    /// Position within that transaction.
    pub index: u32,
    /// The event.
    pub event: LedgerEvent,
}

/// Append-only, sequenced event log.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    records: Vec<EventRecord>,
    sequence: u64,
}

impl EventLog {
    /// Empty log at sequence 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence of the last committed transaction.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Commit one transaction's events under the next sequence number.
    ///
    /// Transactions without events still consume a sequence number.
    pub fn append(&mut self, events: &[LedgerEvent]) -> u64 {
        self.sequence += 1;
        let sequence = self.sequence;
        self.records.extend(events.iter().enumerate().map(|(index, event)| EventRecord {
            sequence,
            index: index as u32,
            event: event.clone(),
        }));
        sequence
    }

    /// Drop every transaction after `sequence`.
    pub fn truncate(&mut self, sequence: u64) {
        if sequence >= self.sequence {
            return;
        }
        let end = self.records.partition_point(|record| record.sequence <= sequence);
        self.records.truncate(end);
        self.sequence = sequence;
    }

    /// All records.
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Records from transactions after `sequence`.
    pub fn since(&self, sequence: u64) -> &[EventRecord] {
        let start = self.records.partition_point(|record| record.sequence <= sequence);
        &self.records[start..]
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
