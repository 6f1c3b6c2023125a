//! Ledger Engine
//!
//! Merkle-gated minting, cumulative prize claims and atomic group mints.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    LEDGER ENGINE                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  guard.rs       - Owner gate + pause gate                   │
//! │  mint_gate.rs   - Academy: one-shot allowlist mint          │
//! │  claims.rs      - PrizeDistributor: cumulative claims       │
//! │  multi_mint.rs  - ClubMinter: club + squad, all or nothing  │
//! │  registry.rs    - Club / player registries (collaborators)  │
//! │  bank.rs        - Native + token balances (collaborator)    │
//! │  state.rs       - All subsystems + call dispatch            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Atomicity
//!
//! [`Ledger::submit`] runs each call against a staged clone of the state
//! with a private event buffer. Success swaps the clone in and appends the
//! events under the next sequence number; failure drops both.

pub mod bank;
pub mod claims;
pub mod error;
pub mod events;
pub mod guard;
pub mod mint_gate;
pub mod multi_mint;
pub mod ports;
pub mod registry;
pub mod state;
pub mod tx;

use alloy_primitives::{Address, U256};
use tracing::{debug, instrument, warn};

use crate::config::LedgerConfig;
use crate::core::hash::StateHash;
use crate::core::types::Wei;
use crate::proof::commitment::CommitmentRoot;

pub use bank::{Bank, TransferError};
pub use claims::{ClaimLedger, PrizeDistributor};
pub use error::{ErrorKind, LedgerError};
pub use events::{EventLog, EventRecord, LedgerEvent};
pub use guard::AccessGuard;
pub use mint_gate::Academy;
pub use multi_mint::{squad_item_key, ClubMinter};
pub use ports::{AssetLedger, Env, Treasury};
pub use registry::{ClubRegistry, PlayerRegistry, RegistryDirectory, RegistryError};
pub use state::LedgerState;
pub use tx::{Call, CallOutput, Commitment, Receipt, RegistryKind, RegistrySlot, Subsystem, Tx};

/// Transaction host: live state plus committed event log.
#[derive(Clone, Debug, Default)]
pub struct Ledger {
    state: LedgerState,
    log: EventLog,
}

impl Ledger {
    /// Host over an existing state with an empty log.
    pub fn new(state: LedgerState) -> Self {
        Self {
            state,
            log: EventLog::new(),
        }
    }

    /// Host over the genesis state of `config`.
    pub fn genesis(config: &LedgerConfig) -> Self {
        Self::new(LedgerState::genesis(config))
    }

    /// Reassemble from persisted parts.
    pub fn from_parts(state: LedgerState, log: EventLog) -> Self {
        Self { state, log }
    }

    /// Execute one transaction atomically.
    #[instrument(skip_all, fields(caller = %tx.caller, op = call.name()))]
    pub fn submit(&mut self, tx: Tx, call: Call) -> Result<Receipt, LedgerError> {
        let mut staged = self.state.clone();
        let mut events = Vec::new();

        match staged.execute(&tx, &call, &mut events) {
            Ok(output) => {
                self.state = staged;
                let sequence = self.log.append(&events);
                debug!(
                    sequence,
                    events = events.len(),
                    state_hash = %hex::encode(self.state.compute_hash()),
                    "committed"
                );
                Ok(Receipt {
                    sequence,
                    output,
                    events,
                })
            }
            Err(err) => {
                warn!(kind = %err.kind(), error = %err, "rejected");
                Err(err)
            }
        }
    }

    /// Undo every commit after `sequence`, restoring `state` as captured at
    /// that sequence.
    pub fn rollback(&mut self, state: LedgerState, sequence: u64) {
        warn!(from = self.log.sequence(), to = sequence, "rolling back");
        self.state = state;
        self.log.truncate(sequence);
    }

    /// Mint native currency outside any transaction (funding and tests).
    pub fn credit_native(&mut self, account: Address, amount: Wei) {
        self.state.bank.credit_native(account, amount);
    }

    /// Mint tokens outside any transaction (funding and tests).
    pub fn credit_token(&mut self, token: Address, account: Address, amount: U256) {
        self.state.bank.credit_token(token, account, amount);
    }

    /// Live state.
    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    /// Committed event log.
    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// Sequence of the last committed transaction.
    pub fn sequence(&self) -> u64 {
        self.log.sequence()
    }

    /// Events committed after `sequence`.
    pub fn events_since(&self, sequence: u64) -> &[EventRecord] {
        self.log.since(sequence)
    }

    /// A commitment root.
    pub fn root(&self, commitment: Commitment) -> &CommitmentRoot {
        self.state.root(commitment)
    }

    /// Native balance.
    pub fn balance(&self, account: Address) -> Wei {
        self.state.balance(account)
    }

    /// ETH prize claimed so far.
    pub fn claimed_eth(&self, account: Address) -> U256 {
        self.state.prizes.eth_claimed(account)
    }

    /// Token prize claimed so far.
    pub fn claimed_token(&self, token: Address, account: Address) -> U256 {
        self.state.prizes.token_claimed(token, account)
    }

    /// Digest of the live state.
    pub fn state_hash(&self) -> StateHash {
        self.state.compute_hash()
    }
}
