//! # Squad Ledger
//!
//! Merkle-gated minting and cumulative prize claims for club and player assets.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    SQUAD LEDGER                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Primitives                               │
//! │  ├── hash.rs     - keccak helpers + state digests           │
//! │  └── types.rs    - Wei, ClubId, TokenId                     │
//! │                                                             │
//! │  proof/          - Commitment proofs                        │
//! │  ├── merkle.rs   - Sorted-pair verifier + tree builder      │
//! │  ├── leaf.rs     - Canonical leaf hashing                   │
//! │  └── commitment.rs - Rotatable roots                        │
//! │                                                             │
//! │  ledger/         - Subsystems + atomic transactions         │
//! │  ├── mint_gate.rs  - Allowlist one-shot mint                │
//! │  ├── claims.rs     - Cumulative prize claims                │
//! │  ├── multi_mint.rs - Club + squad group mint                │
//! │  └── mod.rs        - Staged commit / rollback               │
//! │                                                             │
//! │  network/        - Transaction submission (non-determ.)     │
//! │  ├── auth.rs     - JWT caller attestation                   │
//! │  ├── protocol.rs - Message types                            │
//! │  └── server.rs   - WebSocket server                         │
//! │                                                             │
//! │  config.rs       - Genesis configuration                    │
//! │  store.rs        - Durable snapshots                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Transactions
//!
//! Every state change is a [`ledger::Call`] submitted through
//! [`Ledger::submit`]. A call either commits all of its effects and events
//! under one sequence number or leaves no trace at all.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod ledger;
pub mod network;
pub mod proof;
pub mod store;

// Re-export commonly used types
pub use config::LedgerConfig;
pub use ledger::{Call, CallOutput, ErrorKind, Ledger, LedgerError, LedgerEvent, Receipt, Tx};
pub use proof::{AllowlistLeaf, CommitmentRoot, EthPrizeLeaf, MerkleTree, TokenPrizeLeaf};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Players minted alongside each club
pub const SQUAD_SIZE: u32 = 20;
