//! Transactions, calls and receipts.

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

use crate::core::types::{ClubId, TokenId, Wei};
use crate::ledger::events::LedgerEvent;
use crate::proof::leaf::AllowlistLeaf;

/// Authenticated caller plus attached native currency.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tx {
    /// Attested caller identity.
    pub caller: Address,
    /// Native currency attached to the call.
    pub value: Wei,
}

impl Tx {
    /// Call without value.
    pub fn from(caller: Address) -> Self {
        Self {
            caller,
            value: U256::ZERO,
        }
    }

    /// Attach value.
    pub fn with_value(mut self, value: Wei) -> Self {
        self.value = value;
        self
    }
}

/// Subsystem with its own guard and contract address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subsystem {
    /// Allowlist mint gate.
    Academy,
    /// Cumulative prize claims.
    PrizeDistributor,
    /// Atomic club + squad mint.
    ClubMinter,
    /// Club asset registry.
    ClubRegistry,
    /// Player asset registry.
    PlayerRegistry,
}

/// Independent commitment root instances.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Commitment {
    /// Academy allowlist.
    Allowlist,
    /// Native-currency prize schedule.
    EthPrize,
    /// Token prize schedule.
    TokenPrize,
}

impl Commitment {
    /// Subsystem that owns this root.
    pub fn owner(&self) -> Subsystem {
        match self {
            Commitment::Allowlist => Subsystem::Academy,
            Commitment::EthPrize | Commitment::TokenPrize => Subsystem::PrizeDistributor,
        }
    }
}

/// Rewireable registry pointers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrySlot {
    /// Player registry used by the academy.
    AcademyPlayers,
    /// Player registry used by the club minter.
    MinterPlayers,
    /// Club registry used by the club minter.
    MinterClubs,
}

impl RegistrySlot {
    /// Subsystem whose admin may rewire this slot.
    pub fn owner(&self) -> Subsystem {
        match self {
            RegistrySlot::AcademyPlayers => Subsystem::Academy,
            RegistrySlot::MinterPlayers | RegistrySlot::MinterClubs => Subsystem::ClubMinter,
        }
    }
}

/// Asset registry selector for capability grants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryKind {
    /// Club registry.
    Clubs,
    /// Player registry.
    Players,
}

impl RegistryKind {
    /// Subsystem backing this registry.
    pub fn subsystem(&self) -> Subsystem {
        match self {
            RegistryKind::Clubs => Subsystem::ClubRegistry,
            RegistryKind::Players => Subsystem::PlayerRegistry,
        }
    }
}

/// Every callable operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Call {
    /// Replace a commitment root (admin).
    RotateRoot {
        /// Which root.
        commitment: Commitment,
        /// New root value.
        root: B256,
    },
    /// Pause a subsystem (admin).
    Pause {
        /// Target subsystem.
        subsystem: Subsystem,
    },
    /// Resume a subsystem (admin).
    Activate {
        /// Target subsystem.
        subsystem: Subsystem,
    },
    /// Hand a subsystem to a new admin (admin).
    TransferOwnership {
        /// Target subsystem.
        subsystem: Subsystem,
        /// New administrator.
        new_admin: Address,
    },
    /// One-shot allowlist mint (payable).
    ClaimAllowlistMint {
        /// Allowlisted leaf.
        leaf: AllowlistLeaf,
        /// Sibling path.
        proof: Vec<B256>,
    },
    /// Cumulative native-currency prize claim.
    ClaimEthPrize {
        /// Beneficiary; must equal the caller.
        account: Address,
        /// Running total entitlement.
        cumulative_amount: U256,
        /// Sibling path.
        proof: Vec<B256>,
    },
    /// Cumulative token prize claim.
    ClaimTokenPrize {
        /// Token paid out.
        token: Address,
        /// Beneficiary; must equal the caller.
        account: Address,
        /// Running total entitlement.
        cumulative_amount: U256,
        /// Sibling path.
        proof: Vec<B256>,
    },
    /// Mint a club and its starting squad (admin).
    MintGroup {
        /// Owner of every minted asset.
        recipient: Address,
        /// Primary asset id.
        club_id: ClubId,
    },
    /// Drain the academy balance to its admin (admin).
    Withdraw,
    /// Rewire a registry pointer, unchecked (admin).
    SetRegistryAddress {
        /// Which pointer.
        slot: RegistrySlot,
        /// New registry address.
        address: Address,
    },
    /// Add a minter to a registry's capability table (registry admin).
    GrantMinter {
        /// Target registry.
        registry: RegistryKind,
        /// Component allowed to mint.
        minter: Address,
    },
    /// Remove a minter from a registry's capability table (registry admin).
    RevokeMinter {
        /// Target registry.
        registry: RegistryKind,
        /// Component losing the role.
        minter: Address,
    },
    /// Move attached value to `target` (payable).
    Fund {
        /// Recipient of the value.
        target: Address,
    },
}

impl Call {
    /// Operation name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Call::RotateRoot { .. } => "rotate_root",
            Call::Pause { .. } => "pause",
            Call::Activate { .. } => "activate",
            Call::TransferOwnership { .. } => "transfer_ownership",
            Call::ClaimAllowlistMint { .. } => "claim_allowlist_mint",
            Call::ClaimEthPrize { .. } => "claim_eth_prize",
            Call::ClaimTokenPrize { .. } => "claim_token_prize",
            Call::MintGroup { .. } => "mint_group",
            Call::Withdraw => "withdraw",
            Call::SetRegistryAddress { .. } => "set_registry_address",
            Call::GrantMinter { .. } => "grant_minter",
            Call::RevokeMinter { .. } => "revoke_minter",
            Call::Fund { .. } => "fund",
        }
    }

    /// Whether value may be attached.
    pub fn is_payable(&self) -> bool {
        matches!(self, Call::ClaimAllowlistMint { .. } | Call::Fund { .. })
    }
}

/// Result payload of a committed call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CallOutput {
    /// Nothing to report.
    None,
    /// Allowlist mint produced a player token.
    Minted {
        /// New token id.
        token_id: TokenId,
    },
    /// Prize delta paid (possibly zero).
    Paid {
        /// Amount transferred.
        amount: U256,
    },
    /// Club and squad minted.
    GroupMinted {
        /// Club id.
        club_id: ClubId,
        /// Player token ids in slot order.
        player_tokens: Vec<TokenId>,
    },
    /// Academy balance drained.
    Withdrawn {
        /// Amount transferred (zero when nothing was held).
        amount: Wei,
    },
}

/// Outcome of a committed transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Position in the global transaction order.
    pub sequence: u64,
    /// Call result.
    pub output: CallOutput,
    /// Events emitted by this transaction.
    pub events: Vec<LedgerEvent>,
}
