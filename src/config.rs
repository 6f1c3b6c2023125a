//! Ledger Configuration
//!
//! Genesis identities, initial roots and balances. Loaded from defaults, then
//! an optional JSON file, then environment overrides.

use std::path::{Path, PathBuf};

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::SQUAD_SIZE;

/// Environment variable naming the JSON config file.
pub const CONFIG_PATH_ENV: &str = "SQUAD_LEDGER_CONFIG";
/// Environment override for the admin address.
pub const ADMIN_ENV: &str = "SQUAD_LEDGER_ADMIN";
/// Environment override for the snapshot path.
pub const SNAPSHOT_ENV: &str = "SQUAD_LEDGER_SNAPSHOT";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("cannot read config {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON for [`LedgerConfig`].
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    /// Environment variable holds a malformed address.
    #[error("{var} is not an address: {value}")]
    InvalidAddress {
        /// Variable name.
        var: &'static str,
        /// Offending value.
        value: String,
    },

    /// Semantic validation failed.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Contract address of every subsystem.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractAddresses {
    /// Allowlist mint gate.
    pub academy: Address,
    /// Prize distributor.
    pub prize_distributor: Address,
    /// Club + squad minter.
    pub club_minter: Address,
    /// Club registry.
    pub club_registry: Address,
    /// Player registry.
    pub player_registry: Address,
}

impl Default for ContractAddresses {
    fn default() -> Self {
        Self {
            academy: Address::with_last_byte(0x01),
            prize_distributor: Address::with_last_byte(0x02),
            club_minter: Address::with_last_byte(0x03),
            club_registry: Address::with_last_byte(0x04),
            player_registry: Address::with_last_byte(0x05),
        }
    }
}

impl ContractAddresses {
    fn all(&self) -> [Address; 5] {
        [
            self.academy,
            self.prize_distributor,
            self.club_minter,
            self.club_registry,
            self.player_registry,
        ]
    }
}

/// One genesis balance entry. Native currency when `token` is absent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisBalance {
    /// Holder.
    pub account: Address,
    /// Token contract, or native currency when absent.
    #[serde(default)]
    pub token: Option<Address>,
    /// Amount in base units.
    pub amount: U256,
}

/// Full ledger configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Initial admin of every subsystem.
    pub admin: Address,
    /// Subsystem contract addresses.
    pub contracts: ContractAddresses,
    /// Initial academy allowlist root.
    pub allowlist_root: B256,
    /// Initial ETH prize root.
    pub eth_prize_root: B256,
    /// Initial token prize root.
    pub token_prize_root: B256,
    /// Players minted per club by the group mint.
    pub squad_size: u32,
    /// Grant the club minter (both registries) and the academy (player
    /// registry) their minter roles at genesis.
    pub grant_default_minters: bool,
    /// Genesis balances.
    pub genesis: Vec<GenesisBalance>,
    /// Snapshot file; persistence is off when absent.
    pub snapshot_path: Option<PathBuf>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            admin: Address::with_last_byte(0xAD),
            contracts: ContractAddresses::default(),
            allowlist_root: B256::ZERO,
            eth_prize_root: B256::ZERO,
            token_prize_root: B256::ZERO,
            squad_size: SQUAD_SIZE,
            grant_default_minters: true,
            genesis: Vec::new(),
            snapshot_path: None,
        }
    }
}

impl LedgerConfig {
    /// Load using the standard order: defaults, JSON file, environment.
    ///
    /// The file path comes from `SQUAD_LEDGER_CONFIG`, else `cli_path`.
    pub fn load(cli_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .or(cli_path);

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON file; missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// Parse JSON text.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Apply `SQUAD_LEDGER_ADMIN` and `SQUAD_LEDGER_SNAPSHOT`.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(value) = std::env::var(ADMIN_ENV) {
            self.admin = value.parse().map_err(|_| ConfigError::InvalidAddress {
                var: ADMIN_ENV,
                value,
            })?;
        }
        if let Some(path) = std::env::var_os(SNAPSHOT_ENV) {
            self.snapshot_path = Some(PathBuf::from(path));
        }
        Ok(())
    }

    /// Reject configurations the ledger cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.squad_size == 0 {
            return Err(ConfigError::Invalid("squad_size must be at least 1".into()));
        }
        let addresses = self.contracts.all();
        for (i, address) in addresses.iter().enumerate() {
            if address.is_zero() {
                return Err(ConfigError::Invalid(format!("contract address {} is zero", i)));
            }
            if addresses[i + 1..].contains(address) {
                return Err(ConfigError::Invalid(format!("duplicate contract address {}", address)));
            }
        }
        Ok(())
    }
}
