//! Shared value types.

pub use alloy_primitives::{Address, B256, U256};

/// Native currency amount in wei.
pub type Wei = U256;

/// Club identifier (ERC-721 style token id chosen by the minter).
pub type ClubId = U256;

/// Sequential token id assigned by the player registry.
pub type TokenId = u64;

/// Wei per milliether (10^15).
const WEI_PER_MILLIETHER: u64 = 1_000_000_000_000_000;

/// Whole ether amount in wei.
pub fn ether(whole: u64) -> Wei {
    milliether(whole) * U256::from(1_000u64)
}

/// Milliether amount in wei (`milliether(500)` is 0.5 ether).
pub fn milliether(milli: u64) -> Wei {
    U256::from(milli) * U256::from(WEI_PER_MILLIETHER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ether_units() {
        assert_eq!(ether(1), U256::from(10u64).pow(U256::from(18u64)));
        assert_eq!(milliether(500) + milliether(500), ether(1));
        assert_eq!(ether(0), U256::ZERO);
    }
}
