//! Toolkit constants. All monetary values in motes (1 coin = 10^9 motes).

use crate::error::AmountError;

/// Number of motes in one whole coin.
pub const COIN: u64 = 1_000_000_000;

/// Default airdrop request size: half a coin.
///
/// Devnet faucets cap individual grants; small fixed requests stay under
/// the cap and under the per-address rate limit.
pub const DEFAULT_AIRDROP_MOTES: u64 = COIN / 2;

/// Pool accounts below this balance get topped up by `spigot-cli init`.
pub const TOP_UP_THRESHOLD_MOTES: u64 = COIN;

/// Convert a human-entered coin amount to motes.
///
/// Rejects non-finite, non-positive, and out-of-range values, and values
/// so small they truncate to zero motes. Truncates sub-mote precision.
pub fn coins_to_motes(coins: f64) -> Result<u64, AmountError> {
    if !coins.is_finite() {
        return Err(AmountError::NotFinite);
    }
    if coins <= 0.0 {
        return Err(AmountError::NotPositive(coins));
    }
    let motes = coins * COIN as f64;
    if motes >= u64::MAX as f64 {
        return Err(AmountError::Overflow(coins));
    }
    let motes = motes as u64;
    if motes == 0 {
        return Err(AmountError::NotPositive(coins));
    }
    Ok(motes)
}

/// Convert motes to whole coins for display.
pub fn motes_to_coins(motes: u64) -> f64 {
    motes as f64 / COIN as f64
}
