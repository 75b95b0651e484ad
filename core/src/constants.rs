//! Monetary constants

/// Base units per coin
pub const COIN: u64 = 100_000_000;

/// One hundredth of a coin
pub const CENT: u64 = 1_000_000;
