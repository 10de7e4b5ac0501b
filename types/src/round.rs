//! Round and block counters.

/// The ledger's discrete time unit. Request maturity and snapshots are keyed by round.
pub type RoundIndex = u32;

/// Height of the block that drives the round clock.
pub type BlockNumber = u64;
