//! Fundamental types for the dstake ledger.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! account identifiers, balances, rounds, candidate tiers, commission rates and the
//! staking parameters.

pub mod account;
pub mod amount;
pub mod commission;
pub mod error;
pub mod params;
pub mod round;
pub mod tier;

pub use account::AccountId;
pub use amount::{Balance, UNIT};
pub use commission::Commission;
pub use error::ParamsError;
pub use params::StakingParams;
pub use round::{BlockNumber, RoundIndex};
pub use tier::TierType;
