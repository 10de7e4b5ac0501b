//! Abstract storage traits for the dstake ledger.
//!
//! Every storage backend (LMDB, in-memory for testing) implements
//! [`StakingStore`]; every balance backend implements [`CapitalReserve`].
//! The ledger engine depends only on the traits.

pub mod error;
pub mod reserve;
pub mod staking;

pub use error::StoreError;
pub use reserve::{CapitalReserve, ReserveError};
pub use staking::{BatchOp, Column, StakingStore, WriteBatch};
