//! LMDB storage backend for the dstake ledger.
//!
//! Implements [`StakingStore`](dstake_store::StakingStore) using the `heed`
//! LMDB bindings. Each ledger column maps to one named LMDB database within a
//! single environment.

pub mod environment;
pub mod error;
pub mod staking;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use staking::LmdbStakingStore;
