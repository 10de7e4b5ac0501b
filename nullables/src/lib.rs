//! Nullable infrastructure for deterministic testing.
//!
//! The ledger's two external collaborators, the capital reserve and the
//! keyed store, are traits. This crate provides in-memory implementations
//! that are fully controllable from tests and never touch the filesystem.

pub mod reserve;
pub mod store;

pub use reserve::NullReserve;
pub use store::NullStakingStore;
