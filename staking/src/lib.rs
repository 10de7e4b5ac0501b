//! Delegated-stake accounting ledger.
//!
//! Tracks candidate self-bonds and nominator delegations, ranks each
//! candidate's nominations into a bounded Top list (counted toward voting
//! power) and a bounded Bottom list, and defers decreases, revocations and
//! exits behind round-based delays with explicit execute/cancel calls.
//!
//! The ledger never moves funds. It asks a [`CapitalReserve`](dstake_store::CapitalReserve)
//! to reserve and unreserve capital, and persists through a
//! [`StakingStore`](dstake_store::StakingStore).

pub mod bond;
pub mod candidate;
pub mod candidates;
pub mod delayed;
pub mod error;
pub mod journal;
pub mod ledger;
pub mod nominations;
pub mod nominator;
pub mod persist;
pub mod ranking;
pub mod round;
pub mod rounds;
pub mod snapshot;
pub mod state;

pub use bond::{Bond, Nominations};
pub use candidate::{Candidate, CandidateBondLessRequest, CandidateStatus};
pub use candidates::CandidateExit;
pub use delayed::DelayedRequests;
pub use error::{ErrorKind, StakingError};
pub use ledger::StakingLedger;
pub use nominator::{
    NominationAction, NominationRequest, Nominator, NominatorStatus, PendingNominationRequests,
};
pub use persist::SCHEMA_VERSION;
pub use ranking::{Eviction, NominationOutcome, Placement};
pub use round::RoundInfo;
pub use snapshot::{CandidateSnapshot, TierTotals, TotalSnapshot};
pub use state::LedgerState;
