//! Ledger errors.
//!
//! Every error aborts only the call that raised it; the call's writes are rolled
//! back before the error is returned.

use dstake_store::{ReserveError, StoreError};
use dstake_types::{Balance, ParamsError, RoundIndex};
use thiserror::Error;

/// Coarse classification of [`StakingError`] variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    StateConflict,
    BoundViolation,
    Timing,
    HintMismatch,
    Resource,
    Persistence,
    Config,
}

#[derive(Debug, Error)]
pub enum StakingError {
    // ── not found ────────────────────────────────────────────────────────
    #[error("candidate does not exist")]
    CandidateDNE,

    #[error("nominator does not exist")]
    NominatorDNE,

    #[error("nomination does not exist")]
    NominationDNE,

    #[error("stash is not bonded to any candidate")]
    StashDNE,

    #[error("no pending nomination request for this candidate and round")]
    PendingNominationRequestDNE,

    #[error("no pending candidate request")]
    PendingCandidateRequestsDNE,

    // ── state conflict ───────────────────────────────────────────────────
    #[error("stash is already bonded")]
    AlreadyBonded,

    #[error("controller is already paired with a stash")]
    AlreadyPaired,

    #[error("account is already a candidate")]
    CandidateExists,

    #[error("account is already a nominator")]
    NominatorExists,

    #[error("nominator already nominates this candidate")]
    AlreadyNominatedCandidate,

    #[error("a candidate request is already pending")]
    PendingCandidateRequestAlreadyExists,

    #[error("a revoke or leave request is already pending for this nomination")]
    PendingNominationRequestAlreadyExists,

    #[error("nominator is already leaving")]
    NominatorAlreadyLeaving,

    #[error("nominator is not leaving")]
    NominatorNotLeaving,

    #[error("candidate is already leaving")]
    CandidateAlreadyLeaving,

    #[error("candidate is not leaving")]
    CandidateNotLeaving,

    #[error("candidate is not kicked out")]
    CandidateNotKickedOut,

    #[error("cannot leave while a controller change is requested")]
    CannotLeaveIfControllerSetRequested,

    #[error("cannot leave while a commission change is requested")]
    CannotLeaveIfCommissionSetRequested,

    #[error("selected account is not an eligible candidate")]
    InvalidSelection,

    #[error("snapshot for round {0} already exists")]
    SnapshotAlreadyExists(RoundIndex),

    // ── bound violation ──────────────────────────────────────────────────
    #[error("candidate bond below minimum")]
    CandidateBondBelowMin,

    #[error("nomination below minimum")]
    NominationBelowMin,

    #[error("nominator bond below minimum")]
    NominatorBondBelowMin,

    #[error("commission above maximum")]
    CannotSetAboveMax,

    #[error("cannot nominate less than the lowest bottom nomination when bottom is full")]
    CannotNominateLessThanLowestBottomWhenBottomIsFull,

    #[error("nominator already backs the maximum number of candidates")]
    ExceedMaxNominationsPerNominator,

    #[error("amount must be non-zero")]
    ZeroAmount,

    #[error("arithmetic overflow in ledger bookkeeping")]
    Overflow,

    // ── timing ───────────────────────────────────────────────────────────
    #[error("pending nomination request not due until round {0}")]
    PendingNominationRequestNotDueYet(RoundIndex),

    #[error("pending candidate request not due until round {0}")]
    PendingCandidateRequestNotDueYet(RoundIndex),

    #[error("candidate cannot leave until round {0}")]
    CandidateCannotLeaveYet(RoundIndex),

    #[error("nominator cannot leave until round {0}")]
    NominatorCannotLeaveYet(RoundIndex),

    // ── hint mismatch ────────────────────────────────────────────────────
    #[error("candidate count hint too low to join candidates")]
    TooLowCandidateCountWeightHintJoinCandidates,

    #[error("candidate count hint too low to leave candidates")]
    TooLowCandidateCountToLeaveCandidates,

    #[error("candidate count hint too low to cancel leaving candidates")]
    TooLowCandidateCountWeightHintCancelLeaveCandidates,

    #[error("nomination count hint too low to execute candidate exit")]
    TooLowCandidateNominationCountToLeaveCandidates,

    #[error("candidate nomination count hint too low to nominate")]
    TooLowCandidateNominationCountToNominate,

    #[error("nominator nomination count hint too low to nominate")]
    TooLowNominationCountToNominate,

    #[error("nomination count hint too low to leave nominators")]
    TooLowNominationCountToLeaveNominators,

    // ── resources & persistence ──────────────────────────────────────────
    #[error("insufficient free balance: need {needed}, available {available}")]
    InsufficientBalance { needed: Balance, available: Balance },

    #[error("capital reserve error: {0}")]
    Reserve(ReserveError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("codec error: {0}")]
    Codec(String),

    #[error("unsupported schema version {found}, expected {expected}")]
    SchemaVersion { found: u32, expected: u32 },

    #[error("invalid staking parameters: {0}")]
    InvalidParams(#[from] ParamsError),
}

impl StakingError {
    pub fn kind(&self) -> ErrorKind {
        use StakingError::*;
        match self {
            CandidateDNE
            | NominatorDNE
            | NominationDNE
            | StashDNE
            | PendingNominationRequestDNE
            | PendingCandidateRequestsDNE => ErrorKind::NotFound,

            AlreadyBonded
            | AlreadyPaired
            | CandidateExists
            | NominatorExists
            | AlreadyNominatedCandidate
            | PendingCandidateRequestAlreadyExists
            | PendingNominationRequestAlreadyExists
            | NominatorAlreadyLeaving
            | NominatorNotLeaving
            | CandidateAlreadyLeaving
            | CandidateNotLeaving
            | CandidateNotKickedOut
            | CannotLeaveIfControllerSetRequested
            | CannotLeaveIfCommissionSetRequested
            | InvalidSelection
            | SnapshotAlreadyExists(_) => ErrorKind::StateConflict,

            CandidateBondBelowMin
            | NominationBelowMin
            | NominatorBondBelowMin
            | CannotSetAboveMax
            | CannotNominateLessThanLowestBottomWhenBottomIsFull
            | ExceedMaxNominationsPerNominator
            | ZeroAmount
            | Overflow => ErrorKind::BoundViolation,

            PendingNominationRequestNotDueYet(_)
            | PendingCandidateRequestNotDueYet(_)
            | CandidateCannotLeaveYet(_)
            | NominatorCannotLeaveYet(_) => ErrorKind::Timing,

            TooLowCandidateCountWeightHintJoinCandidates
            | TooLowCandidateCountToLeaveCandidates
            | TooLowCandidateCountWeightHintCancelLeaveCandidates
            | TooLowCandidateNominationCountToLeaveCandidates
            | TooLowCandidateNominationCountToNominate
            | TooLowNominationCountToNominate
            | TooLowNominationCountToLeaveNominators => ErrorKind::HintMismatch,

            InsufficientBalance { .. } | Reserve(_) => ErrorKind::Resource,

            Store(_) | Codec(_) | SchemaVersion { .. } => ErrorKind::Persistence,

            InvalidParams(_) => ErrorKind::Config,
        }
    }
}

impl From<ReserveError> for StakingError {
    fn from(e: ReserveError) -> Self {
        match e {
            ReserveError::InsufficientBalance {
                needed, available, ..
            } => StakingError::InsufficientBalance { needed, available },
            other => StakingError::Reserve(other),
        }
    }
}

impl From<bincode::Error> for StakingError {
    fn from(e: bincode::Error) -> Self {
        StakingError::Codec(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_the_taxonomy() {
        assert_eq!(StakingError::CandidateDNE.kind(), ErrorKind::NotFound);
        assert_eq!(StakingError::AlreadyPaired.kind(), ErrorKind::StateConflict);
        assert_eq!(
            StakingError::CannotNominateLessThanLowestBottomWhenBottomIsFull.kind(),
            ErrorKind::BoundViolation
        );
        assert_eq!(
            StakingError::PendingNominationRequestNotDueYet(4).kind(),
            ErrorKind::Timing
        );
        assert_eq!(
            StakingError::TooLowNominationCountToNominate.kind(),
            ErrorKind::HintMismatch
        );
    }

    #[test]
    fn insufficient_reserve_maps_to_resource_error() {
        let err: StakingError = ReserveError::InsufficientBalance {
            who: "alice".into(),
            needed: 10,
            available: 3,
        }
        .into();
        assert!(matches!(
            err,
            StakingError::InsufficientBalance { needed: 10, available: 3 }
        ));
        assert_eq!(err.kind(), ErrorKind::Resource);
    }
}
