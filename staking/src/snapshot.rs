//! Immutable per-round copies of stake figures, read by reward computation.

use crate::bond::Bond;
use dstake_types::{AccountId, Balance, Commission, RoundIndex, TierType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSnapshot {
    pub round: RoundIndex,
    pub candidate: AccountId,
    pub stash: AccountId,
    pub tier: TierType,
    pub bond: Balance,
    pub voting_power: Balance,
    pub commission: Commission,
    pub top_nominations: Vec<Bond>,
    pub bottom_nominations: Vec<Bond>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierTotals {
    pub candidates: u32,
    pub self_bond: Balance,
    pub top_nominations: Balance,
    pub bottom_nominations: Balance,
    pub voting_power: Balance,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalSnapshot {
    pub round: RoundIndex,
    /// Equals the ledger's Total at the time of the snapshot.
    pub total_stake: Balance,
    pub total_self_bond: Balance,
    pub total_top_nominations: Balance,
    pub total_bottom_nominations: Balance,
    pub total_voting_power: Balance,
    /// Figures restricted to the selected candidates.
    pub active_self_bond: Balance,
    pub active_voting_power: Balance,
    /// Distinct nominators in the selected candidates' top lists.
    pub active_nominators: u32,
    pub per_tier: BTreeMap<TierType, TierTotals>,
}
