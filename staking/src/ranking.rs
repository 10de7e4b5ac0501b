//! Top/Bottom placement, promotion and eviction.
//!
//! These helpers own every change to a candidate's ranking lists and the
//! matching change to Total. Callers update the acting nominator's own
//! record; evicted third parties are settled here.

use crate::bond::{Bond, Nominations};
use crate::error::StakingError;
use crate::ledger::StakingLedger;
use crate::state::LedgerState;
use dstake_store::CapitalReserve;
use dstake_types::{AccountId, Balance};
use tracing::info;

/// Which list a nomination ended up in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    Top,
    Bottom,
}

/// A nomination pushed out of both lists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Eviction {
    pub nominator: AccountId,
    pub candidate: AccountId,
    /// Live amount that was in the lists.
    pub amount: Balance,
    /// Live plus pending amount returned to the nominator.
    pub unreserved: Balance,
    /// The nominator record was deleted with its last nomination.
    pub nominator_removed: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NominationOutcome {
    pub placement: Placement,
    pub evicted: Vec<Eviction>,
}

impl<R: CapitalReserve> StakingLedger<R> {
    /// Place a new (or restored) nomination. Total grows by `bond.amount`,
    /// minus whatever is evicted to make room.
    pub(crate) fn add_nomination(
        &mut self,
        candidate: &AccountId,
        bond: Bond,
    ) -> Result<NominationOutcome, StakingError> {
        let max_top = self.params.max_top();
        let max_bottom = self.params.max_bottom();
        let mut top = self.state.top(candidate);
        let mut bottom = self.state.bottom(candidate);
        let amount = bond.amount;
        let mut displaced = Vec::new();

        let placement = if top.len() < max_top {
            top.insert_sorted(bond);
            Placement::Top
        } else if top.lowest().is_some_and(|lowest| amount > lowest) {
            top.insert_sorted(bond);
            if let Some(demoted) = top.pop_lowest() {
                displaced.extend(push_bottom(&mut bottom, demoted, max_bottom));
            }
            Placement::Top
        } else if bottom.len() < max_bottom {
            bottom.insert_sorted(bond);
            Placement::Bottom
        } else if bottom.lowest().is_some_and(|lowest| amount > lowest) {
            bottom.insert_sorted(bond);
            displaced.extend(bottom.pop_lowest());
            Placement::Bottom
        } else {
            return Err(StakingError::CannotNominateLessThanLowestBottomWhenBottomIsFull);
        };

        self.add_total(amount)?;
        self.store_rankings(candidate, top, bottom);

        let mut evicted = Vec::with_capacity(displaced.len());
        for bond in displaced {
            evicted.push(self.settle_evicted(candidate, bond)?);
        }
        Ok(NominationOutcome { placement, evicted })
    }

    /// Raise a live nomination, promoting it out of Bottom when it now beats
    /// Top's minimum.
    pub(crate) fn increase_nomination(
        &mut self,
        candidate: &AccountId,
        owner: &AccountId,
        amount: Balance,
    ) -> Result<Placement, StakingError> {
        let mut top = self.state.top(candidate);
        let mut bottom = self.state.bottom(candidate);

        let placement = if top.contains(owner) {
            top.increase(owner, amount).ok_or(StakingError::Overflow)?;
            Placement::Top
        } else if bottom.contains(owner) {
            let raised = bottom.increase(owner, amount).ok_or(StakingError::Overflow)?;
            if top.lowest().is_some_and(|lowest| raised > lowest) {
                if let (Some(promoted), Some(demoted)) = (bottom.remove(owner), top.pop_lowest()) {
                    top.insert_sorted(promoted);
                    bottom.insert_sorted(demoted);
                }
                Placement::Top
            } else {
                Placement::Bottom
            }
        } else {
            return Err(StakingError::NominationDNE);
        };

        self.add_total(amount)?;
        self.store_rankings(candidate, top, bottom);
        Ok(placement)
    }

    /// Lower a live nomination in place, swapping the Top/Bottom boundary if
    /// it falls below Bottom's maximum.
    pub(crate) fn decrease_nomination(
        &mut self,
        candidate: &AccountId,
        owner: &AccountId,
        amount: Balance,
    ) -> Result<(), StakingError> {
        let mut top = self.state.top(candidate);
        let mut bottom = self.state.bottom(candidate);

        if top.contains(owner) {
            top.decrease(owner, amount).ok_or(StakingError::NominationBelowMin)?;
            if let (Some(low_top), Some(high_bottom)) = (top.lowest(), bottom.highest()) {
                if low_top < high_bottom {
                    if let (Some(demoted), Some(promoted)) = (top.pop_lowest(), bottom.pop_highest()) {
                        top.insert_sorted(promoted);
                        bottom.insert_sorted(demoted);
                    }
                }
            }
        } else if bottom.contains(owner) {
            bottom.decrease(owner, amount).ok_or(StakingError::NominationBelowMin)?;
        } else {
            return Err(StakingError::NominationDNE);
        }

        self.sub_total(amount);
        self.store_rankings(candidate, top, bottom);
        Ok(())
    }

    /// Take a nomination out of the lists, promoting Bottom's highest into a
    /// freed Top slot. Returns the removed live amount.
    pub(crate) fn remove_nomination(
        &mut self,
        candidate: &AccountId,
        owner: &AccountId,
    ) -> Result<Balance, StakingError> {
        let mut top = self.state.top(candidate);
        let mut bottom = self.state.bottom(candidate);

        let removed = if let Some(bond) = top.remove(owner) {
            if let Some(promoted) = bottom.pop_highest() {
                top.insert_sorted(promoted);
            }
            bond
        } else if let Some(bond) = bottom.remove(owner) {
            bond
        } else {
            return Err(StakingError::NominationDNE);
        };

        self.sub_total(removed.amount);
        self.store_rankings(candidate, top, bottom);
        Ok(removed.amount)
    }

    /// Fully withdraw an evicted nomination: its live amount, any pending
    /// buckets on the same candidate, and the reserve behind both.
    fn settle_evicted(
        &mut self,
        candidate: &AccountId,
        bond: Bond,
    ) -> Result<Eviction, StakingError> {
        let mut nominator = self.get_nominator(&bond.owner)?;
        let live = nominator.drop_edge(candidate);
        let pending = nominator
            .requests
            .remove_request(candidate)
            .map_or(0, |request| request.amount);
        if pending > 0 {
            let mut unstaking = self.state.unstaking(candidate);
            unstaking.remove(&bond.owner);
            LedgerState::put_list(&mut self.state.unstaking_nominations, candidate, unstaking);
        }

        self.sub_total(bond.amount);
        let unreserved = live + pending;
        self.stage_unreserve(&bond.owner, unreserved);
        let nominator_removed = self.put_nominator(nominator);

        info!(
            candidate = %candidate,
            nominator = %bond.owner,
            amount = bond.amount,
            unreserved,
            nominator_removed,
            "nomination evicted"
        );
        Ok(Eviction {
            nominator: bond.owner,
            candidate: candidate.clone(),
            amount: bond.amount,
            unreserved,
            nominator_removed,
        })
    }

    /// Write both lists back and recompute the candidate's cached figures.
    pub(crate) fn store_rankings(
        &mut self,
        candidate: &AccountId,
        top: Nominations,
        bottom: Nominations,
    ) {
        if let Some(info) = self.state.candidate_info.get_mut(candidate) {
            info.refresh(&top, &bottom);
            debug_assert!(info.check(&top, &bottom).is_ok(), "ranking invariant broken");
            let in_pool = info.in_pool();
            let power = info.voting_power;
            if in_pool {
                self.state.candidate_pool.insert(candidate.clone(), power);
            }
        }
        LedgerState::put_list(&mut self.state.top_nominations, candidate, top);
        LedgerState::put_list(&mut self.state.bottom_nominations, candidate, bottom);
    }

    /// Recompute cached figures after a self-bond change.
    pub(crate) fn refresh_candidate(&mut self, candidate: &AccountId) {
        let top = self.state.top(candidate);
        let bottom = self.state.bottom(candidate);
        self.store_rankings(candidate, top, bottom);
    }
}

/// Put a Top-demoted entry into Bottom. Returns the entry pushed out of both
/// lists, if any.
fn push_bottom(bottom: &mut Nominations, demoted: Bond, max_bottom: usize) -> Option<Bond> {
    if bottom.len() < max_bottom {
        bottom.insert_sorted(demoted);
        None
    } else if bottom.lowest().is_some_and(|lowest| demoted.amount > lowest) {
        bottom.insert_sorted(demoted);
        bottom.pop_lowest()
    } else {
        Some(demoted)
    }
}
