//! The staking ledger: owns every keyed store and the capital reserve handle.
//!
//! Each public call runs as one transaction. Store writes are journaled and
//! reserve/unreserve calls are staged; both land only when the call succeeds.

use crate::bond::Nominations;
use crate::candidate::Candidate;
use crate::delayed::DelayedRequests;
use crate::error::StakingError;
use crate::nominator::Nominator;
use crate::round::RoundInfo;
use crate::snapshot::{CandidateSnapshot, TotalSnapshot};
use crate::state::LedgerState;
use dstake_store::CapitalReserve;
use dstake_types::{AccountId, Balance, RoundIndex, StakingParams};
use tracing::{error, warn};

/// A reserve call waiting for its transaction to commit.
#[derive(Clone, Debug, PartialEq, Eq)]
enum ReserveOp {
    Reserve(AccountId, Balance),
    Unreserve(AccountId, Balance),
}

pub struct StakingLedger<R: CapitalReserve> {
    pub(crate) params: StakingParams,
    pub(crate) state: LedgerState,
    pub(crate) reserve: R,
    staged: Vec<ReserveOp>,
}

impl<R: CapitalReserve> StakingLedger<R> {
    /// Empty ledger at round 1, first block 0.
    pub fn new(params: StakingParams, reserve: R) -> Result<Self, StakingError> {
        params.validate()?;
        let round = RoundInfo::new(1, 0, params.round_length);
        Ok(Self::from_parts(params, LedgerState::new(round), reserve))
    }

    pub(crate) fn from_parts(params: StakingParams, state: LedgerState, reserve: R) -> Self {
        Self {
            params,
            state,
            reserve,
            staged: Vec::new(),
        }
    }

    // ── Transactions ─────────────────────────────────────────────────────

    /// Run `f` as one atomic call.
    pub(crate) fn transactional<T>(
        &mut self,
        call: &'static str,
        f: impl FnOnce(&mut Self) -> Result<T, StakingError>,
    ) -> Result<T, StakingError> {
        self.state.begin();
        self.staged.clear();
        let result = f(self).and_then(|value| {
            self.flush_reserve()?;
            Ok(value)
        });
        match result {
            Ok(value) => {
                self.state.commit();
                Ok(value)
            }
            Err(e) => {
                self.state.rollback();
                self.staged.clear();
                warn!(call, error = %e, "call rolled back");
                Err(e)
            }
        }
    }

    /// Stage a reservation, checking it against the free balance net of
    /// everything already staged in this call.
    pub(crate) fn stage_reserve(
        &mut self,
        who: &AccountId,
        amount: Balance,
    ) -> Result<(), StakingError> {
        let mut available = self.reserve.free_balance(who);
        for op in &self.staged {
            match op {
                ReserveOp::Reserve(w, a) if w == who => available = available.saturating_sub(*a),
                ReserveOp::Unreserve(w, a) if w == who => available = available.saturating_add(*a),
                _ => {}
            }
        }
        if amount > available {
            return Err(StakingError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        self.staged.push(ReserveOp::Reserve(who.clone(), amount));
        Ok(())
    }

    pub(crate) fn stage_unreserve(&mut self, who: &AccountId, amount: Balance) {
        if amount > 0 {
            self.staged.push(ReserveOp::Unreserve(who.clone(), amount));
        }
    }

    fn flush_reserve(&mut self) -> Result<(), StakingError> {
        let ops = std::mem::take(&mut self.staged);
        for (i, op) in ops.iter().enumerate() {
            match op {
                ReserveOp::Reserve(who, amount) => {
                    if let Err(e) = self.reserve.reserve(who, *amount) {
                        self.undo_reserve(&ops[..i]);
                        return Err(e.into());
                    }
                }
                ReserveOp::Unreserve(who, amount) => {
                    let missing = self.reserve.unreserve(who, *amount);
                    if missing > 0 {
                        error!(account = %who, amount, missing, "unreserve exceeded reserved balance");
                    }
                }
            }
        }
        Ok(())
    }

    fn undo_reserve(&mut self, applied: &[ReserveOp]) {
        for op in applied.iter().rev() {
            match op {
                ReserveOp::Reserve(who, amount) => {
                    self.reserve.unreserve(who, *amount);
                }
                ReserveOp::Unreserve(who, amount) => {
                    if let Err(e) = self.reserve.reserve(who, *amount) {
                        error!(account = %who, amount, error = %e, "failed to undo unreserve");
                    }
                }
            }
        }
    }

    // ── Internal lookups ─────────────────────────────────────────────────

    pub(crate) fn get_candidate(&self, id: &AccountId) -> Result<Candidate, StakingError> {
        self.state
            .candidate_info
            .get(id)
            .cloned()
            .ok_or(StakingError::CandidateDNE)
    }

    pub(crate) fn get_nominator(&self, id: &AccountId) -> Result<Nominator, StakingError> {
        self.state
            .nominator_state
            .get(id)
            .cloned()
            .ok_or(StakingError::NominatorDNE)
    }

    /// Write a nominator back, or delete it once it has no nominations left.
    /// Returns true when the record was deleted.
    pub(crate) fn put_nominator(&mut self, nominator: Nominator) -> bool {
        if nominator.nominations.is_empty() && nominator.requests.is_empty() {
            self.state.nominator_state.remove(&nominator.id);
            true
        } else {
            self.state
                .nominator_state
                .insert(nominator.id.clone(), nominator);
            false
        }
    }

    /// Accounts that already play a role in the ledger cannot take another one.
    pub(crate) fn is_bound(&self, who: &AccountId) -> bool {
        self.state.candidate_info.contains_key(who)
            || self.state.bonded_stash.contains_key(who)
            || self.state.nominator_state.contains_key(who)
    }

    pub(crate) fn add_total(&mut self, amount: Balance) -> Result<(), StakingError> {
        let total = self
            .state
            .total
            .get()
            .checked_add(amount)
            .ok_or(StakingError::Overflow)?;
        self.state.total.set(total);
        Ok(())
    }

    pub(crate) fn sub_total(&mut self, amount: Balance) {
        self.state.total.update(|t| *t = t.saturating_sub(amount));
    }

    pub(crate) fn delayed_at(&self, round: RoundIndex) -> DelayedRequests {
        self.state
            .delayed_requests
            .get(&round)
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn put_delayed(&mut self, round: RoundIndex, requests: DelayedRequests) {
        if requests.is_empty() {
            self.state.delayed_requests.remove(&round);
        } else {
            self.state.delayed_requests.insert(round, requests);
        }
    }

    // ── Read surface ─────────────────────────────────────────────────────

    pub fn params(&self) -> &StakingParams {
        &self.params
    }

    pub fn round(&self) -> RoundInfo {
        *self.state.round.get()
    }

    pub fn current_round(&self) -> RoundIndex {
        self.state.current_round()
    }

    /// Σ over candidates of bond + top + bottom.
    pub fn total(&self) -> Balance {
        *self.state.total.get()
    }

    pub fn candidate(&self, id: &AccountId) -> Option<&Candidate> {
        self.state.candidate_info.get(id)
    }

    pub fn candidates(&self) -> impl Iterator<Item = &Candidate> {
        self.state.candidate_info.values()
    }

    /// Eligible candidates with their voting power, highest first.
    pub fn candidate_pool(&self) -> Vec<(AccountId, Balance)> {
        let mut pool: Vec<(AccountId, Balance)> = self
            .state
            .candidate_pool
            .iter()
            .map(|(id, power)| (id.clone(), *power))
            .collect();
        pool.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        pool
    }

    pub fn top_nominations(&self, candidate: &AccountId) -> Option<&Nominations> {
        self.state.top_nominations.get(candidate)
    }

    pub fn bottom_nominations(&self, candidate: &AccountId) -> Option<&Nominations> {
        self.state.bottom_nominations.get(candidate)
    }

    pub fn unstaking_nominations(&self, candidate: &AccountId) -> Option<&Nominations> {
        self.state.unstaking_nominations.get(candidate)
    }

    pub fn nominator(&self, id: &AccountId) -> Option<&Nominator> {
        self.state.nominator_state.get(id)
    }

    pub fn nominators(&self) -> impl Iterator<Item = &Nominator> {
        self.state.nominator_state.values()
    }

    /// Controller currently bonded to `stash`.
    pub fn bonded_stash(&self, stash: &AccountId) -> Option<&AccountId> {
        self.state.bonded_stash.get(stash)
    }

    pub fn delayed_requests(&self, round: RoundIndex) -> Option<&DelayedRequests> {
        self.state.delayed_requests.get(&round)
    }

    pub fn selected_candidates(&self) -> &[AccountId] {
        self.state.selected.get()
    }

    pub fn total_at_stake(&self, round: RoundIndex) -> Option<&TotalSnapshot> {
        self.state.total_at_stake.get(&round)
    }

    pub fn at_stake(&self, round: RoundIndex, candidate: &AccountId) -> Option<&CandidateSnapshot> {
        self.state.at_stake.get(&(round, candidate.clone()))
    }

    pub fn reserve(&self) -> &R {
        &self.reserve
    }

    pub fn reserve_mut(&mut self) -> &mut R {
        &mut self.reserve
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn check_invariants(&self) -> Result<(), String> {
        self.state.check_invariants()
    }
}

/// Fail with `err` when a caller-supplied count hint is below the real count.
pub(crate) fn ensure_hint(actual: usize, hint: u32, err: StakingError) -> Result<(), StakingError> {
    if (hint as usize) < actual {
        return Err(err);
    }
    Ok(())
}
