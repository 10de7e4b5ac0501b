//! The ledger's keyed stores.

use crate::bond::Nominations;
use crate::candidate::Candidate;
use crate::delayed::DelayedRequests;
use crate::journal::{Journaled, KeyedMap};
use crate::nominator::Nominator;
use crate::round::RoundInfo;
use crate::snapshot::{CandidateSnapshot, TotalSnapshot};
use dstake_types::{AccountId, Balance, RoundIndex};

/// Every store the ledger owns. Mutations go through a journaled transaction
/// opened by [`StakingLedger`](crate::StakingLedger) for each call.
#[derive(Clone, Debug, Default)]
pub struct LedgerState {
    pub round: Journaled<RoundInfo>,
    /// Σ over candidates of bond + top + bottom.
    pub total: Journaled<Balance>,
    pub selected: Journaled<Vec<AccountId>>,

    pub candidate_info: KeyedMap<AccountId, Candidate>,
    /// stash → controller
    pub bonded_stash: KeyedMap<AccountId, AccountId>,
    pub top_nominations: KeyedMap<AccountId, Nominations>,
    pub bottom_nominations: KeyedMap<AccountId, Nominations>,
    pub unstaking_nominations: KeyedMap<AccountId, Nominations>,
    pub nominator_state: KeyedMap<AccountId, Nominator>,
    /// candidate → voting power, Active and Idle candidates only.
    pub candidate_pool: KeyedMap<AccountId, Balance>,
    pub delayed_requests: KeyedMap<RoundIndex, DelayedRequests>,
    pub total_at_stake: KeyedMap<RoundIndex, TotalSnapshot>,
    pub at_stake: KeyedMap<(RoundIndex, AccountId), CandidateSnapshot>,
}

macro_rules! for_each_store {
    ($self:ident, $method:ident) => {
        $self.round.$method();
        $self.total.$method();
        $self.selected.$method();
        $self.candidate_info.$method();
        $self.bonded_stash.$method();
        $self.top_nominations.$method();
        $self.bottom_nominations.$method();
        $self.unstaking_nominations.$method();
        $self.nominator_state.$method();
        $self.candidate_pool.$method();
        $self.delayed_requests.$method();
        $self.total_at_stake.$method();
        $self.at_stake.$method();
    };
}

impl LedgerState {
    pub fn new(round: RoundInfo) -> Self {
        Self {
            round: Journaled::new(round),
            ..Self::default()
        }
    }

    pub fn current_round(&self) -> RoundIndex {
        self.round.get().current
    }

    pub(crate) fn begin(&mut self) {
        for_each_store!(self, begin);
    }

    pub(crate) fn commit(&mut self) {
        for_each_store!(self, commit);
    }

    pub(crate) fn rollback(&mut self) {
        for_each_store!(self, rollback);
    }

    pub(crate) fn clear_dirty(&mut self) {
        for_each_store!(self, clear_dirty);
    }

    /// Top list of a candidate, empty if none is stored.
    pub fn top(&self, candidate: &AccountId) -> Nominations {
        self.top_nominations.get(candidate).cloned().unwrap_or_default()
    }

    pub fn bottom(&self, candidate: &AccountId) -> Nominations {
        self.bottom_nominations.get(candidate).cloned().unwrap_or_default()
    }

    pub fn unstaking(&self, candidate: &AccountId) -> Nominations {
        self.unstaking_nominations.get(candidate).cloned().unwrap_or_default()
    }

    /// Store a ranking list, dropping the key when the list is empty.
    pub(crate) fn put_list(
        map: &mut KeyedMap<AccountId, Nominations>,
        candidate: &AccountId,
        list: Nominations,
    ) {
        if list.is_empty() {
            map.remove(candidate);
        } else {
            map.insert(candidate.clone(), list);
        }
    }

    /// Check every cross-store invariant.
    pub fn check_invariants(&self) -> Result<(), String> {
        let mut total: Balance = 0;
        for (id, candidate) in self.candidate_info.iter() {
            let top = self.top(id);
            let bottom = self.bottom(id);
            candidate.check(&top, &bottom)?;
            total += candidate.bond + top.total() + bottom.total();
            if candidate.kicked_out && !candidate.is_leaving() {
                return Err(format!("{id}: kick flag set outside an exit"));
            }
            if candidate.in_pool() != self.candidate_pool.contains_key(id) {
                return Err(format!("{id}: pool membership does not match status"));
            }
            if let Some(power) = self.candidate_pool.get(id) {
                if *power != candidate.voting_power {
                    return Err(format!("{id}: pool holds stale voting power"));
                }
            }
            if self.bonded_stash.get(&candidate.stash) != Some(id) {
                return Err(format!("{id}: stash index mismatch"));
            }
        }
        if total != *self.total.get() {
            return Err(format!("total {} != Σ candidates {}", self.total.get(), total));
        }
        for (id, nominator) in self.nominator_state.iter() {
            let live: Balance = nominator.nominations.values().sum();
            if live != nominator.total {
                return Err(format!("{id}: nominator total {} != Σ live {live}", nominator.total));
            }
            let pending: Balance = nominator.requests.requests.values().map(|r| r.amount).sum();
            if pending != nominator.requests.less_total {
                return Err(format!("{id}: less_total out of sync"));
            }
            for request in nominator.requests.requests.values() {
                let buckets: Balance = request.when_executable.values().sum();
                if buckets != request.amount {
                    return Err(format!("{id}: request amount != Σ buckets"));
                }
            }
            for (candidate, amount) in &nominator.nominations {
                let listed = self
                    .top_nominations
                    .get(candidate)
                    .and_then(|l| l.amount_of(id))
                    .or_else(|| {
                        self.bottom_nominations
                            .get(candidate)
                            .and_then(|l| l.amount_of(id))
                    })
                    .unwrap_or(0);
                if listed != *amount {
                    return Err(format!("{id}: edge on {candidate} is {amount}, listed {listed}"));
                }
            }
        }
        Ok(())
    }
}
