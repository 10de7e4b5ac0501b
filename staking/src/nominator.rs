//! Nominator ledger records and their round-bucketed pending requests.

use dstake_types::{AccountId, Balance, RoundIndex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NominatorStatus {
    Active,
    /// Exit scheduled; executable from the given round.
    Leaving(RoundIndex),
}

/// Outstanding intent on one (nominator, candidate) pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NominationAction {
    Decrease,
    Revoke,
    Leave,
}

impl NominationAction {
    /// Revoke and Leave zero the edge; they are counted in `revocations_count`.
    pub fn is_revocation(self) -> bool {
        !matches!(self, NominationAction::Decrease)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NominationRequest {
    pub candidate: AccountId,
    /// Sum of every open bucket.
    pub amount: Balance,
    /// Maturity round → amount.
    pub when_executable: BTreeMap<RoundIndex, Balance>,
    pub action: NominationAction,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingNominationRequests {
    pub requests: BTreeMap<AccountId, NominationRequest>,
    /// Sum of every request's `amount`.
    pub less_total: Balance,
    pub revocations_count: u32,
}

impl PendingNominationRequests {
    pub fn get(&self, candidate: &AccountId) -> Option<&NominationRequest> {
        self.requests.get(candidate)
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Add `amount` to the bucket at `when`, opening the request if needed.
    ///
    /// A Revoke or Leave `action` upgrades an existing Decrease intent.
    pub fn schedule(
        &mut self,
        candidate: &AccountId,
        when: RoundIndex,
        amount: Balance,
        action: NominationAction,
    ) {
        match self.requests.get_mut(candidate) {
            Some(request) => {
                *request.when_executable.entry(when).or_default() += amount;
                request.amount += amount;
                if action > request.action {
                    if !request.action.is_revocation() {
                        self.revocations_count += 1;
                    }
                    request.action = action;
                }
            }
            None => {
                if action.is_revocation() {
                    self.revocations_count += 1;
                }
                self.requests.insert(
                    candidate.clone(),
                    NominationRequest {
                        candidate: candidate.clone(),
                        amount,
                        when_executable: BTreeMap::from([(when, amount)]),
                        action,
                    },
                );
            }
        }
        self.less_total += amount;
    }

    /// Remove one bucket. The request disappears with its last bucket.
    pub fn take_bucket(
        &mut self,
        candidate: &AccountId,
        round: RoundIndex,
    ) -> Option<(Balance, NominationAction)> {
        let request = self.requests.get_mut(candidate)?;
        let amount = request.when_executable.remove(&round)?;
        let action = request.action;
        request.amount -= amount;
        self.less_total -= amount;
        if request.when_executable.is_empty() {
            self.requests.remove(candidate);
            if action.is_revocation() {
                self.revocations_count -= 1;
            }
        }
        Some((amount, action))
    }

    /// Drop a whole request with all its buckets.
    pub fn remove_request(&mut self, candidate: &AccountId) -> Option<NominationRequest> {
        let request = self.requests.remove(candidate)?;
        self.less_total -= request.amount;
        if request.action.is_revocation() {
            self.revocations_count -= 1;
        }
        Some(request)
    }

    pub fn set_action(&mut self, candidate: &AccountId, action: NominationAction) {
        if let Some(request) = self.requests.get_mut(candidate) {
            match (request.action.is_revocation(), action.is_revocation()) {
                (false, true) => self.revocations_count += 1,
                (true, false) => self.revocations_count -= 1,
                _ => {}
            }
            request.action = action;
        }
    }

    /// Downgrade every Leave intent to Revoke.
    pub fn downgrade_leaves(&mut self) {
        for request in self.requests.values_mut() {
            if request.action == NominationAction::Leave {
                request.action = NominationAction::Revoke;
            }
        }
    }

    pub fn rename_candidate(&mut self, from: &AccountId, to: &AccountId) {
        if let Some(mut request) = self.requests.remove(from) {
            request.candidate = to.clone();
            self.requests.insert(to.clone(), request);
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nominator {
    pub id: AccountId,
    /// Candidate → live amount. An entry with zero amount is an edge waiting
    /// for its revoke or leave buckets to execute.
    pub nominations: BTreeMap<AccountId, Balance>,
    /// Candidate → reward baseline.
    pub initial_nominations: BTreeMap<AccountId, Balance>,
    /// Sum of live amounts.
    pub total: Balance,
    pub requests: PendingNominationRequests,
    pub status: NominatorStatus,
}

impl Nominator {
    pub fn new(id: AccountId) -> Self {
        Self {
            id,
            nominations: BTreeMap::new(),
            initial_nominations: BTreeMap::new(),
            total: 0,
            requests: PendingNominationRequests::default(),
            status: NominatorStatus::Active,
        }
    }

    pub fn amount_on(&self, candidate: &AccountId) -> Option<Balance> {
        self.nominations.get(candidate).copied()
    }

    pub fn is_leaving(&self) -> bool {
        matches!(self.status, NominatorStatus::Leaving(_))
    }

    /// Capital the ledger still holds for this nominator.
    pub fn reserved(&self) -> Balance {
        self.total + self.requests.less_total
    }

    pub fn add_live(&mut self, candidate: &AccountId, amount: Balance) {
        *self.nominations.entry(candidate.clone()).or_default() += amount;
        self.total += amount;
    }

    pub fn sub_live(&mut self, candidate: &AccountId, amount: Balance) {
        if let Some(live) = self.nominations.get_mut(candidate) {
            *live -= amount;
            self.total -= amount;
        }
    }

    /// Forget the edge entirely. Returns the live amount it held.
    pub fn drop_edge(&mut self, candidate: &AccountId) -> Balance {
        let live = self.nominations.remove(candidate).unwrap_or(0);
        self.initial_nominations.remove(candidate);
        self.total -= live;
        live
    }

    pub fn rename_candidate(&mut self, from: &AccountId, to: &AccountId) {
        if let Some(amount) = self.nominations.remove(from) {
            self.nominations.insert(to.clone(), amount);
        }
        if let Some(amount) = self.initial_nominations.remove(from) {
            self.initial_nominations.insert(to.clone(), amount);
        }
        self.requests.rename_candidate(from, to);
    }
}
