//! Candidate calls. Every call after `join_candidates` is made by the
//! candidate's controller; the self-bond is reserved on its stash.

use crate::candidate::{Candidate, CandidateBondLessRequest, CandidateStatus};
use crate::error::StakingError;
use crate::ledger::{ensure_hint, StakingLedger};
use dstake_store::CapitalReserve;
use dstake_types::{AccountId, Balance, Commission, RoundIndex};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// What an executed candidate exit released.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidateExit {
    pub candidate: AccountId,
    pub stash: AccountId,
    /// Self-bond returned to the stash.
    pub bond: Balance,
    /// Nominators whose stake on the candidate was settled.
    pub nominators_settled: usize,
    /// Live plus pending nomination capital returned.
    pub nominations_released: Balance,
}

impl<R: CapitalReserve> StakingLedger<R> {
    /// Register `controller` as a candidate backed by `stash`.
    ///
    /// Supplying a relayer makes the candidate Full tier, otherwise Basic.
    pub fn join_candidates(
        &mut self,
        stash: &AccountId,
        controller: &AccountId,
        relayer: Option<AccountId>,
        bond: Balance,
        candidate_count: u32,
    ) -> Result<(), StakingError> {
        self.transactional("join_candidates", |ledger| {
            if ledger.state.bonded_stash.contains_key(stash)
                || ledger.state.candidate_info.contains_key(stash)
            {
                return Err(StakingError::AlreadyBonded);
            }
            if ledger.state.candidate_info.contains_key(controller)
                || ledger.state.bonded_stash.contains_key(controller)
                || ledger.controller_requested(controller)
            {
                return Err(StakingError::AlreadyPaired);
            }
            if ledger.state.nominator_state.contains_key(stash)
                || ledger.state.nominator_state.contains_key(controller)
            {
                return Err(StakingError::NominatorExists);
            }
            let candidate = Candidate::new(
                controller.clone(),
                stash.clone(),
                relayer,
                bond,
                ledger.params.default_commission(),
            );
            if bond < ledger.params.min_candidate_stake(candidate.tier) {
                return Err(StakingError::CandidateBondBelowMin);
            }
            ensure_hint(
                ledger.state.candidate_pool.len(),
                candidate_count,
                StakingError::TooLowCandidateCountWeightHintJoinCandidates,
            )?;

            ledger.stage_reserve(stash, bond)?;
            ledger.add_total(bond)?;
            let tier = candidate.tier;
            ledger.state.candidate_info.insert(controller.clone(), candidate);
            ledger.state.bonded_stash.insert(stash.clone(), controller.clone());
            ledger.state.candidate_pool.insert(controller.clone(), bond);
            info!(candidate = %controller, stash = %stash, %tier, bond, "candidate joined");
            Ok(())
        })
    }

    pub fn candidate_bond_more(
        &mut self,
        controller: &AccountId,
        amount: Balance,
    ) -> Result<(), StakingError> {
        self.transactional("candidate_bond_more", |ledger| {
            if amount == 0 {
                return Err(StakingError::ZeroAmount);
            }
            let mut candidate = ledger.get_candidate(controller)?;
            if candidate.is_leaving() {
                return Err(StakingError::CandidateAlreadyLeaving);
            }
            ledger.stage_reserve(&candidate.stash, amount)?;
            candidate.bond = candidate.bond.checked_add(amount).ok_or(StakingError::Overflow)?;
            candidate.initial_bond += amount;
            ledger.add_total(amount)?;
            ledger.state.candidate_info.insert(controller.clone(), candidate);
            ledger.refresh_candidate(controller);
            debug!(candidate = %controller, amount, "candidate bonded more");
            Ok(())
        })
    }

    /// Schedule a self-bond decrease. The bond keeps counting until executed.
    pub fn schedule_candidate_bond_less(
        &mut self,
        controller: &AccountId,
        amount: Balance,
    ) -> Result<RoundIndex, StakingError> {
        self.transactional("schedule_candidate_bond_less", |ledger| {
            if amount == 0 {
                return Err(StakingError::ZeroAmount);
            }
            let mut candidate = ledger.get_candidate(controller)?;
            if candidate.is_leaving() {
                return Err(StakingError::CandidateAlreadyLeaving);
            }
            if candidate.request.is_some() {
                return Err(StakingError::PendingCandidateRequestAlreadyExists);
            }
            let min = ledger.params.min_candidate_stake(candidate.tier);
            if candidate.bond.checked_sub(amount).map_or(true, |rest| rest < min) {
                return Err(StakingError::CandidateBondBelowMin);
            }
            let when = ledger.current_round() + ledger.params.candidate_bond_less_delay;
            candidate.request = Some(CandidateBondLessRequest {
                amount,
                when_executable: when,
            });
            ledger.state.candidate_info.insert(controller.clone(), candidate);
            let mut delayed = ledger.delayed_at(when);
            delayed.bond_less.push((controller.clone(), amount));
            ledger.put_delayed(when, delayed);
            debug!(candidate = %controller, amount, when, "candidate bond less scheduled");
            Ok(when)
        })
    }

    pub fn execute_candidate_bond_less(
        &mut self,
        controller: &AccountId,
    ) -> Result<Balance, StakingError> {
        self.transactional("execute_candidate_bond_less", |ledger| {
            let mut candidate = ledger.get_candidate(controller)?;
            let request = candidate
                .request
                .ok_or(StakingError::PendingCandidateRequestsDNE)?;
            if ledger.current_round() < request.when_executable {
                return Err(StakingError::PendingCandidateRequestNotDueYet(
                    request.when_executable,
                ));
            }
            let min = ledger.params.min_candidate_stake(candidate.tier);
            let rest = candidate
                .bond
                .checked_sub(request.amount)
                .filter(|rest| *rest >= min)
                .ok_or(StakingError::CandidateBondBelowMin)?;
            candidate.bond = rest;
            candidate.initial_bond = candidate.initial_bond.saturating_sub(request.amount);
            candidate.request = None;
            let stash = candidate.stash.clone();
            ledger.state.candidate_info.insert(controller.clone(), candidate);

            let mut delayed = ledger.delayed_at(request.when_executable);
            delayed.remove_bond_less(controller);
            ledger.put_delayed(request.when_executable, delayed);

            ledger.sub_total(request.amount);
            ledger.stage_unreserve(&stash, request.amount);
            ledger.refresh_candidate(controller);
            debug!(candidate = %controller, amount = request.amount, "candidate bond less executed");
            Ok(request.amount)
        })
    }

    pub fn cancel_candidate_bond_less(&mut self, controller: &AccountId) -> Result<(), StakingError> {
        self.transactional("cancel_candidate_bond_less", |ledger| {
            let mut candidate = ledger.get_candidate(controller)?;
            let request = candidate
                .request
                .take()
                .ok_or(StakingError::PendingCandidateRequestsDNE)?;
            ledger.state.candidate_info.insert(controller.clone(), candidate);
            let mut delayed = ledger.delayed_at(request.when_executable);
            delayed.remove_bond_less(controller);
            ledger.put_delayed(request.when_executable, delayed);
            debug!(candidate = %controller, amount = request.amount, "candidate bond less cancelled");
            Ok(())
        })
    }

    /// Request that the candidate bonded to `stash` be operated by `new` from
    /// the returned round on.
    pub fn set_controller(
        &mut self,
        stash: &AccountId,
        new: &AccountId,
    ) -> Result<RoundIndex, StakingError> {
        self.transactional("set_controller", |ledger| {
            let old = ledger
                .state
                .bonded_stash
                .get(stash)
                .cloned()
                .ok_or(StakingError::StashDNE)?;
            if ledger.is_bound(new) || ledger.controller_requested(new) {
                return Err(StakingError::AlreadyPaired);
            }
            if ledger.find_controller_set(&old).is_some() {
                return Err(StakingError::PendingCandidateRequestAlreadyExists);
            }
            if ledger.get_candidate(&old)?.is_leaving() {
                return Err(StakingError::CandidateAlreadyLeaving);
            }
            let when = ledger.current_round() + ledger.params.controller_set_delay;
            let mut delayed = ledger.delayed_at(when);
            delayed.controller_sets.push((old.clone(), new.clone()));
            ledger.put_delayed(when, delayed);
            debug!(stash = %stash, old = %old, new = %new, when, "controller change scheduled");
            Ok(when)
        })
    }

    pub fn cancel_controller_set(&mut self, stash: &AccountId) -> Result<(), StakingError> {
        self.transactional("cancel_controller_set", |ledger| {
            let old = ledger
                .state
                .bonded_stash
                .get(stash)
                .cloned()
                .ok_or(StakingError::StashDNE)?;
            let when = ledger
                .find_controller_set(&old)
                .ok_or(StakingError::PendingCandidateRequestsDNE)?;
            let mut delayed = ledger.delayed_at(when);
            delayed.remove_controller_set(&old);
            ledger.put_delayed(when, delayed);
            debug!(stash = %stash, "controller change cancelled");
            Ok(())
        })
    }

    pub fn set_commission(
        &mut self,
        controller: &AccountId,
        new: Commission,
    ) -> Result<RoundIndex, StakingError> {
        self.transactional("set_commission", |ledger| {
            let candidate = ledger.get_candidate(controller)?;
            if new > ledger.params.max_commission() {
                return Err(StakingError::CannotSetAboveMax);
            }
            if ledger.find_commission_set(controller).is_some() {
                return Err(StakingError::PendingCandidateRequestAlreadyExists);
            }
            if candidate.is_leaving() {
                return Err(StakingError::CandidateAlreadyLeaving);
            }
            let when = ledger.current_round() + ledger.params.commission_set_delay;
            let mut delayed = ledger.delayed_at(when);
            delayed
                .commission_sets
                .push((controller.clone(), candidate.commission, new));
            ledger.put_delayed(when, delayed);
            debug!(candidate = %controller, old = %candidate.commission, new = %new, when, "commission change scheduled");
            Ok(when)
        })
    }

    pub fn cancel_commission_set(&mut self, controller: &AccountId) -> Result<(), StakingError> {
        self.transactional("cancel_commission_set", |ledger| {
            ledger.get_candidate(controller)?;
            let when = ledger
                .find_commission_set(controller)
                .ok_or(StakingError::PendingCandidateRequestsDNE)?;
            let mut delayed = ledger.delayed_at(when);
            delayed.remove_commission_set(controller);
            ledger.put_delayed(when, delayed);
            debug!(candidate = %controller, "commission change cancelled");
            Ok(())
        })
    }

    /// Leave the pool now; exit becomes executable at the returned round.
    pub fn schedule_leave_candidates(
        &mut self,
        controller: &AccountId,
        candidate_count: u32,
    ) -> Result<RoundIndex, StakingError> {
        self.transactional("schedule_leave_candidates", |ledger| {
            let mut candidate = ledger.get_candidate(controller)?;
            if candidate.is_leaving() {
                return Err(StakingError::CandidateAlreadyLeaving);
            }
            ensure_hint(
                ledger.state.candidate_pool.len(),
                candidate_count,
                StakingError::TooLowCandidateCountToLeaveCandidates,
            )?;
            if ledger.find_controller_set(controller).is_some() {
                return Err(StakingError::CannotLeaveIfControllerSetRequested);
            }
            if ledger.find_commission_set(controller).is_some() {
                return Err(StakingError::CannotLeaveIfCommissionSetRequested);
            }
            let when = ledger.current_round() + ledger.params.leave_candidates_delay;
            if candidate.status == CandidateStatus::KickedOut {
                candidate.kicked_out = true;
            }
            candidate.status = CandidateStatus::Leaving(when);
            ledger.state.candidate_info.insert(controller.clone(), candidate);
            ledger.state.candidate_pool.remove(controller);
            info!(candidate = %controller, when, "candidate leave scheduled");
            Ok(when)
        })
    }

    pub fn cancel_leave_candidates(
        &mut self,
        controller: &AccountId,
        candidate_count: u32,
    ) -> Result<(), StakingError> {
        self.transactional("cancel_leave_candidates", |ledger| {
            let mut candidate = ledger.get_candidate(controller)?;
            if !candidate.is_leaving() {
                return Err(StakingError::CandidateNotLeaving);
            }
            ensure_hint(
                ledger.state.candidate_pool.len(),
                candidate_count,
                StakingError::TooLowCandidateCountWeightHintCancelLeaveCandidates,
            )?;
            candidate.status = candidate.status_after_cancelled_exit();
            candidate.kicked_out = false;
            let status = candidate.status;
            let power = candidate.voting_power;
            let in_pool = candidate.in_pool();
            ledger.state.candidate_info.insert(controller.clone(), candidate);
            if in_pool {
                ledger.state.candidate_pool.insert(controller.clone(), power);
            }
            info!(candidate = %controller, status = ?status, "candidate leave cancelled");
            Ok(())
        })
    }

    /// Remove a leaving candidate, settling every nomination on it at once.
    ///
    /// Each nominator gets back its live amount plus whatever sits in open
    /// buckets on this candidate; those buckets are deleted.
    pub fn execute_leave_candidates(
        &mut self,
        controller: &AccountId,
        nomination_count: u32,
    ) -> Result<CandidateExit, StakingError> {
        self.transactional("execute_leave_candidates", |ledger| {
            let candidate = ledger.get_candidate(controller)?;
            let CandidateStatus::Leaving(when) = candidate.status else {
                return Err(StakingError::CandidateNotLeaving);
            };
            if ledger.current_round() < when {
                return Err(StakingError::CandidateCannotLeaveYet(when));
            }
            let top = ledger.state.top(controller);
            let bottom = ledger.state.bottom(controller);
            let unstaking = ledger.state.unstaking(controller);
            let nominators: BTreeSet<AccountId> = top
                .iter()
                .chain(bottom.iter())
                .chain(unstaking.iter())
                .map(|bond| bond.owner.clone())
                .collect();
            ensure_hint(
                nominators.len(),
                nomination_count,
                StakingError::TooLowCandidateNominationCountToLeaveCandidates,
            )?;

            let mut nominations_released: Balance = 0;
            for id in &nominators {
                let mut nominator = ledger.get_nominator(id)?;
                let live = nominator.drop_edge(controller);
                let pending = nominator
                    .requests
                    .remove_request(controller)
                    .map_or(0, |request| request.amount);
                ledger.stage_unreserve(id, live + pending);
                nominations_released += live + pending;
                ledger.put_nominator(nominator);
            }

            ledger.sub_total(candidate.bond + top.total() + bottom.total());
            ledger.stage_unreserve(&candidate.stash, candidate.bond);
            if let Some(request) = candidate.request {
                let mut delayed = ledger.delayed_at(request.when_executable);
                delayed.remove_bond_less(controller);
                ledger.put_delayed(request.when_executable, delayed);
            }

            let state = &mut ledger.state;
            state.candidate_info.remove(controller);
            state.bonded_stash.remove(&candidate.stash);
            state.top_nominations.remove(controller);
            state.bottom_nominations.remove(controller);
            state.unstaking_nominations.remove(controller);
            state.candidate_pool.remove(controller);
            if state.selected.get().contains(controller) {
                state.selected.update(|selected| selected.retain(|id| id != controller));
            }

            info!(
                candidate = %controller,
                bond = candidate.bond,
                nominators = nominators.len(),
                nominations_released,
                "candidate left"
            );
            Ok(CandidateExit {
                candidate: controller.clone(),
                stash: candidate.stash,
                bond: candidate.bond,
                nominators_settled: nominators.len(),
                nominations_released,
            })
        })
    }

    /// Offence handler: take a candidate out of the pool. A leaving candidate
    /// stays leaving, but cancelling its exit lands in KickedOut.
    pub fn kick_out(&mut self, candidate: &AccountId) -> Result<(), StakingError> {
        self.transactional("kick_out", |ledger| {
            let mut info = ledger.get_candidate(candidate)?;
            if info.is_leaving() {
                info.kicked_out = true;
                ledger.state.candidate_info.insert(candidate.clone(), info);
                info!(candidate = %candidate, "leaving candidate kicked out");
                return Ok(());
            }
            info.status = CandidateStatus::KickedOut;
            info.is_selected = false;
            ledger.state.candidate_info.insert(candidate.clone(), info);
            ledger.state.candidate_pool.remove(candidate);
            if ledger.state.selected.get().contains(candidate) {
                ledger
                    .state
                    .selected
                    .update(|selected| selected.retain(|id| id != candidate));
            }
            info!(candidate = %candidate, "candidate kicked out");
            Ok(())
        })
    }

    /// Offence handler: return a kicked-out candidate to the pool as Idle. A
    /// kicked-out candidate that is leaving stays leaving and loses the mark.
    pub fn restore_kicked_out(&mut self, candidate: &AccountId) -> Result<(), StakingError> {
        self.transactional("restore_kicked_out", |ledger| {
            let mut info = ledger.get_candidate(candidate)?;
            if info.is_leaving() && info.kicked_out {
                info.kicked_out = false;
                ledger.state.candidate_info.insert(candidate.clone(), info);
                info!(candidate = %candidate, "leaving candidate restored");
                return Ok(());
            }
            if info.status != CandidateStatus::KickedOut {
                return Err(StakingError::CandidateNotKickedOut);
            }
            info.status = CandidateStatus::Idle;
            let power = info.voting_power;
            ledger.state.candidate_info.insert(candidate.clone(), info);
            ledger.state.candidate_pool.insert(candidate.clone(), power);
            info!(candidate = %candidate, "candidate restored");
            Ok(())
        })
    }

    // ── Delayed request lookups ──────────────────────────────────────────

    fn controller_requested(&self, new: &AccountId) -> bool {
        self.state
            .delayed_requests
            .values()
            .any(|delayed| delayed.requests_controller(new))
    }

    fn find_controller_set(&self, old: &AccountId) -> Option<RoundIndex> {
        self.state
            .delayed_requests
            .iter()
            .find(|(_, delayed)| delayed.has_controller_set(old))
            .map(|(round, _)| *round)
    }

    fn find_commission_set(&self, candidate: &AccountId) -> Option<RoundIndex> {
        self.state
            .delayed_requests
            .iter()
            .find(|(_, delayed)| delayed.has_commission_set(candidate))
            .map(|(round, _)| *round)
    }
}
