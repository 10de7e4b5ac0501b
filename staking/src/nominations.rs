//! Nominator calls: nominate, bond more, scheduled decrease/revoke/leave, and
//! execution or cancellation of the resulting round buckets.

use crate::bond::Bond;
use crate::error::StakingError;
use crate::ledger::{ensure_hint, StakingLedger};
use crate::nominator::{NominationAction, Nominator, NominatorStatus};
use crate::ranking::NominationOutcome;
use crate::state::LedgerState;
use dstake_store::CapitalReserve;
use dstake_types::{AccountId, Balance, RoundIndex};
use tracing::{debug, info};

impl<R: CapitalReserve> StakingLedger<R> {
    /// Back `candidate` with `amount`, creating the nominator on first use.
    ///
    /// `candidate_nomination_count` must cover the candidate's current number
    /// of nominations and `nomination_count` the nominator's.
    pub fn nominate(
        &mut self,
        nominator: &AccountId,
        candidate: &AccountId,
        amount: Balance,
        candidate_nomination_count: u32,
        nomination_count: u32,
    ) -> Result<NominationOutcome, StakingError> {
        self.transactional("nominate", |ledger| {
            if amount == 0 {
                return Err(StakingError::ZeroAmount);
            }
            if amount < ledger.params.min_nomination {
                return Err(StakingError::NominationBelowMin);
            }
            if ledger.state.candidate_info.contains_key(nominator)
                || ledger.state.bonded_stash.contains_key(nominator)
            {
                return Err(StakingError::CandidateExists);
            }
            let info = ledger.get_candidate(candidate)?;
            if info.is_leaving() {
                return Err(StakingError::CandidateAlreadyLeaving);
            }
            ensure_hint(
                info.nomination_count as usize,
                candidate_nomination_count,
                StakingError::TooLowCandidateNominationCountToNominate,
            )?;

            let mut state = match ledger.state.nominator_state.get(nominator) {
                Some(existing) => {
                    ensure_hint(
                        existing.nominations.len(),
                        nomination_count,
                        StakingError::TooLowNominationCountToNominate,
                    )?;
                    if existing.is_leaving() {
                        return Err(StakingError::NominatorAlreadyLeaving);
                    }
                    if existing.nominations.contains_key(candidate) {
                        return Err(StakingError::AlreadyNominatedCandidate);
                    }
                    if existing.nominations.len()
                        >= ledger.params.max_nominations_per_nominator as usize
                    {
                        return Err(StakingError::ExceedMaxNominationsPerNominator);
                    }
                    existing.clone()
                }
                None => {
                    if amount < ledger.params.min_nominator_stake {
                        return Err(StakingError::NominatorBondBelowMin);
                    }
                    Nominator::new(nominator.clone())
                }
            };

            ledger.stage_reserve(nominator, amount)?;
            state.add_live(candidate, amount);
            state.initial_nominations.insert(candidate.clone(), amount);
            ledger.put_nominator(state);

            let outcome = ledger.add_nomination(candidate, Bond::new(nominator.clone(), amount))?;
            info!(
                nominator = %nominator,
                candidate = %candidate,
                amount,
                placement = ?outcome.placement,
                evicted = outcome.evicted.len(),
                "nominated"
            );
            Ok(outcome)
        })
    }

    /// Add `amount` to an existing nomination.
    ///
    /// An outstanding Decrease on the pair is cancelled and folded back into
    /// the live amount. An outstanding Revoke or Leave is cancelled and the
    /// edge re-enters the ranking with the restored amount plus `amount`; a
    /// superseded Leave returns the nominator to Active.
    pub fn nominator_bond_more(
        &mut self,
        nominator: &AccountId,
        candidate: &AccountId,
        amount: Balance,
    ) -> Result<NominationOutcome, StakingError> {
        self.transactional("nominator_bond_more", |ledger| {
            if amount == 0 {
                return Err(StakingError::ZeroAmount);
            }
            let mut state = ledger.get_nominator(nominator)?;
            let live = state
                .amount_on(candidate)
                .ok_or(StakingError::NominationDNE)?;
            let pending_action = state.requests.get(candidate).map(|request| request.action);
            if state.is_leaving() && pending_action != Some(NominationAction::Leave) {
                return Err(StakingError::NominatorAlreadyLeaving);
            }
            ledger.stage_reserve(nominator, amount)?;
            *state
                .initial_nominations
                .entry(candidate.clone())
                .or_default() += amount;

            let cancelled = state.requests.remove_request(candidate);
            let restored = cancelled.as_ref().map_or(0, |request| request.amount);
            if restored > 0 {
                ledger.unstake(candidate, nominator, restored);
            }
            if cancelled
                .as_ref()
                .is_some_and(|request| request.action == NominationAction::Leave)
            {
                state.status = NominatorStatus::Active;
                state.requests.downgrade_leaves();
            }

            let raise = restored + amount;
            state.add_live(candidate, raise);
            ledger.put_nominator(state);

            let outcome = if live > 0 {
                let placement = ledger.increase_nomination(candidate, nominator, raise)?;
                NominationOutcome {
                    placement,
                    evicted: Vec::new(),
                }
            } else {
                ledger.add_nomination(candidate, Bond::new(nominator.clone(), raise))?
            };
            debug!(nominator = %nominator, candidate = %candidate, amount, restored, "nomination bonded more");
            Ok(outcome)
        })
    }

    /// Lower a nomination by `amount` now; the capital stays reserved until
    /// the bucket at the returned round is executed.
    pub fn schedule_nominator_bond_less(
        &mut self,
        nominator: &AccountId,
        candidate: &AccountId,
        amount: Balance,
    ) -> Result<RoundIndex, StakingError> {
        self.transactional("schedule_nominator_bond_less", |ledger| {
            if amount == 0 {
                return Err(StakingError::ZeroAmount);
            }
            let mut state = ledger.get_nominator(nominator)?;
            if state.is_leaving() {
                return Err(StakingError::NominatorAlreadyLeaving);
            }
            let live = state
                .amount_on(candidate)
                .ok_or(StakingError::NominationDNE)?;
            if state
                .requests
                .get(candidate)
                .is_some_and(|request| request.action.is_revocation())
            {
                return Err(StakingError::PendingNominationRequestAlreadyExists);
            }
            if amount >= live || live - amount < ledger.params.min_nomination {
                return Err(StakingError::NominationBelowMin);
            }
            if state.total - amount < ledger.params.min_nominator_stake {
                return Err(StakingError::NominatorBondBelowMin);
            }

            let when = ledger.current_round() + ledger.params.nomination_bond_less_delay;
            state.sub_live(candidate, amount);
            state
                .requests
                .schedule(candidate, when, amount, NominationAction::Decrease);
            ledger.put_nominator(state);
            ledger.stake_pending(candidate, nominator, amount);
            ledger.decrease_nomination(candidate, nominator, amount)?;
            debug!(nominator = %nominator, candidate = %candidate, amount, when, "nomination decrease scheduled");
            Ok(when)
        })
    }

    /// Withdraw a whole nomination now; the capital is released when the
    /// bucket at the returned round is executed.
    pub fn schedule_revoke_nomination(
        &mut self,
        nominator: &AccountId,
        candidate: &AccountId,
    ) -> Result<RoundIndex, StakingError> {
        self.transactional("schedule_revoke_nomination", |ledger| {
            let mut state = ledger.get_nominator(nominator)?;
            if state.is_leaving() {
                return Err(StakingError::NominatorAlreadyLeaving);
            }
            let live = state
                .amount_on(candidate)
                .ok_or(StakingError::NominationDNE)?;
            if live == 0
                || state
                    .requests
                    .get(candidate)
                    .is_some_and(|request| request.action.is_revocation())
            {
                return Err(StakingError::PendingNominationRequestAlreadyExists);
            }
            let remaining = state.total - live;
            if remaining > 0 && remaining < ledger.params.min_nominator_stake {
                return Err(StakingError::NominatorBondBelowMin);
            }

            let when = ledger.current_round() + ledger.params.revoke_nomination_delay;
            state.sub_live(candidate, live);
            state
                .requests
                .schedule(candidate, when, live, NominationAction::Revoke);
            ledger.put_nominator(state);
            ledger.stake_pending(candidate, nominator, live);
            ledger.remove_nomination(candidate, nominator)?;
            debug!(nominator = %nominator, candidate = %candidate, amount = live, when, "revoke scheduled");
            Ok(when)
        })
    }

    /// Schedule a Leave bucket on every live nomination and mark the
    /// nominator as leaving.
    pub fn schedule_leave_nominators(
        &mut self,
        nominator: &AccountId,
    ) -> Result<RoundIndex, StakingError> {
        self.transactional("schedule_leave_nominators", |ledger| {
            let mut state = ledger.get_nominator(nominator)?;
            if state.is_leaving() {
                return Err(StakingError::NominatorAlreadyLeaving);
            }
            let when = ledger.current_round() + ledger.params.leave_nominators_delay;
            let live: Vec<(AccountId, Balance)> = state
                .nominations
                .iter()
                .filter(|(_, amount)| **amount > 0)
                .map(|(candidate, amount)| (candidate.clone(), *amount))
                .collect();
            for (candidate, amount) in &live {
                state.sub_live(candidate, *amount);
                state
                    .requests
                    .schedule(candidate, when, *amount, NominationAction::Leave);
                ledger.stake_pending(candidate, nominator, *amount);
                ledger.remove_nomination(candidate, nominator)?;
            }
            state.status = NominatorStatus::Leaving(when);
            ledger.put_nominator(state);
            info!(nominator = %nominator, when, nominations = live.len(), "leave scheduled");
            Ok(when)
        })
    }

    /// Release the bucket at `round` on `candidate`. Returns the unreserved amount.
    pub fn execute_nomination_request(
        &mut self,
        nominator: &AccountId,
        candidate: &AccountId,
        round: RoundIndex,
    ) -> Result<Balance, StakingError> {
        self.transactional("execute_nomination_request", |ledger| {
            let mut state = ledger.get_nominator(nominator)?;
            let has_bucket = state
                .requests
                .get(candidate)
                .is_some_and(|request| request.when_executable.contains_key(&round));
            if !has_bucket {
                return Err(StakingError::PendingNominationRequestDNE);
            }
            if ledger.current_round() < round {
                return Err(StakingError::PendingNominationRequestNotDueYet(round));
            }
            let (amount, action) = state
                .requests
                .take_bucket(candidate, round)
                .ok_or(StakingError::PendingNominationRequestDNE)?;

            ledger.stage_unreserve(nominator, amount);
            ledger.unstake(candidate, nominator, amount);
            if action.is_revocation()
                && state.requests.get(candidate).is_none()
                && state.amount_on(candidate) == Some(0)
            {
                state.drop_edge(candidate);
            }
            let removed = ledger.put_nominator(state);
            debug!(
                nominator = %nominator,
                candidate = %candidate,
                round,
                amount,
                action = ?action,
                nominator_removed = removed,
                "nomination request executed"
            );
            Ok(amount)
        })
    }

    /// Put the bucket at `round` back into the ranking.
    pub fn cancel_nomination_request(
        &mut self,
        nominator: &AccountId,
        candidate: &AccountId,
        round: RoundIndex,
    ) -> Result<NominationOutcome, StakingError> {
        self.transactional("cancel_nomination_request", |ledger| {
            let mut state = ledger.get_nominator(nominator)?;
            let action = state
                .requests
                .get(candidate)
                .map(|request| request.action)
                .ok_or(StakingError::PendingNominationRequestDNE)?;
            if state.is_leaving() && action != NominationAction::Leave {
                return Err(StakingError::NominatorAlreadyLeaving);
            }
            let outcome = ledger.cancel_bucket(&mut state, candidate, round)?;
            ledger.put_nominator(state);
            Ok(outcome)
        })
    }

    /// Settle every bucket of a leaving nominator and delete it.
    /// Returns the unreserved amount.
    pub fn execute_leave_nominators(
        &mut self,
        nominator: &AccountId,
        nomination_count: u32,
    ) -> Result<Balance, StakingError> {
        self.transactional("execute_leave_nominators", |ledger| {
            let state = ledger.get_nominator(nominator)?;
            let NominatorStatus::Leaving(when) = state.status else {
                return Err(StakingError::NominatorNotLeaving);
            };
            if ledger.current_round() < when {
                return Err(StakingError::NominatorCannotLeaveYet(when));
            }
            ensure_hint(
                state.nominations.len(),
                nomination_count,
                StakingError::TooLowNominationCountToLeaveNominators,
            )?;

            for (candidate, live) in &state.nominations {
                if *live > 0 {
                    ledger.remove_nomination(candidate, nominator)?;
                }
                if let Some(request) = state.requests.get(candidate) {
                    ledger.unstake(candidate, nominator, request.amount);
                }
            }
            let released = state.reserved();
            ledger.stage_unreserve(nominator, released);
            ledger.state.nominator_state.remove(nominator);
            info!(nominator = %nominator, released, "nominator left");
            Ok(released)
        })
    }

    /// Cancel every Leave bucket at once; the nominator becomes Active again.
    pub fn cancel_leave_nominators(
        &mut self,
        nominator: &AccountId,
    ) -> Result<Vec<NominationOutcome>, StakingError> {
        self.transactional("cancel_leave_nominators", |ledger| {
            let mut state = ledger.get_nominator(nominator)?;
            let NominatorStatus::Leaving(when) = state.status else {
                return Err(StakingError::NominatorNotLeaving);
            };
            let leaving: Vec<AccountId> = state
                .requests
                .requests
                .values()
                .filter(|request| {
                    request.action == NominationAction::Leave
                        && request.when_executable.contains_key(&when)
                })
                .map(|request| request.candidate.clone())
                .collect();
            let mut outcomes = Vec::with_capacity(leaving.len());
            for candidate in &leaving {
                outcomes.push(ledger.cancel_bucket(&mut state, candidate, when)?);
            }
            state.status = NominatorStatus::Active;
            state.requests.downgrade_leaves();
            ledger.put_nominator(state);
            info!(nominator = %nominator, restored = leaving.len(), "leave cancelled");
            Ok(outcomes)
        })
    }

    /// Undo one bucket: restore its amount to the live edge and re-rank it.
    fn cancel_bucket(
        &mut self,
        state: &mut Nominator,
        candidate: &AccountId,
        round: RoundIndex,
    ) -> Result<NominationOutcome, StakingError> {
        let (amount, action) = state
            .requests
            .take_bucket(candidate, round)
            .ok_or(StakingError::PendingNominationRequestDNE)?;
        self.unstake(candidate, &state.id, amount);

        if action == NominationAction::Leave {
            state.status = NominatorStatus::Active;
            state.requests.downgrade_leaves();
        }
        // The edge is live again, so what remains can only be a decrease.
        state
            .requests
            .set_action(candidate, NominationAction::Decrease);

        let live = state.amount_on(candidate).unwrap_or(0);
        state.add_live(candidate, amount);
        let outcome = if live > 0 {
            let placement = self.increase_nomination(candidate, &state.id, amount)?;
            NominationOutcome {
                placement,
                evicted: Vec::new(),
            }
        } else {
            self.add_nomination(candidate, Bond::new(state.id.clone(), amount))?
        };
        debug!(
            nominator = %state.id,
            candidate = %candidate,
            round,
            amount,
            placement = ?outcome.placement,
            "nomination request cancelled"
        );
        Ok(outcome)
    }

    /// Record `amount` as pending withdrawal in the candidate's unstaking list.
    fn stake_pending(&mut self, candidate: &AccountId, nominator: &AccountId, amount: Balance) {
        let mut unstaking = self.state.unstaking(candidate);
        unstaking.add_amount(nominator, amount);
        LedgerState::put_list(&mut self.state.unstaking_nominations, candidate, unstaking);
    }

    fn unstake(&mut self, candidate: &AccountId, nominator: &AccountId, amount: Balance) {
        let mut unstaking = self.state.unstaking(candidate);
        unstaking.sub_amount(nominator, amount);
        LedgerState::put_list(&mut self.state.unstaking_nominations, candidate, unstaking);
    }
}
