//! Round transition: delayed candidate requests, selection status and
//! per-round snapshots.

use crate::candidate::CandidateStatus;
use crate::error::StakingError;
use crate::ledger::StakingLedger;
use crate::snapshot::{CandidateSnapshot, TotalSnapshot};
use dstake_store::CapitalReserve;
use dstake_types::{AccountId, BlockNumber, RoundIndex};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

impl<R: CapitalReserve> StakingLedger<R> {
    /// True when `block` is far enough past the round start to advance.
    pub fn should_advance(&self, block: BlockNumber) -> bool {
        self.state.round.get().should_update(block)
    }

    /// Advance to the next round starting at `block`.
    ///
    /// `selected` is the externally chosen candidate set for the new round;
    /// every entry must be in the candidate pool. Returns the new round.
    pub fn new_round(
        &mut self,
        block: BlockNumber,
        selected: &[AccountId],
    ) -> Result<RoundIndex, StakingError> {
        self.transactional("new_round", |ledger| {
            ledger.state.round.update(|round| round.update(block));
            let round = ledger.current_round();

            let renamed = ledger.apply_delayed_requests(round);
            let selected: Vec<AccountId> = selected
                .iter()
                .map(|id| renamed.get(id).unwrap_or(id).clone())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();
            if selected
                .iter()
                .any(|id| !ledger.state.candidate_pool.contains_key(id))
            {
                return Err(StakingError::InvalidSelection);
            }

            ledger.apply_selection(&selected);
            ledger.take_snapshots(round)?;
            ledger.prune_snapshots(round);

            info!(
                round,
                block,
                selected = selected.len(),
                total = ledger.total(),
                "round started"
            );
            Ok(round)
        })
    }

    /// Apply controller and commission changes maturing at or before `round`.
    /// Returns old → new controller for every change applied.
    fn apply_delayed_requests(&mut self, round: RoundIndex) -> BTreeMap<AccountId, AccountId> {
        let due: Vec<RoundIndex> = self
            .state
            .delayed_requests
            .keys()
            .copied()
            .filter(|r| *r <= round)
            .collect();
        let mut renamed = BTreeMap::new();

        for at in due {
            let mut delayed = self.delayed_at(at);
            let commission_sets = std::mem::take(&mut delayed.commission_sets);
            let controller_sets = std::mem::take(&mut delayed.controller_sets);
            self.put_delayed(at, delayed);

            for (candidate, old, new) in commission_sets {
                if let Some(info) = self.state.candidate_info.get_mut(&candidate) {
                    info.commission = new;
                    info!(candidate = %candidate, %old, %new, "commission changed");
                }
            }
            for (old, new) in controller_sets {
                if !self.state.candidate_info.contains_key(&old) {
                    continue;
                }
                if self.is_bound(&new) {
                    warn!(old = %old, new = %new, "controller change skipped, account already bound");
                    continue;
                }
                self.rekey_candidate(&old, &new);
                info!(old = %old, new = %new, "controller changed");
                renamed.insert(old, new);
            }
        }
        renamed
    }

    /// Move every live record keyed by `old` to `new`. Snapshots keep the old key.
    fn rekey_candidate(&mut self, old: &AccountId, new: &AccountId) {
        let state = &mut self.state;
        let Some(mut info) = state.candidate_info.remove(old) else {
            return;
        };
        info.id = new.clone();
        state.bonded_stash.insert(info.stash.clone(), new.clone());
        state.candidate_info.insert(new.clone(), info);

        let mut owners = BTreeSet::new();
        for map in [
            &mut state.top_nominations,
            &mut state.bottom_nominations,
            &mut state.unstaking_nominations,
        ] {
            if let Some(list) = map.remove(old) {
                owners.extend(list.iter().map(|bond| bond.owner.clone()));
                map.insert(new.clone(), list);
            }
        }
        if let Some(power) = state.candidate_pool.remove(old) {
            state.candidate_pool.insert(new.clone(), power);
        }
        if state.selected.get().contains(old) {
            state.selected.update(|selected| {
                for id in selected.iter_mut().filter(|id| **id == *old) {
                    *id = new.clone();
                }
            });
        }
        for owner in owners {
            if let Some(nominator) = state.nominator_state.get_mut(&owner) {
                nominator.rename_candidate(old, new);
            }
        }
        let rounds: Vec<RoundIndex> = state.delayed_requests.keys().copied().collect();
        for round in rounds {
            if let Some(delayed) = state.delayed_requests.get_mut(&round) {
                delayed.rename_candidate(old, new);
            }
        }
    }

    fn apply_selection(&mut self, selected: &[AccountId]) {
        let ids: Vec<AccountId> = self.state.candidate_info.keys().cloned().collect();
        for id in ids {
            let chosen = selected.contains(&id);
            let Some(info) = self.state.candidate_info.get(&id) else {
                continue;
            };
            let status = match info.status {
                CandidateStatus::Active | CandidateStatus::Idle if chosen => CandidateStatus::Active,
                CandidateStatus::Active | CandidateStatus::Idle => CandidateStatus::Idle,
                other => other,
            };
            if info.status != status || info.is_selected != chosen {
                if let Some(info) = self.state.candidate_info.get_mut(&id) {
                    info.status = status;
                    info.is_selected = chosen;
                }
            }
        }
        self.state.selected.set(selected.to_vec());
    }

    fn take_snapshots(&mut self, round: RoundIndex) -> Result<(), StakingError> {
        if self.state.total_at_stake.contains_key(&round) {
            return Err(StakingError::SnapshotAlreadyExists(round));
        }
        let mut total = TotalSnapshot {
            round,
            total_stake: self.total(),
            ..TotalSnapshot::default()
        };
        let mut active_nominators = BTreeSet::new();
        let mut snapshots = Vec::new();

        for (id, info) in self.state.candidate_info.iter() {
            let top = self.state.top(id);
            let bottom = self.state.bottom(id);
            total.total_self_bond += info.bond;
            total.total_top_nominations += top.total();
            total.total_bottom_nominations += bottom.total();
            total.total_voting_power += info.voting_power;

            let tier = total.per_tier.entry(info.tier).or_default();
            tier.candidates += 1;
            tier.self_bond += info.bond;
            tier.top_nominations += top.total();
            tier.bottom_nominations += bottom.total();
            tier.voting_power += info.voting_power;

            if info.is_selected {
                total.active_self_bond += info.bond;
                total.active_voting_power += info.voting_power;
                active_nominators.extend(top.iter().map(|bond| bond.owner.clone()));
                snapshots.push(CandidateSnapshot {
                    round,
                    candidate: id.clone(),
                    stash: info.stash.clone(),
                    tier: info.tier,
                    bond: info.bond,
                    voting_power: info.voting_power,
                    commission: info.commission,
                    top_nominations: top.as_slice().to_vec(),
                    bottom_nominations: bottom.as_slice().to_vec(),
                });
            }
        }
        total.active_nominators = active_nominators.len() as u32;

        for snapshot in snapshots {
            let key = (round, snapshot.candidate.clone());
            if self.state.at_stake.contains_key(&key) {
                return Err(StakingError::SnapshotAlreadyExists(round));
            }
            self.state.at_stake.insert(key, snapshot);
        }
        self.state.total_at_stake.insert(round, total);
        Ok(())
    }

    fn prune_snapshots(&mut self, round: RoundIndex) {
        let retention = self.params.snapshot_retention_rounds;
        if retention == 0 || round <= retention {
            return;
        }
        let cutoff = round - retention;
        let totals: Vec<RoundIndex> = self
            .state
            .total_at_stake
            .keys()
            .copied()
            .filter(|r| *r < cutoff)
            .collect();
        for r in &totals {
            self.state.total_at_stake.remove(r);
        }
        let candidates: Vec<(RoundIndex, AccountId)> = self
            .state
            .at_stake
            .keys()
            .filter(|(r, _)| *r < cutoff)
            .cloned()
            .collect();
        for key in &candidates {
            self.state.at_stake.remove(key);
        }
        if !totals.is_empty() {
            debug!(cutoff, pruned = totals.len(), "snapshots pruned");
        }
    }
}
