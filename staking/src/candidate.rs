//! Candidate registry records.

use crate::bond::Nominations;
use dstake_types::{AccountId, Balance, Commission, RoundIndex, TierType};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidateStatus {
    /// In the pool and selected for the current round.
    Active,
    /// In the pool but not selected.
    Idle,
    /// Exit scheduled; executable from the given round.
    Leaving(RoundIndex),
    /// Removed from the pool by the offence handler.
    KickedOut,
}

/// A scheduled self-bond decrease. The bond stays counted until execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateBondLessRequest {
    pub amount: Balance,
    pub when_executable: RoundIndex,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Controller account; the key of every per-candidate store.
    pub id: AccountId,
    /// Account whose balance backs the self-bond.
    pub stash: AccountId,
    pub relayer: Option<AccountId>,
    pub tier: TierType,
    pub status: CandidateStatus,
    pub bond: Balance,
    /// Bond at join plus explicit bond-more; the reward baseline.
    pub initial_bond: Balance,
    pub voting_power: Balance,
    pub nomination_count: u32,
    pub lowest_top_amount: Option<Balance>,
    pub highest_bottom_amount: Option<Balance>,
    pub lowest_bottom_amount: Option<Balance>,
    pub commission: Commission,
    pub is_selected: bool,
    pub request: Option<CandidateBondLessRequest>,
    /// Kicked out before or while leaving; a cancelled exit returns to KickedOut.
    pub kicked_out: bool,
}

impl Candidate {
    pub fn new(
        id: AccountId,
        stash: AccountId,
        relayer: Option<AccountId>,
        bond: Balance,
        commission: Commission,
    ) -> Self {
        let tier = if relayer.is_some() {
            TierType::Full
        } else {
            TierType::Basic
        };
        Self {
            id,
            stash,
            relayer,
            tier,
            status: CandidateStatus::Active,
            bond,
            initial_bond: bond,
            voting_power: bond,
            nomination_count: 0,
            lowest_top_amount: None,
            highest_bottom_amount: None,
            lowest_bottom_amount: None,
            commission,
            is_selected: false,
            request: None,
            kicked_out: false,
        }
    }

    /// Eligible for selection: Active or Idle.
    pub fn in_pool(&self) -> bool {
        matches!(self.status, CandidateStatus::Active | CandidateStatus::Idle)
    }

    pub fn is_leaving(&self) -> bool {
        matches!(self.status, CandidateStatus::Leaving(_))
    }

    /// Status to return to when a scheduled exit is cancelled.
    pub fn status_after_cancelled_exit(&self) -> CandidateStatus {
        if self.kicked_out {
            CandidateStatus::KickedOut
        } else {
            CandidateStatus::Active
        }
    }

    /// Recompute the cached figures from the authoritative lists.
    pub fn refresh(&mut self, top: &Nominations, bottom: &Nominations) {
        self.voting_power = self.bond + top.total();
        self.nomination_count = (top.len() + bottom.len()) as u32;
        self.lowest_top_amount = top.lowest();
        self.highest_bottom_amount = bottom.highest();
        self.lowest_bottom_amount = bottom.lowest();
    }

    /// Check the cached figures and the Top/Bottom boundary against the lists.
    pub fn check(&self, top: &Nominations, bottom: &Nominations) -> Result<(), String> {
        if self.voting_power != self.bond + top.total() {
            return Err(format!(
                "{}: voting power {} != bond {} + top {}",
                self.id,
                self.voting_power,
                self.bond,
                top.total()
            ));
        }
        if self.lowest_top_amount != top.lowest() {
            return Err(format!(
                "{}: lowest top {:?} != {:?}",
                self.id,
                self.lowest_top_amount,
                top.lowest()
            ));
        }
        if self.highest_bottom_amount != bottom.highest()
            || self.lowest_bottom_amount != bottom.lowest()
        {
            return Err(format!("{}: stale bottom extremes", self.id));
        }
        if let (Some(low_top), Some(high_bottom)) = (top.lowest(), bottom.highest()) {
            if low_top < high_bottom {
                return Err(format!(
                    "{}: top minimum {} below bottom maximum {}",
                    self.id, low_top, high_bottom
                ));
            }
        }
        let sorted = |list: &Nominations| {
            list.as_slice()
                .windows(2)
                .all(|w| w[0].amount >= w[1].amount)
        };
        if !sorted(top) || !sorted(bottom) {
            return Err(format!("{}: list out of order", self.id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bond::Bond;

    #[test]
    fn tier_follows_relayer() {
        let full = Candidate::new("c".into(), "s".into(), Some("r".into()), 10, Commission::ZERO);
        let basic = Candidate::new("c".into(), "s".into(), None, 10, Commission::ZERO);
        assert_eq!(full.tier, TierType::Full);
        assert_eq!(basic.tier, TierType::Basic);
    }

    #[test]
    fn refresh_then_check() {
        let mut c = Candidate::new("c".into(), "s".into(), None, 100, Commission::ZERO);
        let mut top = Nominations::new();
        top.insert_sorted(Bond::new("a".into(), 30));
        top.insert_sorted(Bond::new("b".into(), 20));
        let mut bottom = Nominations::new();
        bottom.insert_sorted(Bond::new("d".into(), 10));

        assert!(c.check(&top, &bottom).is_err());
        c.refresh(&top, &bottom);
        assert_eq!(c.voting_power, 150);
        assert_eq!(c.nomination_count, 3);
        assert_eq!(c.lowest_top_amount, Some(20));
        assert_eq!(c.highest_bottom_amount, Some(10));
        assert!(c.check(&top, &bottom).is_ok());
    }
}
