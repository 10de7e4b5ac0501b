//! Round-keyed queues of candidate-level requests.

use dstake_types::{AccountId, Balance, Commission};
use serde::{Deserialize, Serialize};

/// Everything maturing in one round.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayedRequests {
    /// (old controller, new controller)
    pub controller_sets: Vec<(AccountId, AccountId)>,
    /// (candidate, old commission, new commission)
    pub commission_sets: Vec<(AccountId, Commission, Commission)>,
    /// (candidate, amount); an index only, the request lives on the candidate.
    pub bond_less: Vec<(AccountId, Balance)>,
}

impl DelayedRequests {
    pub fn is_empty(&self) -> bool {
        self.controller_sets.is_empty()
            && self.commission_sets.is_empty()
            && self.bond_less.is_empty()
    }

    pub fn has_controller_set(&self, old: &AccountId) -> bool {
        self.controller_sets.iter().any(|(o, _)| o == old)
    }

    pub fn requests_controller(&self, new: &AccountId) -> bool {
        self.controller_sets.iter().any(|(_, n)| n == new)
    }

    pub fn has_commission_set(&self, candidate: &AccountId) -> bool {
        self.commission_sets.iter().any(|(c, _, _)| c == candidate)
    }

    pub fn remove_controller_set(&mut self, old: &AccountId) -> bool {
        let before = self.controller_sets.len();
        self.controller_sets.retain(|(o, _)| o != old);
        before != self.controller_sets.len()
    }

    pub fn remove_commission_set(&mut self, candidate: &AccountId) -> bool {
        let before = self.commission_sets.len();
        self.commission_sets.retain(|(c, _, _)| c != candidate);
        before != self.commission_sets.len()
    }

    pub fn remove_bond_less(&mut self, candidate: &AccountId) -> bool {
        let before = self.bond_less.len();
        self.bond_less.retain(|(c, _)| c != candidate);
        before != self.bond_less.len()
    }

    /// Re-key queued entries of a candidate whose controller changed.
    pub fn rename_candidate(&mut self, from: &AccountId, to: &AccountId) {
        for (c, _, _) in &mut self.commission_sets {
            if c == from {
                *c = to.clone();
            }
        }
        for (c, _) in &mut self.bond_less {
            if c == from {
                *c = to.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removals_report_presence() {
        let mut d = DelayedRequests::default();
        d.controller_sets.push(("a".into(), "b".into()));
        d.bond_less.push(("a".into(), 5));
        assert!(d.has_controller_set(&"a".into()));
        assert!(d.requests_controller(&"b".into()));
        assert!(d.remove_controller_set(&"a".into()));
        assert!(!d.remove_controller_set(&"a".into()));
        d.rename_candidate(&"a".into(), &"z".into());
        assert_eq!(d.bond_less, vec![("z".into(), 5)]);
        assert!(d.remove_bond_less(&"z".into()));
        assert!(d.is_empty());
    }
}
