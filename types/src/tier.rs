//! Candidate tiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which tier a candidate operates in.
///
/// Full candidates run a relayer alongside block production; Basic candidates only
/// produce blocks. The tier decides the minimum self-bond.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TierType {
    Full,
    Basic,
}

impl TierType {
    pub const ALL: [TierType; 2] = [TierType::Full, TierType::Basic];
}

impl fmt::Display for TierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TierType::Full => write!(f, "full"),
            TierType::Basic => write!(f, "basic"),
        }
    }
}
