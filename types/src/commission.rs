//! Commission rate in basis points.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A candidate's commission, in basis points (10_000 = 100%).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Commission(u32);

impl Commission {
    /// 100%.
    pub const MAX_BPS: u32 = 10_000;

    pub const ZERO: Self = Self(0);

    pub fn from_bps(bps: u32) -> Self {
        Self(bps)
    }

    pub fn bps(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Commission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_renders_percent() {
        assert_eq!(Commission::from_bps(1_050).to_string(), "10.50%");
        assert_eq!(Commission::ZERO.to_string(), "0.00%");
    }
}
