//! Round clock state.

use dstake_types::{BlockNumber, RoundIndex};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundInfo {
    pub current: RoundIndex,
    pub first_block: BlockNumber,
    /// Blocks per round.
    pub length: BlockNumber,
}

impl RoundInfo {
    pub fn new(current: RoundIndex, first_block: BlockNumber, length: BlockNumber) -> Self {
        Self {
            current,
            first_block,
            length,
        }
    }

    /// True once `block` is at least one full round past `first_block`.
    pub fn should_update(&self, block: BlockNumber) -> bool {
        block.saturating_sub(self.first_block) >= self.length
    }

    /// Move to the next round starting at `block`.
    pub fn update(&mut self, block: BlockNumber) {
        self.current += 1;
        self.first_block = block;
    }
}

impl Default for RoundInfo {
    fn default() -> Self {
        Self::new(1, 0, 600)
    }
}
