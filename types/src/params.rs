//! Staking parameters: capacities, minimum bonds, delays and round length.
//!
//! Loaded from a TOML file via [`StakingParams::from_toml_file`] or built
//! programmatically (e.g. for tests). Every field has a serde default, so a
//! partial TOML document only overrides what it names.

use crate::amount::{Balance, UNIT};
use crate::commission::Commission;
use crate::error::ParamsError;
use crate::round::{BlockNumber, RoundIndex};
use crate::tier::TierType;
use serde::{Deserialize, Serialize};

/// All tunables of the staking ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingParams {
    // ── Ranking capacities ───────────────────────────────────────────────
    /// K: nominations counted toward a candidate's voting power.
    #[serde(default = "default_max_top")]
    pub max_top_nominations_per_candidate: u32,

    /// M: nominations kept in reserve below the top list.
    #[serde(default = "default_max_bottom")]
    pub max_bottom_nominations_per_candidate: u32,

    /// Maximum number of candidates a single nominator may back.
    #[serde(default = "default_max_nominations_per_nominator")]
    pub max_nominations_per_nominator: u32,

    // ── Minimum bonds (raw units) ────────────────────────────────────────
    #[serde(default = "default_min_full_candidate_stake", with = "crate::amount::as_u64")]
    pub min_full_candidate_stake: Balance,

    #[serde(default = "default_min_basic_candidate_stake", with = "crate::amount::as_u64")]
    pub min_basic_candidate_stake: Balance,

    /// Minimum amount of a single nomination edge.
    #[serde(default = "default_min_nomination", with = "crate::amount::as_u64")]
    pub min_nomination: Balance,

    /// Minimum sum of a nominator's live nominations.
    #[serde(default = "default_min_nominator_stake", with = "crate::amount::as_u64")]
    pub min_nominator_stake: Balance,

    // ── Delays (rounds) ──────────────────────────────────────────────────
    #[serde(default = "default_exit_delay")]
    pub leave_candidates_delay: RoundIndex,

    #[serde(default = "default_bond_less_delay")]
    pub candidate_bond_less_delay: RoundIndex,

    #[serde(default = "default_exit_delay")]
    pub leave_nominators_delay: RoundIndex,

    #[serde(default = "default_exit_delay")]
    pub revoke_nomination_delay: RoundIndex,

    #[serde(default = "default_bond_less_delay")]
    pub nomination_bond_less_delay: RoundIndex,

    #[serde(default = "default_request_delay")]
    pub controller_set_delay: RoundIndex,

    #[serde(default = "default_request_delay")]
    pub commission_set_delay: RoundIndex,

    // ── Commission ───────────────────────────────────────────────────────
    #[serde(default = "default_commission_bps")]
    pub default_commission_bps: u32,

    #[serde(default = "default_max_commission_bps")]
    pub max_commission_bps: u32,

    // ── Round clock & snapshots ──────────────────────────────────────────
    /// Blocks per round.
    #[serde(default = "default_round_length")]
    pub round_length: BlockNumber,

    /// Rounds of snapshots to keep (0 = keep forever).
    #[serde(default)]
    pub snapshot_retention_rounds: RoundIndex,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_max_top() -> u32 {
    300
}

fn default_max_bottom() -> u32 {
    50
}

fn default_max_nominations_per_nominator() -> u32 {
    100
}

fn default_min_full_candidate_stake() -> Balance {
    1_000 * UNIT
}

fn default_min_basic_candidate_stake() -> Balance {
    500 * UNIT
}

fn default_min_nomination() -> Balance {
    UNIT
}

fn default_min_nominator_stake() -> Balance {
    UNIT
}

fn default_exit_delay() -> RoundIndex {
    28
}

fn default_bond_less_delay() -> RoundIndex {
    28
}

fn default_request_delay() -> RoundIndex {
    2
}

fn default_commission_bps() -> u32 {
    1_000
}

fn default_max_commission_bps() -> u32 {
    5_000
}

fn default_round_length() -> BlockNumber {
    600
}

// ── Impl ───────────────────────────────────────────────────────────────

impl StakingParams {
    /// Load parameters from a TOML file and validate them.
    pub fn from_toml_file(path: &str) -> Result<Self, ParamsError> {
        let content = std::fs::read_to_string(path).map_err(|e| ParamsError::Io(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse parameters from a TOML string and validate them.
    pub fn from_toml_str(s: &str) -> Result<Self, ParamsError> {
        let params: Self = toml::from_str(s).map_err(|e| ParamsError::Parse(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    /// Serialize the parameters to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ParamsError> {
        toml::to_string_pretty(self).map_err(|e| ParamsError::Parse(e.to_string()))
    }

    /// Reject combinations the ledger cannot operate with.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.max_top_nominations_per_candidate == 0 {
            return Err(ParamsError::Invalid {
                field: "max_top_nominations_per_candidate",
                reason: "must be at least 1".into(),
            });
        }
        if self.max_nominations_per_nominator == 0 {
            return Err(ParamsError::Invalid {
                field: "max_nominations_per_nominator",
                reason: "must be at least 1".into(),
            });
        }
        if self.max_commission_bps > Commission::MAX_BPS {
            return Err(ParamsError::Invalid {
                field: "max_commission_bps",
                reason: format!("{} exceeds {}", self.max_commission_bps, Commission::MAX_BPS),
            });
        }
        if self.default_commission_bps > self.max_commission_bps {
            return Err(ParamsError::Invalid {
                field: "default_commission_bps",
                reason: format!(
                    "{} exceeds max_commission_bps {}",
                    self.default_commission_bps, self.max_commission_bps
                ),
            });
        }
        if self.round_length == 0 {
            return Err(ParamsError::Invalid {
                field: "round_length",
                reason: "must be at least 1 block".into(),
            });
        }
        Ok(())
    }

    /// Minimum self-bond for a candidate of the given tier.
    pub fn min_candidate_stake(&self, tier: TierType) -> Balance {
        match tier {
            TierType::Full => self.min_full_candidate_stake,
            TierType::Basic => self.min_basic_candidate_stake,
        }
    }

    pub fn max_top(&self) -> usize {
        self.max_top_nominations_per_candidate as usize
    }

    pub fn max_bottom(&self) -> usize {
        self.max_bottom_nominations_per_candidate as usize
    }

    pub fn default_commission(&self) -> Commission {
        Commission::from_bps(self.default_commission_bps)
    }

    pub fn max_commission(&self) -> Commission {
        Commission::from_bps(self.max_commission_bps)
    }
}

impl Default for StakingParams {
    fn default() -> Self {
        Self {
            max_top_nominations_per_candidate: default_max_top(),
            max_bottom_nominations_per_candidate: default_max_bottom(),
            max_nominations_per_nominator: default_max_nominations_per_nominator(),
            min_full_candidate_stake: default_min_full_candidate_stake(),
            min_basic_candidate_stake: default_min_basic_candidate_stake(),
            min_nomination: default_min_nomination(),
            min_nominator_stake: default_min_nominator_stake(),
            leave_candidates_delay: default_exit_delay(),
            candidate_bond_less_delay: default_bond_less_delay(),
            leave_nominators_delay: default_exit_delay(),
            revoke_nomination_delay: default_exit_delay(),
            nomination_bond_less_delay: default_bond_less_delay(),
            controller_set_delay: default_request_delay(),
            commission_set_delay: default_request_delay(),
            default_commission_bps: default_commission_bps(),
            max_commission_bps: default_max_commission_bps(),
            round_length: default_round_length(),
            snapshot_retention_rounds: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_round_trip_through_toml() {
        let params = StakingParams::default();
        let toml_str = params.to_toml_string().expect("serializable");
        let parsed = StakingParams::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed, params);
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let params = StakingParams::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(params.max_top_nominations_per_candidate, 300);
        assert_eq!(params.max_bottom_nominations_per_candidate, 50);
        assert_eq!(params.round_length, 600);
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            max_top_nominations_per_candidate = 2
            max_bottom_nominations_per_candidate = 1
            leave_candidates_delay = 3
        "#;
        let params = StakingParams::from_toml_str(toml).expect("should parse");
        assert_eq!(params.max_top(), 2);
        assert_eq!(params.max_bottom(), 1);
        assert_eq!(params.leave_candidates_delay, 3);
        assert_eq!(params.revoke_nomination_delay, 28); // default
    }

    #[test]
    fn zero_top_capacity_is_rejected() {
        let err = StakingParams::from_toml_str("max_top_nominations_per_candidate = 0").unwrap_err();
        assert!(matches!(
            err,
            ParamsError::Invalid { field: "max_top_nominations_per_candidate", .. }
        ));
    }

    #[test]
    fn commission_above_100_percent_is_rejected() {
        let params = StakingParams {
            max_commission_bps: 10_001,
            ..StakingParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = StakingParams::from_toml_str("round_length = \"soon\"").unwrap_err();
        assert!(matches!(err, ParamsError::Parse(_)));
    }

    #[test]
    fn balances_beyond_64_bits_cannot_be_written() {
        let params = StakingParams {
            min_nomination: u128::from(u64::MAX) + 1,
            ..StakingParams::default()
        };
        assert!(params.to_toml_string().is_err());
    }

    #[test]
    fn min_stake_depends_on_tier() {
        let params = StakingParams::default();
        assert_eq!(params.min_candidate_stake(TierType::Full), 1_000 * UNIT);
        assert_eq!(params.min_candidate_stake(TierType::Basic), 500 * UNIT);
    }
}
