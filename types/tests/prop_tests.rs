use proptest::prelude::*;

use dstake_types::{Commission, StakingParams};

proptest! {
    /// Validation accepts exactly the commission settings that stay within 100%.
    #[test]
    fn commission_bounds_decide_validity(
        default_bps in 0u32..12_000,
        max_bps in 0u32..12_000,
    ) {
        let params = StakingParams {
            default_commission_bps: default_bps,
            max_commission_bps: max_bps,
            ..StakingParams::default()
        };
        let valid = max_bps <= Commission::MAX_BPS && default_bps <= max_bps;
        prop_assert_eq!(params.validate().is_ok(), valid);
    }

    /// A TOML document naming only capacities keeps every other default.
    #[test]
    fn partial_documents_keep_defaults(top in 1u32..1_000, bottom in 0u32..1_000) {
        let doc = format!(
            "max_top_nominations_per_candidate = {top}\nmax_bottom_nominations_per_candidate = {bottom}\n"
        );
        let params = StakingParams::from_toml_str(&doc).unwrap();
        prop_assert_eq!(params.max_top(), top as usize);
        prop_assert_eq!(params.max_bottom(), bottom as usize);
        let expected = StakingParams {
            max_top_nominations_per_candidate: top,
            max_bottom_nominations_per_candidate: bottom,
            ..StakingParams::default()
        };
        prop_assert_eq!(params, expected);
    }

    /// Commission display always shows two decimals of a percent.
    #[test]
    fn commission_display_is_two_decimal_percent(bps in 0u32..=10_000) {
        let rendered = Commission::from_bps(bps).to_string();
        prop_assert!(rendered.ends_with('%'));
        let number = rendered.trim_end_matches('%');
        let (whole, frac) = number.split_once('.').unwrap();
        prop_assert_eq!(frac.len(), 2);
        prop_assert_eq!(whole.parse::<u32>().unwrap() * 100 + frac.parse::<u32>().unwrap(), bps);
    }
}
