//! Unit tests for FeatureTier

use crate::device::FeatureTier;

#[test]
fn test_tier_ordering() {
    assert!(FeatureTier::L9_1 < FeatureTier::L9_2);
    assert!(FeatureTier::L9_3 < FeatureTier::L10_0);
    assert!(FeatureTier::L10_1 < FeatureTier::L11_0);
    assert!(FeatureTier::L11_0 < FeatureTier::L11_1);
    assert_eq!(FeatureTier::MIN, FeatureTier::L9_1);
    assert_eq!(FeatureTier::MAX, FeatureTier::L11_1);
}

#[test]
fn test_descending_covers_all_tiers_in_order() {
    let d = FeatureTier::DESCENDING;
    assert_eq!(d.len(), 7);
    for pair in d.windows(2) {
        assert!(pair[0] > pair[1]);
    }
    assert_eq!(d[0], FeatureTier::MAX);
    assert_eq!(d[6], FeatureTier::MIN);
}

#[test]
fn test_parse_round_trip() {
    for tier in FeatureTier::DESCENDING {
        assert_eq!(FeatureTier::parse(tier.as_str(), FeatureTier::MIN), tier);
    }
}

#[test]
fn test_parse_unknown_falls_back() {
    assert_eq!(
        FeatureTier::parse("12.2", FeatureTier::L11_0),
        FeatureTier::L11_0
    );
    assert_eq!(FeatureTier::parse("", FeatureTier::L9_1), FeatureTier::L9_1);
}

#[test]
fn test_display() {
    assert_eq!(format!("{}", FeatureTier::L10_1), "10.1");
}
