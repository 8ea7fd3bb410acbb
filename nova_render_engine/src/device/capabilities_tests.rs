//! Unit tests for capability derivation

use crate::binding::ShaderStage;
use crate::device::{CapabilitySet, DriverKind, DriverVersion, FeatureTier, Vendor};

fn derive(tier: FeatureTier) -> CapabilitySet {
    CapabilitySet::derive(
        tier,
        0x10DE,
        DriverKind::Hardware,
        DriverVersion::default(),
        "Test Adapter",
    )
}

#[test]
fn test_low_tier_never_reports_mid_tier_features() {
    for tier in [FeatureTier::L9_1, FeatureTier::L9_2, FeatureTier::L9_3] {
        let caps = derive(tier);
        assert!(!caps.cube_mapping, "{:?}", tier);
        assert!(!caps.texture_3d, "{:?}", tier);
        assert!(!caps.tessellation_programs, "{:?}", tier);
        assert!(!caps.geometry_programs, "{:?}", tier);
        assert!(!caps.compute_programs, "{:?}", tier);
        assert!(!caps.dynamic_shader_linkage, "{:?}", tier);
    }
}

#[test]
fn test_top_tier_reports_everything() {
    for tier in [FeatureTier::L11_0, FeatureTier::L11_1] {
        let caps = derive(tier);
        assert!(caps.cube_mapping);
        assert!(caps.texture_3d);
        assert!(caps.tessellation_programs);
        assert!(caps.geometry_programs);
        assert!(caps.compute_programs);
        assert!(caps.dynamic_shader_linkage);
    }
}

#[test]
fn test_mid_tier_gates() {
    let caps = derive(FeatureTier::L10_0);
    assert!(caps.cube_mapping);
    assert!(caps.texture_3d);
    assert!(caps.geometry_programs);
    assert!(caps.compute_programs);
    // Tessellation and dynamic linkage only arrive at the top tier
    assert!(!caps.tessellation_programs);
    assert!(!caps.dynamic_shader_linkage);
}

#[test]
fn test_multi_render_target_counts() {
    assert_eq!(derive(FeatureTier::L9_1).num_multi_render_targets, 1);
    assert_eq!(derive(FeatureTier::L9_2).num_multi_render_targets, 1);
    assert_eq!(derive(FeatureTier::L9_3).num_multi_render_targets, 4);
    assert_eq!(derive(FeatureTier::L10_0).num_multi_render_targets, 8);
    assert_eq!(derive(FeatureTier::L11_1).num_multi_render_targets, 8);
}

#[test]
fn test_index_32bit_from_9_2() {
    assert!(!derive(FeatureTier::L9_1).index_32bit);
    assert!(derive(FeatureTier::L9_2).index_32bit);
}

#[test]
fn test_vendor_classification() {
    assert_eq!(Vendor::from_pci_id(0x10DE), Vendor::Nvidia);
    assert_eq!(Vendor::from_pci_id(0x1002), Vendor::Amd);
    assert_eq!(Vendor::from_pci_id(0x8086), Vendor::Intel);
    assert_eq!(Vendor::from_pci_id(0x163C), Vendor::Intel);
    assert_eq!(Vendor::from_pci_id(0xBEEF), Vendor::Unknown);
}

#[test]
fn test_software_driver_kinds_override_vendor() {
    let soft = CapabilitySet::derive(
        FeatureTier::L11_0,
        0x10DE,
        DriverKind::Software,
        DriverVersion::default(),
        "ref",
    );
    assert_eq!(soft.vendor, Vendor::MsSoftware);

    let warp = CapabilitySet::derive(
        FeatureTier::L11_0,
        0x10DE,
        DriverKind::Warp,
        DriverVersion::default(),
        "warp",
    );
    assert_eq!(warp.vendor, Vendor::MsWarp);
}

#[test]
fn test_stage_sampling_gates() {
    let low = derive(FeatureTier::L9_3);
    assert!(low.supports_stage_sampling(ShaderStage::Fragment));
    assert!(!low.supports_stage_sampling(ShaderStage::Vertex));
    assert!(!low.supports_stage_sampling(ShaderStage::Compute));

    let high = derive(FeatureTier::L10_0);
    assert!(high.supports_stage_sampling(ShaderStage::Vertex));
    assert!(high.supports_stage_sampling(ShaderStage::Hull));
    assert!(high.supports_stage_sampling(ShaderStage::Domain));
}

#[test]
fn test_shader_profiles_accumulate() {
    let low = derive(FeatureTier::L9_1);
    assert!(low.supports_profile("vs_4_0_level_9_1"));
    assert!(!low.supports_profile("vs_4_0"));
    assert!(!low.supports_profile("hs_5_0"));

    let mid = derive(FeatureTier::L10_1);
    assert!(mid.supports_profile("vs_4_0"));
    assert!(mid.supports_profile("gs_4_1"));
    assert!(!mid.supports_profile("vs_5_0"));

    let top = derive(FeatureTier::L11_0);
    assert!(top.supports_profile("vs_5_0"));
    assert!(top.supports_profile("hs_5_0"));
    assert!(top.supports_profile("ds_5_0"));
    assert!(top.supports_profile("cs_5_0"));
}

#[test]
fn test_constant_counts_are_tier_independent() {
    for tier in [FeatureTier::L9_1, FeatureTier::L11_1] {
        let caps = derive(tier);
        for stage in ShaderStage::ALL {
            let counts = caps.stage_constants(stage);
            assert_eq!(counts.bool_count, 16);
            assert_eq!(counts.int_count, 16);
            assert_eq!(counts.float_count, 512);
        }
    }
}
