/// Capability derivation - immutable capability set of a validated device
///
/// `CapabilitySet::derive` is a pure function of the achieved feature tier
/// and the adapter identity; it holds no hidden state and must be re-derived
/// after every device re-creation.
use crate::binding::ShaderStage;
use crate::device::{DriverKind, DriverVersion, FeatureTier, MAX_TEXTURE_UNITS};

/// GPU vendor, classified from the PCI vendor id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vendor {
    Nvidia,
    Amd,
    Intel,
    /// Reference software rasterizer
    MsSoftware,
    /// WARP software rasterizer
    MsWarp,
    Unknown,
}

impl Vendor {
    /// Classify a PCI vendor id; unrecognized ids classify as `Unknown`
    pub fn from_pci_id(vendor_id: u32) -> Vendor {
        match vendor_id {
            0x10DE => Vendor::Nvidia,
            0x1002 => Vendor::Amd,
            0x163C | 0x8086 => Vendor::Intel,
            _ => Vendor::Unknown,
        }
    }
}

/// Per-stage shader constant slot counts
///
/// Tier-independent in this backend generation: constant buffers have no
/// practical limits, the counts below are the engine-facing contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageConstantCounts {
    /// Boolean params
    pub bool_count: u32,
    /// Integer params, 4-D
    pub int_count: u32,
    /// Float params, 4-D
    pub float_count: u32,
}

impl StageConstantCounts {
    const DEFAULT: StageConstantCounts = StageConstantCounts {
        bool_count: 16,
        int_count: 16,
        float_count: 512,
    };
}

/// Immutable capability set of a validated device
///
/// Consumed read-only by the resource and shader managers to gate feature
/// use.
#[derive(Debug, Clone)]
pub struct CapabilitySet {
    /// Adapter description string
    pub device_name: String,
    /// Classified vendor
    pub vendor: Vendor,
    /// Driver version quad
    pub driver_version: DriverVersion,
    /// Achieved feature tier
    pub tier: FeatureTier,

    /// Texture units bindable per stage
    pub max_texture_units: usize,
    /// Vertex-stage texture units (when vertex texture fetch is available)
    pub num_vertex_texture_units: usize,
    /// Simultaneously bindable render targets
    pub num_multi_render_targets: u32,

    /// Cube map textures
    pub cube_mapping: bool,
    /// Volume (3-D) textures
    pub texture_3d: bool,
    /// Non-power-of-two textures without restrictions
    pub non_power_of_two_textures: bool,
    /// Independent stencil state per face
    pub two_sided_stencil: bool,
    /// Depth buffer readable as a shader resource
    pub read_back_as_texture: bool,
    /// 32-bit index buffers
    pub index_32bit: bool,
    /// Texture sampling from the vertex stage
    pub vertex_texture_fetch: bool,

    /// Geometry-stage programs
    pub geometry_programs: bool,
    /// Compute-stage programs
    pub compute_programs: bool,
    /// Hull + domain (tessellation) programs
    pub tessellation_programs: bool,
    /// Shader subroutines via class linkage
    pub dynamic_shader_linkage: bool,
    /// Stream output into vertex buffers
    pub render_to_vertex_buffer: bool,
    /// Max vertices a geometry program may emit
    pub geometry_program_output_vertices: u32,

    /// Supported shader profile strings, accumulated by tier
    pub shader_profiles: Vec<String>,

    /// Constant counts per programmable stage
    pub vertex_constants: StageConstantCounts,
    pub fragment_constants: StageConstantCounts,
    pub geometry_constants: StageConstantCounts,
    pub hull_constants: StageConstantCounts,
    pub domain_constants: StageConstantCounts,
    pub compute_constants: StageConstantCounts,
}

impl CapabilitySet {
    /// Derive the capability set for a validated device
    ///
    /// Pure function of its inputs; no device calls are made.
    pub fn derive(
        tier: FeatureTier,
        vendor_id: u32,
        driver_kind: DriverKind,
        driver_version: DriverVersion,
        device_name: &str,
    ) -> CapabilitySet {
        let vendor = match driver_kind {
            DriverKind::Hardware => Vendor::from_pci_id(vendor_id),
            DriverKind::Software => Vendor::MsSoftware,
            DriverKind::Warp => Vendor::MsWarp,
        };

        let num_multi_render_targets = if tier > FeatureTier::L9_3 {
            8
        } else if tier == FeatureTier::L9_3 {
            4
        } else {
            1
        };

        CapabilitySet {
            device_name: device_name.to_string(),
            vendor,
            driver_version,
            tier,

            max_texture_units: MAX_TEXTURE_UNITS,
            num_vertex_texture_units: 4,
            num_multi_render_targets,

            cube_mapping: tier >= FeatureTier::L10_0,
            texture_3d: tier >= FeatureTier::L10_0,
            non_power_of_two_textures: tier >= FeatureTier::L10_0,
            two_sided_stencil: tier >= FeatureTier::L10_0,
            read_back_as_texture: tier >= FeatureTier::L10_0,
            index_32bit: tier >= FeatureTier::L9_2,
            vertex_texture_fetch: tier >= FeatureTier::L10_0,

            geometry_programs: tier >= FeatureTier::L10_0,
            compute_programs: tier >= FeatureTier::L10_0,
            tessellation_programs: tier >= FeatureTier::L11_0,
            dynamic_shader_linkage: tier >= FeatureTier::L11_0,
            render_to_vertex_buffer: tier >= FeatureTier::L10_0,
            geometry_program_output_vertices: 1024,

            shader_profiles: Self::shader_profiles_for(tier),
            vertex_constants: StageConstantCounts::DEFAULT,
            fragment_constants: StageConstantCounts::DEFAULT,
            geometry_constants: StageConstantCounts::DEFAULT,
            hull_constants: StageConstantCounts::DEFAULT,
            domain_constants: StageConstantCounts::DEFAULT,
            compute_constants: StageConstantCounts::DEFAULT,
        }
    }

    /// Whether texture/sampler bindings may be pushed for a stage at this
    /// tier
    ///
    /// Fragment-stage sampling is always available; every other stage needs
    /// the mid tier or above. Lower tiers silently skip the binding rather
    /// than failing.
    pub fn supports_stage_sampling(&self, stage: ShaderStage) -> bool {
        match stage {
            ShaderStage::Fragment => true,
            ShaderStage::Vertex
            | ShaderStage::Geometry
            | ShaderStage::Hull
            | ShaderStage::Domain
            | ShaderStage::Compute => self.tier >= FeatureTier::L10_0,
        }
    }

    /// Constant counts for a programmable stage
    pub fn stage_constants(&self, stage: ShaderStage) -> StageConstantCounts {
        match stage {
            ShaderStage::Vertex => self.vertex_constants,
            ShaderStage::Fragment => self.fragment_constants,
            ShaderStage::Geometry => self.geometry_constants,
            ShaderStage::Hull => self.hull_constants,
            ShaderStage::Domain => self.domain_constants,
            ShaderStage::Compute => self.compute_constants,
        }
    }

    fn shader_profiles_for(tier: FeatureTier) -> Vec<String> {
        let mut profiles = Vec::new();
        let mut add = |p: &str| profiles.push(p.to_string());

        // Vertex / fragment profiles exist at every tier
        add("vs_4_0_level_9_1");
        add("ps_4_0_level_9_1");
        if tier >= FeatureTier::L9_3 {
            add("vs_4_0_level_9_3");
            add("ps_4_0_level_9_3");
        }
        if tier >= FeatureTier::L10_0 {
            add("vs_4_0");
            add("ps_4_0");
            add("gs_4_0");
            add("cs_4_0");
        }
        if tier >= FeatureTier::L10_1 {
            add("vs_4_1");
            add("ps_4_1");
            add("gs_4_1");
            add("cs_4_1");
        }
        if tier >= FeatureTier::L11_0 {
            add("vs_5_0");
            add("ps_5_0");
            add("gs_5_0");
            add("hs_5_0");
            add("ds_5_0");
            add("cs_5_0");
        }
        profiles
    }

    /// True when a shader profile string is supported
    pub fn supports_profile(&self, profile: &str) -> bool {
        self.shader_profiles.iter().any(|p| p == profile)
    }
}

#[cfg(test)]
#[path = "capabilities_tests.rs"]
mod tests;
