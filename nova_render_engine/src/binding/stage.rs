/// Shader stages - the programmable points of the graphics/compute pipeline

/// One programmable pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Geometry,
    /// Tessellation control
    Hull,
    /// Tessellation evaluation
    Domain,
    Compute,
}

impl ShaderStage {
    /// Number of stages
    pub const COUNT: usize = 6;

    /// Every stage, in table order
    pub const ALL: [ShaderStage; ShaderStage::COUNT] = [
        ShaderStage::Vertex,
        ShaderStage::Fragment,
        ShaderStage::Geometry,
        ShaderStage::Hull,
        ShaderStage::Domain,
        ShaderStage::Compute,
    ];

    /// The graphics-pipeline stages (everything but compute)
    pub const GRAPHICS: [ShaderStage; 5] = [
        ShaderStage::Vertex,
        ShaderStage::Fragment,
        ShaderStage::Geometry,
        ShaderStage::Hull,
        ShaderStage::Domain,
    ];

    /// Fixed table index of this stage
    pub fn index(self) -> usize {
        match self {
            ShaderStage::Vertex => 0,
            ShaderStage::Fragment => 1,
            ShaderStage::Geometry => 2,
            ShaderStage::Hull => 3,
            ShaderStage::Domain => 4,
            ShaderStage::Compute => 5,
        }
    }

    /// True for every stage of the graphics pipeline
    pub fn is_graphics(self) -> bool {
        self != ShaderStage::Compute
    }

    /// Lower-case stage name for diagnostics
    pub fn name(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
            ShaderStage::Geometry => "geometry",
            ShaderStage::Hull => "hull",
            ShaderStage::Domain => "domain",
            ShaderStage::Compute => "compute",
        }
    }
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
