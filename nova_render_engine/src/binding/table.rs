/// Stage binding table - per-stage programs and texture-unit assignments
use crate::binding::ShaderStage;
use crate::device::{ProgramHandle, TextureViewHandle, MAX_TEXTURE_UNITS};
use crate::pipeline::SamplerStateDesc;

/// A program bound to a stage
///
/// A weak, copyable reference: ownership stays with the program manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramBinding {
    /// Handle into the program manager's arena
    pub handle: ProgramHandle,
    /// Geometry-stage programs only: the program declares it consumes
    /// adjacency primitives
    pub requires_adjacency: bool,
}

impl ProgramBinding {
    pub fn new(handle: ProgramHandle) -> Self {
        Self {
            handle,
            requires_adjacency: false,
        }
    }

    pub fn with_adjacency(handle: ProgramHandle) -> Self {
        Self {
            handle,
            requires_adjacency: true,
        }
    }
}

/// One texture unit of one stage
///
/// The sampler descriptor persists across texture rebinds; `used` tracks
/// whether a texture is currently assigned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureUnitSlot {
    /// A texture is assigned to this unit
    pub used: bool,
    /// Shader-resource view of the assigned texture
    pub view: Option<TextureViewHandle>,
    /// Sampler settings of this unit
    pub sampler: SamplerStateDesc,
}

impl Default for TextureUnitSlot {
    fn default() -> Self {
        Self {
            used: false,
            view: None,
            sampler: SamplerStateDesc::default(),
        }
    }
}

/// Bindings of one stage
#[derive(Debug, Clone)]
pub struct StageBindings {
    program: Option<ProgramBinding>,
    units: [TextureUnitSlot; MAX_TEXTURE_UNITS],
    /// One past the highest unit with a texture assigned
    last_used_unit: usize,
}

impl Default for StageBindings {
    fn default() -> Self {
        Self {
            program: None,
            units: [TextureUnitSlot::default(); MAX_TEXTURE_UNITS],
            last_used_unit: 0,
        }
    }
}

impl StageBindings {
    /// Currently bound program
    pub fn program(&self) -> Option<ProgramBinding> {
        self.program
    }

    pub(crate) fn set_program(&mut self, program: Option<ProgramBinding>) {
        self.program = program;
    }

    /// Assign or clear the texture of a unit
    pub(crate) fn set_texture(&mut self, unit: usize, view: Option<TextureViewHandle>) {
        let slot = &mut self.units[unit];
        match view {
            Some(view) => {
                slot.used = true;
                slot.view = Some(view);
                self.last_used_unit = self.last_used_unit.max(unit + 1);
            }
            None => {
                slot.used = false;
                slot.view = None;
                // we now know what the last used texture unit is
                self.last_used_unit = self.last_used_unit.min(unit);
            }
        }
    }

    /// Access a unit slot
    pub fn unit(&self, unit: usize) -> &TextureUnitSlot {
        &self.units[unit]
    }

    pub(crate) fn unit_mut(&mut self, unit: usize) -> &mut TextureUnitSlot {
        &mut self.units[unit]
    }

    /// Number of texture units the device must see for this stage
    pub fn used_units(&self) -> usize {
        self.last_used_unit.min(MAX_TEXTURE_UNITS)
    }
}

/// Per-stage binding table
///
/// Fixed-size table indexed by stage; one entry per stage instead of a
/// chain of type switches.
#[derive(Debug, Clone, Default)]
pub struct StageBindingTable {
    stages: [StageBindings; ShaderStage::COUNT],
}

impl StageBindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bindings of one stage
    pub fn stage(&self, stage: ShaderStage) -> &StageBindings {
        &self.stages[stage.index()]
    }

    pub(crate) fn stage_mut(&mut self, stage: ShaderStage) -> &mut StageBindings {
        &mut self.stages[stage.index()]
    }

    /// Program bound to a stage, if any
    pub fn program(&self, stage: ShaderStage) -> Option<ProgramBinding> {
        self.stages[stage.index()].program()
    }

    /// True when any graphics-pipeline stage has a program bound
    pub fn any_graphics_program_bound(&self) -> bool {
        ShaderStage::GRAPHICS
            .iter()
            .any(|stage| self.program(*stage).is_some())
    }

    /// True when a compute program is bound
    pub fn compute_program_bound(&self) -> bool {
        self.program(ShaderStage::Compute).is_some()
    }

    /// Names of the stages with programs bound, for diagnostics
    pub fn bound_stage_names(&self) -> String {
        let names: Vec<&str> = ShaderStage::ALL
            .iter()
            .filter(|stage| self.program(**stage).is_some())
            .map(|stage| stage.name())
            .collect();
        if names.is_empty() {
            "none".to_string()
        } else {
            names.join(", ")
        }
    }

    /// Clear every program and texture binding
    pub fn clear(&mut self) {
        self.stages = Default::default();
    }
}

#[cfg(test)]
#[path = "table_tests.rs"]
mod tests;
