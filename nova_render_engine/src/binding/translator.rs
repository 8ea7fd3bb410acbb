/// Binding translator - maps engine texture/program assignments onto native
/// binding slots
///
/// Enforces the stage-exclusivity invariant at bind time: a compute program
/// and any graphics-stage program can never be bound together. Tier gating
/// happens at push time: stages whose capability tier does not support
/// sampling silently skip the native call instead of failing.
use crate::binding::{ProgramBinding, ShaderStage, StageBindingTable};
use crate::device::{CapabilitySet, NativeDevice, TextureViewHandle, MAX_TEXTURE_UNITS};
use crate::error::{Error, Result};
use crate::pipeline::{PipelineStateCache, SamplerStateDesc};

/// Translates engine-level stage bindings into native binding-slot pushes
#[derive(Debug, Default)]
pub struct BindingTranslator {
    table: StageBindingTable,
}

impl BindingTranslator {
    pub fn new() -> Self {
        Self {
            table: StageBindingTable::new(),
        }
    }

    /// The underlying binding table
    pub fn table(&self) -> &StageBindingTable {
        &self.table
    }

    /// Bind a program to a stage, or unbind with `None`
    ///
    /// # Errors
    ///
    /// `Error::Precondition` when binding a compute program while a
    /// graphics-stage program is bound, or vice versa.
    pub fn bind_stage(
        &mut self,
        stage: ShaderStage,
        program: Option<ProgramBinding>,
    ) -> Result<()> {
        if program.is_some() {
            if stage == ShaderStage::Compute && self.table.any_graphics_program_bound() {
                return Err(Error::Precondition(format!(
                    "cannot bind a compute program while graphics-stage programs are bound ({})",
                    self.table.bound_stage_names()
                )));
            }
            if stage.is_graphics() && self.table.compute_program_bound() {
                return Err(Error::Precondition(format!(
                    "cannot bind a {} program while a compute program is bound",
                    stage
                )));
            }
        }
        self.table.stage_mut(stage).set_program(program);
        Ok(())
    }

    /// Assign a texture view to a unit of a stage, or clear it with `None`
    ///
    /// The unit's sampler descriptor is left untouched; it persists across
    /// texture rebinds.
    pub fn bind_texture(
        &mut self,
        stage: ShaderStage,
        unit: usize,
        view: Option<TextureViewHandle>,
    ) -> Result<()> {
        if unit >= MAX_TEXTURE_UNITS {
            return Err(Error::InvalidParams(format!(
                "texture unit {} out of range (max {})",
                unit, MAX_TEXTURE_UNITS
            )));
        }
        self.table.stage_mut(stage).set_texture(unit, view);
        Ok(())
    }

    /// Assign a texture view together with its sampler settings
    pub fn bind_texture_with_sampler(
        &mut self,
        stage: ShaderStage,
        unit: usize,
        view: TextureViewHandle,
        sampler: SamplerStateDesc,
    ) -> Result<()> {
        self.bind_texture(stage, unit, Some(view))?;
        self.table.stage_mut(stage).unit_mut(unit).sampler = sampler;
        Ok(())
    }

    /// Mutable access to the sampler descriptor of a unit
    pub fn sampler_mut(
        &mut self,
        stage: ShaderStage,
        unit: usize,
    ) -> Result<&mut SamplerStateDesc> {
        if unit >= MAX_TEXTURE_UNITS {
            return Err(Error::InvalidParams(format!(
                "texture unit {} out of range (max {})",
                unit, MAX_TEXTURE_UNITS
            )));
        }
        Ok(&mut self.table.stage_mut(stage).unit_mut(unit).sampler)
    }

    /// Clear every binding (used at shutdown and on device loss)
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Push the resolved sampler/texture bindings of every stage to the
    /// device
    ///
    /// Per-stage rules:
    /// - fragment-stage resources always push;
    /// - vertex-stage resources push when the tier supports vertex texture
    ///   fetch, lower tiers skip silently;
    /// - geometry/hull/domain/compute resources push only when that stage
    ///   has a program bound, and skip silently below the mid tier.
    pub fn push_stage_resources(
        &self,
        device: &mut dyn NativeDevice,
        caps: &CapabilitySet,
        cache: &PipelineStateCache,
    ) -> Result<()> {
        for stage in ShaderStage::ALL {
            let bindings = self.table.stage(stage);
            let count = bindings.used_units();
            // if the unit count is 0, the push would do nothing
            if count == 0 {
                continue;
            }

            let needs_program = !matches!(stage, ShaderStage::Vertex | ShaderStage::Fragment);
            if needs_program && bindings.program().is_none() {
                continue;
            }

            if !caps.supports_stage_sampling(stage) {
                // below the required tier the binding is skipped, not failed
                continue;
            }

            let textures: Vec<Option<TextureViewHandle>> = (0..count)
                .map(|n| {
                    let slot = bindings.unit(n);
                    if slot.used {
                        slot.view
                    } else {
                        None
                    }
                })
                .collect();
            let samplers = cache.stage_samplers(stage);

            device
                .bind_stage_resources(stage, samplers, &textures)
                .map_err(|e| e.into_error(&format!("set {} shader resources", stage)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "translator_tests.rs"]
mod tests;
