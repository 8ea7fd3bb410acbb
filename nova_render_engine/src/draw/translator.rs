/// Draw translator - converts a render operation into native draw calls
///
/// Chooses between the compute dispatch path and the topology-based draw
/// path, validates the stage-binding preconditions, selects the draw
/// variant, and loops the draw once per pass iteration reported by the
/// injected predicate.
use crate::binding::{ShaderStage, StageBindingTable};
use crate::device::NativeDevice;
use crate::draw::{
    primitive_count, resolve_primitive_kind, PrimitiveKind, RenderOperation, AUTO_VERTEX_COUNT,
};
use crate::error::{Error, Result};

/// Which native draw entry point a submission used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawVariant {
    /// Driver-derived count from the stream-output buffer
    Auto,
    IndexedInstanced,
    Indexed,
    Instanced,
    Plain,
}

/// Outcome of one draw submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawOutcome {
    /// A compute program was bound: exactly one dispatch was issued, no
    /// topology-based draw
    Dispatched,
    /// The primitive count resolved to zero; nothing was issued
    Skipped,
    /// A topology-based draw was issued
    Drawn {
        /// Native topology the operation mapped to
        primitive: PrimitiveKind,
        /// Assembled primitive count (0 for the auto variant, where only
        /// the driver knows)
        primitive_count: u32,
        /// Native draw entry point used
        variant: DrawVariant,
        /// Times the draw was issued (pass iterations)
        passes: u32,
    },
}

/// Stateless translator from render operations to native draws
pub struct DrawTranslator;

impl DrawTranslator {
    /// Submit one render operation
    ///
    /// `global_instancing` is the instance multiplier of the global
    /// instancing buffer when one is available. `pass_hook` is the injected
    /// pass-iteration predicate: the draw repeats while it returns true.
    ///
    /// # Errors
    ///
    /// - `Error::Precondition` for zero vertices, missing vertex/fragment
    ///   programs, a mismatched hull/domain pair, or triangle-fan topology.
    /// - `Error::RenderingApi` when a native call fails; the description
    ///   names the draw variant and the bound stages.
    pub fn submit(
        device: &mut dyn NativeDevice,
        bindings: &StageBindingTable,
        op: &RenderOperation,
        global_instancing: Option<u32>,
        pass_hook: &mut dyn FnMut() -> bool,
    ) -> Result<DrawOutcome> {
        // Exit immediately if there is nothing to render
        if op.vertex_data.vertex_count == 0 {
            return Err(Error::Precondition(
                "render operation has no vertices".to_string(),
            ));
        }

        // A bound compute program takes the dispatch path exclusively; all
        // graphics binding and topology translation is skipped
        if let Some(compute) = bindings.program(ShaderStage::Compute) {
            device
                .bind_program(ShaderStage::Compute, Some(compute.handle))
                .map_err(|e| e.into_error("set compute program"))?;
            device
                .dispatch(1, 1, 1)
                .map_err(|e| e.into_error("dispatch compute program"))?;
            // Unbind the feeding resources so the next graphics draw does
            // not read stale views
            device
                .unbind_compute_resources()
                .map_err(|e| e.into_error("unbind compute resources"))?;
            device
                .bind_program(ShaderStage::Compute, None)
                .map_err(|e| e.into_error("unbind compute program"))?;
            return Ok(DrawOutcome::Dispatched);
        }

        let stream_out = device.stream_output_bound();

        // Check consistency of vertex/fragment programs: there is no fixed
        // pipeline in this device generation
        let vertex_bound = bindings.program(ShaderStage::Vertex).is_some();
        let fragment_bound = bindings.program(ShaderStage::Fragment).is_some();
        if !vertex_bound {
            return Err(Error::Precondition(format!(
                "draw requires a vertex program (bound stages: {})",
                bindings.bound_stage_names()
            )));
        }
        if !fragment_bound
            && op.operation_type != crate::draw::OperationType::PointList
            && !stream_out
        {
            return Err(Error::Precondition(format!(
                "draw requires a fragment program (bound stages: {})",
                bindings.bound_stage_names()
            )));
        }

        // Check consistency of tessellation programs
        let hull_bound = bindings.program(ShaderStage::Hull).is_some();
        let domain_bound = bindings.program(ShaderStage::Domain).is_some();
        if hull_bound && !domain_bound {
            return Err(Error::Precondition(
                "attempted to use tessellation, but the domain program is missing".to_string(),
            ));
        }
        if domain_bound && !hull_bound {
            return Err(Error::Precondition(
                "attempted to use tessellation, but the hull program is missing".to_string(),
            ));
        }

        // Program bind is deferred to submission
        for stage in ShaderStage::GRAPHICS {
            if let Some(program) = bindings.program(stage) {
                device
                    .bind_program(stage, Some(program.handle))
                    .map_err(|e| e.into_error(&format!("set {} program", stage)))?;
            }
        }

        let tessellated = hull_bound && domain_bound;
        let use_adjacency = bindings
            .program(ShaderStage::Geometry)
            .map(|p| p.requires_adjacency)
            .unwrap_or(false);

        let primitive = resolve_primitive_kind(op.operation_type, tessellated, use_adjacency)?;

        let indexed = op.index_data.is_some();
        let auto = !indexed && op.vertex_data.vertex_count == AUTO_VERTEX_COUNT;

        let prim_count = if auto {
            // Only the driver knows; skip the zero-primitive gate
            None
        } else {
            Some(primitive_count(
                op.operation_type,
                op.element_count(),
                tessellated,
            ))
        };
        if prim_count == Some(0) {
            return Ok(DrawOutcome::Skipped);
        }

        if let Some(index_data) = &op.index_data {
            device
                .bind_index_buffer(index_data.buffer, index_data.index_type, 0)
                .map_err(|e| e.into_error("set index buffer"))?;
        }

        device
            .set_primitive_topology(primitive)
            .map_err(|e| e.into_error("set primitive topology"))?;

        let instanced = (op.use_global_instancing && global_instancing.is_some())
            || op.vertex_data.has_instance_data;
        let mut instances = op.instance_count;
        if op.use_global_instancing {
            instances *= global_instancing.unwrap_or(1);
        }

        let variant = if auto {
            DrawVariant::Auto
        } else if indexed && instanced {
            DrawVariant::IndexedInstanced
        } else if indexed {
            DrawVariant::Indexed
        } else if instanced {
            DrawVariant::Instanced
        } else {
            DrawVariant::Plain
        };

        // Issue the op, once per pass iteration
        let mut passes = 0u32;
        loop {
            let issued = if auto {
                device.draw_auto()
            } else if let Some(index_data) = &op.index_data {
                if instanced {
                    device.draw_indexed_instanced(
                        index_data.index_count,
                        instances,
                        index_data.index_start,
                        op.vertex_data.vertex_start as i32,
                    )
                } else {
                    device.draw_indexed(
                        index_data.index_count,
                        index_data.index_start,
                        op.vertex_data.vertex_start as i32,
                    )
                }
            } else if instanced {
                device.draw_instanced(
                    op.vertex_data.vertex_count,
                    instances,
                    op.vertex_data.vertex_start,
                )
            } else {
                device.draw(op.vertex_data.vertex_count, op.vertex_data.vertex_start)
            };

            issued.map_err(|e| {
                e.into_error(&format!(
                    "draw {:?} (bound stages: {})",
                    variant,
                    bindings.bound_stage_names()
                ))
            })?;
            passes += 1;

            if !pass_hook() {
                break;
            }
        }

        Ok(DrawOutcome::Drawn {
            primitive,
            primitive_count: prim_count.unwrap_or(0),
            variant,
            passes,
        })
    }
}

#[cfg(test)]
#[path = "translator_tests.rs"]
mod tests;
