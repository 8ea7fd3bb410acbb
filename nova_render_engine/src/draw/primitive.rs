/// Native primitive topologies and primitive-count arithmetic
use crate::draw::OperationType;
use crate::error::{Error, Result};

/// Native primitive topology
///
/// Covers the plain topologies, the adjacency variants consumed by geometry
/// programs, and the control-point patch lists used for tessellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    PointList,
    LineList,
    LineStrip,
    TriangleList,
    TriangleStrip,
    LineListAdjacency,
    LineStripAdjacency,
    TriangleListAdjacency,
    TriangleStripAdjacency,
    /// 2-control-point patches (line-derived tessellation)
    PatchList2ControlPoint,
    /// 3-control-point patches (triangle-derived tessellation)
    PatchList3ControlPoint,
}

impl PrimitiveKind {
    /// Control points per patch for patch-list topologies
    pub fn control_points(&self) -> Option<u32> {
        match self {
            PrimitiveKind::PatchList2ControlPoint => Some(2),
            PrimitiveKind::PatchList3ControlPoint => Some(3),
            _ => None,
        }
    }
}

/// Map an engine topology onto the native primitive topology
///
/// With tessellation active, list/strip topologies reinterpret as patch
/// lists with a fixed control-point count derived from the topology kind.
/// Without tessellation, `use_adjacency` selects the adjacency variant of
/// line/triangle topologies.
///
/// # Errors
///
/// `Error::Precondition` for the triangle-fan topology, which this backend
/// generation cannot express; it never silently degrades to another
/// topology.
pub fn resolve_primitive_kind(
    operation_type: OperationType,
    tessellated: bool,
    use_adjacency: bool,
) -> Result<PrimitiveKind> {
    if operation_type == OperationType::TriangleFan {
        return Err(Error::Precondition(
            "triangle fan topology is not supported by this device generation".to_string(),
        ));
    }

    if tessellated {
        // useful primitives for tessellation
        let kind = match operation_type {
            OperationType::LineList | OperationType::LineStrip => {
                PrimitiveKind::PatchList2ControlPoint
            }
            OperationType::TriangleList | OperationType::TriangleStrip => {
                PrimitiveKind::PatchList3ControlPoint
            }
            // Point lists have no patch interpretation; the primitive count
            // resolves to zero and the draw is skipped
            OperationType::PointList => PrimitiveKind::PointList,
            OperationType::TriangleFan => unreachable!(),
        };
        return Ok(kind);
    }

    let kind = match operation_type {
        OperationType::PointList => PrimitiveKind::PointList,
        OperationType::LineList => {
            if use_adjacency {
                PrimitiveKind::LineListAdjacency
            } else {
                PrimitiveKind::LineList
            }
        }
        OperationType::LineStrip => {
            if use_adjacency {
                PrimitiveKind::LineStripAdjacency
            } else {
                PrimitiveKind::LineStrip
            }
        }
        OperationType::TriangleList => {
            if use_adjacency {
                PrimitiveKind::TriangleListAdjacency
            } else {
                PrimitiveKind::TriangleList
            }
        }
        OperationType::TriangleStrip => {
            if use_adjacency {
                PrimitiveKind::TriangleStripAdjacency
            } else {
                PrimitiveKind::TriangleStrip
            }
        }
        OperationType::TriangleFan => unreachable!(),
    };
    Ok(kind)
}

/// Number of primitives assembled from `element_count` elements
///
/// `element_count` is the index count for indexed draws, the vertex count
/// otherwise. Strip counts saturate at zero for degenerate element counts.
pub fn primitive_count(
    operation_type: OperationType,
    element_count: u32,
    tessellated: bool,
) -> u32 {
    if tessellated && operation_type == OperationType::PointList {
        return 0;
    }
    match operation_type {
        OperationType::PointList => element_count,
        OperationType::LineList => element_count / 2,
        OperationType::LineStrip => element_count.saturating_sub(1),
        OperationType::TriangleList => element_count / 3,
        OperationType::TriangleStrip | OperationType::TriangleFan => {
            element_count.saturating_sub(2)
        }
    }
}

#[cfg(test)]
#[path = "primitive_tests.rs"]
mod tests;
