/// Render operations - engine-neutral description of one draw
use crate::device::IndexBufferHandle;

/// Sentinel vertex count meaning "let the driver derive the count from the
/// bound stream-output buffer"
pub const AUTO_VERTEX_COUNT: u32 = u32::MAX;

/// Engine-level primitive topology tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    /// Isolated points
    PointList,
    /// Vertex pairs forming isolated lines
    LineList,
    /// Connected line sequence
    LineStrip,
    /// Vertex triples forming isolated triangles
    TriangleList,
    /// Connected triangle sequence
    TriangleStrip,
    /// Triangles sharing the first vertex (not supported by this backend
    /// generation; translation always fails)
    TriangleFan,
}

/// Index buffer element type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    /// 16-bit indices (max 65535 vertices)
    U16,
    /// 32-bit indices (requires the 32-bit index capability)
    U32,
}

impl IndexType {
    /// Size in bytes of one index element
    pub fn size_bytes(&self) -> u32 {
        match self {
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }
}

/// Vertex source description
///
/// The vertex buffers themselves are bound by the buffer manager before
/// submission; the draw translator only needs the ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexData {
    /// First vertex to read
    pub vertex_start: u32,
    /// Number of vertices, or [`AUTO_VERTEX_COUNT`]
    pub vertex_count: u32,
    /// A bound vertex stream carries per-instance data
    pub has_instance_data: bool,
}

/// Index source description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexData {
    /// Index buffer owned by the buffer manager
    pub buffer: IndexBufferHandle,
    /// Element type
    pub index_type: IndexType,
    /// First index to read
    pub index_start: u32,
    /// Number of indices
    pub index_count: u32,
}

/// Engine-neutral render operation
///
/// Read-only input to the draw translator; the operation is owned by the
/// renderable that submits it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOperation {
    /// Primitive topology tag
    pub operation_type: OperationType,
    /// Vertex source
    pub vertex_data: VertexData,
    /// Optional index source
    pub index_data: Option<IndexData>,
    /// Instances to draw (1 for non-instanced)
    pub instance_count: u32,
    /// Multiply in the global instancing buffer when one is available
    pub use_global_instancing: bool,
}

impl RenderOperation {
    /// A plain non-indexed, non-instanced operation
    pub fn non_indexed(operation_type: OperationType, vertex_count: u32) -> Self {
        Self {
            operation_type,
            vertex_data: VertexData {
                vertex_start: 0,
                vertex_count,
                has_instance_data: false,
            },
            index_data: None,
            instance_count: 1,
            use_global_instancing: false,
        }
    }

    /// Number of elements the primitive assembler consumes (indices when
    /// indexed, vertices otherwise)
    pub fn element_count(&self) -> u32 {
        match &self.index_data {
            Some(index_data) => index_data.index_count,
            None => self.vertex_data.vertex_count,
        }
    }
}

#[cfg(test)]
#[path = "operation_tests.rs"]
mod tests;
