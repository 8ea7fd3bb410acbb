//! Unit tests for render operation types

use crate::device::mock_device::make_index_buffer_handle;
use crate::draw::{
    IndexData, IndexType, OperationType, RenderOperation, AUTO_VERTEX_COUNT,
};

#[test]
fn test_index_type_size_bytes() {
    assert_eq!(IndexType::U16.size_bytes(), 2);
    assert_eq!(IndexType::U32.size_bytes(), 4);
}

#[test]
fn test_non_indexed_constructor() {
    let op = RenderOperation::non_indexed(OperationType::TriangleList, 12);
    assert_eq!(op.operation_type, OperationType::TriangleList);
    assert_eq!(op.vertex_data.vertex_count, 12);
    assert_eq!(op.vertex_data.vertex_start, 0);
    assert!(op.index_data.is_none());
    assert_eq!(op.instance_count, 1);
    assert!(!op.use_global_instancing);
}

#[test]
fn test_element_count_prefers_indices() {
    let mut op = RenderOperation::non_indexed(OperationType::TriangleList, 12);
    assert_eq!(op.element_count(), 12);

    op.index_data = Some(IndexData {
        buffer: make_index_buffer_handle(),
        index_type: IndexType::U16,
        index_start: 0,
        index_count: 36,
    });
    assert_eq!(op.element_count(), 36);
}

#[test]
fn test_auto_sentinel_is_distinct_from_real_counts() {
    assert_ne!(AUTO_VERTEX_COUNT, 0);
    let op = RenderOperation::non_indexed(OperationType::PointList, AUTO_VERTEX_COUNT);
    assert_eq!(op.vertex_data.vertex_count, AUTO_VERTEX_COUNT);
}
