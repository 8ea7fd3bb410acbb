//! Unit tests for the draw translator
//!
//! Exercises the compute/graphics path split, the stage precondition
//! checks, the draw variant priority and the pass-iteration loop against
//! the recording mock device.

use crate::binding::{ProgramBinding, ShaderStage, StageBindingTable};
use crate::device::mock_device::{
    make_index_buffer_handle, make_program_handle, MockDevice, MockDeviceState,
};
use crate::draw::{
    DrawOutcome, DrawTranslator, DrawVariant, IndexData, IndexType, OperationType, PrimitiveKind,
    RenderOperation, AUTO_VERTEX_COUNT,
};
use crate::error::Error;
use std::sync::{Arc, Mutex};

fn mock_device() -> (MockDevice, Arc<Mutex<MockDeviceState>>) {
    let state = Arc::new(Mutex::new(MockDeviceState::default()));
    (MockDevice::new(state.clone()), state)
}

fn graphics_table() -> StageBindingTable {
    let mut table = StageBindingTable::new();
    table
        .stage_mut(ShaderStage::Vertex)
        .set_program(Some(ProgramBinding::new(make_program_handle())));
    table
        .stage_mut(ShaderStage::Fragment)
        .set_program(Some(ProgramBinding::new(make_program_handle())));
    table
}

fn submit(
    device: &mut MockDevice,
    table: &StageBindingTable,
    op: &RenderOperation,
) -> crate::error::Result<DrawOutcome> {
    let mut no_passes = || false;
    DrawTranslator::submit(device, table, op, None, &mut no_passes)
}

#[test]
fn test_zero_vertices_fails_fast() {
    let (mut device, state) = mock_device();
    let table = graphics_table();
    let op = RenderOperation::non_indexed(OperationType::TriangleList, 0);

    let err = submit(&mut device, &table, &op).unwrap_err();
    assert!(matches!(err, Error::Precondition(_)));
    assert_eq!(state.lock().unwrap().draws, 0);
}

#[test]
fn test_plain_draw() {
    let (mut device, state) = mock_device();
    let table = graphics_table();
    let op = RenderOperation::non_indexed(OperationType::TriangleStrip, 12);

    let outcome = submit(&mut device, &table, &op).unwrap();
    assert_eq!(
        outcome,
        DrawOutcome::Drawn {
            primitive: PrimitiveKind::TriangleStrip,
            primitive_count: 10,
            variant: DrawVariant::Plain,
            passes: 1,
        }
    );
    let state = state.lock().unwrap();
    assert_eq!(state.draws, 1);
    assert!(state.calls.contains(&"draw(12, 0)".to_string()));
    assert!(state
        .calls
        .contains(&"set_primitive_topology(TriangleStrip)".to_string()));
}

#[test]
fn test_missing_vertex_program() {
    let (mut device, _) = mock_device();
    let mut table = StageBindingTable::new();
    table
        .stage_mut(ShaderStage::Fragment)
        .set_program(Some(ProgramBinding::new(make_program_handle())));
    let op = RenderOperation::non_indexed(OperationType::TriangleList, 3);

    let err = submit(&mut device, &table, &op).unwrap_err();
    assert!(format!("{}", err).contains("vertex program"));
    assert!(format!("{}", err).contains("fragment"));
}

#[test]
fn test_missing_fragment_program() {
    let (mut device, _) = mock_device();
    let mut table = StageBindingTable::new();
    table
        .stage_mut(ShaderStage::Vertex)
        .set_program(Some(ProgramBinding::new(make_program_handle())));
    let op = RenderOperation::non_indexed(OperationType::TriangleList, 3);

    let err = submit(&mut device, &table, &op).unwrap_err();
    assert!(format!("{}", err).contains("fragment program"));
}

#[test]
fn test_point_list_allows_missing_fragment_program() {
    let (mut device, state) = mock_device();
    let mut table = StageBindingTable::new();
    table
        .stage_mut(ShaderStage::Vertex)
        .set_program(Some(ProgramBinding::new(make_program_handle())));
    let op = RenderOperation::non_indexed(OperationType::PointList, 4);

    let outcome = submit(&mut device, &table, &op).unwrap();
    assert!(matches!(outcome, DrawOutcome::Drawn { .. }));
    assert_eq!(state.lock().unwrap().draws, 1);
}

#[test]
fn test_stream_output_allows_missing_fragment_program() {
    let (mut device, state) = mock_device();
    state.lock().unwrap().stream_output = true;
    let mut table = StageBindingTable::new();
    table
        .stage_mut(ShaderStage::Vertex)
        .set_program(Some(ProgramBinding::new(make_program_handle())));
    let op = RenderOperation::non_indexed(OperationType::TriangleList, 3);

    assert!(submit(&mut device, &table, &op).is_ok());
}

#[test]
fn test_hull_without_domain_names_missing_stage() {
    let (mut device, _) = mock_device();
    let mut table = graphics_table();
    table
        .stage_mut(ShaderStage::Hull)
        .set_program(Some(ProgramBinding::new(make_program_handle())));
    let op = RenderOperation::non_indexed(OperationType::TriangleList, 3);

    let err = submit(&mut device, &table, &op).unwrap_err();
    assert!(matches!(err, Error::Precondition(_)));
    assert!(format!("{}", err).contains("domain program is missing"));
}

#[test]
fn test_domain_without_hull_names_missing_stage() {
    let (mut device, _) = mock_device();
    let mut table = graphics_table();
    table
        .stage_mut(ShaderStage::Domain)
        .set_program(Some(ProgramBinding::new(make_program_handle())));
    let op = RenderOperation::non_indexed(OperationType::TriangleList, 3);

    let err = submit(&mut device, &table, &op).unwrap_err();
    assert!(format!("{}", err).contains("hull program is missing"));
}

#[test]
fn test_tessellation_reinterprets_topology_as_patches() {
    let (mut device, state) = mock_device();
    let mut table = graphics_table();
    table
        .stage_mut(ShaderStage::Hull)
        .set_program(Some(ProgramBinding::new(make_program_handle())));
    table
        .stage_mut(ShaderStage::Domain)
        .set_program(Some(ProgramBinding::new(make_program_handle())));

    let op = RenderOperation::non_indexed(OperationType::TriangleStrip, 12);
    let outcome = submit(&mut device, &table, &op).unwrap();
    assert_eq!(
        outcome,
        DrawOutcome::Drawn {
            primitive: PrimitiveKind::PatchList3ControlPoint,
            primitive_count: 10,
            variant: DrawVariant::Plain,
            passes: 1,
        }
    );
    assert!(state
        .lock()
        .unwrap()
        .calls
        .contains(&"set_primitive_topology(PatchList3ControlPoint)".to_string()));
}

#[test]
fn test_geometry_adjacency_selects_adjacency_topology() {
    let (mut device, _) = mock_device();
    let mut table = graphics_table();
    table
        .stage_mut(ShaderStage::Geometry)
        .set_program(Some(ProgramBinding::with_adjacency(make_program_handle())));

    let op = RenderOperation::non_indexed(OperationType::TriangleList, 6);
    let outcome = submit(&mut device, &table, &op).unwrap();
    match outcome {
        DrawOutcome::Drawn { primitive, .. } => {
            assert_eq!(primitive, PrimitiveKind::TriangleListAdjacency)
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[test]
fn test_triangle_fan_never_degrades() {
    let (mut device, state) = mock_device();
    let table = graphics_table();
    let op = RenderOperation::non_indexed(OperationType::TriangleFan, 9);

    let err = submit(&mut device, &table, &op).unwrap_err();
    assert!(matches!(err, Error::Precondition(_)));
    assert_eq!(state.lock().unwrap().draws, 0);
}

#[test]
fn test_compute_path_is_exclusive() {
    let (mut device, state) = mock_device();
    let mut table = StageBindingTable::new();
    table
        .stage_mut(ShaderStage::Compute)
        .set_program(Some(ProgramBinding::new(make_program_handle())));

    let op = RenderOperation::non_indexed(OperationType::TriangleList, 3);
    let outcome = submit(&mut device, &table, &op).unwrap();
    assert_eq!(outcome, DrawOutcome::Dispatched);

    let state = state.lock().unwrap();
    assert_eq!(state.dispatches, 1);
    assert_eq!(state.draws, 0);
    assert!(state.calls.contains(&"dispatch(1, 1, 1)".to_string()));
    assert!(state
        .calls
        .contains(&"unbind_compute_resources".to_string()));
    // The compute program is unbound after the dispatch
    assert!(state
        .calls
        .contains(&"bind_program(compute, none)".to_string()));
}

#[test]
fn test_draw_variant_priority() {
    let (mut device, _) = mock_device();
    let table = graphics_table();
    let index_data = IndexData {
        buffer: make_index_buffer_handle(),
        index_type: IndexType::U16,
        index_start: 0,
        index_count: 36,
    };

    // auto takes priority over everything (non-indexed sentinel)
    let mut op = RenderOperation::non_indexed(OperationType::TriangleList, AUTO_VERTEX_COUNT);
    op.vertex_data.has_instance_data = true;
    match submit(&mut device, &table, &op).unwrap() {
        DrawOutcome::Drawn { variant, .. } => assert_eq!(variant, DrawVariant::Auto),
        other => panic!("unexpected outcome {:?}", other),
    }

    // indexed + instanced
    let mut op = RenderOperation::non_indexed(OperationType::TriangleList, 12);
    op.index_data = Some(index_data);
    op.vertex_data.has_instance_data = true;
    match submit(&mut device, &table, &op).unwrap() {
        DrawOutcome::Drawn { variant, .. } => assert_eq!(variant, DrawVariant::IndexedInstanced),
        other => panic!("unexpected outcome {:?}", other),
    }

    // indexed
    let mut op = RenderOperation::non_indexed(OperationType::TriangleList, 12);
    op.index_data = Some(index_data);
    match submit(&mut device, &table, &op).unwrap() {
        DrawOutcome::Drawn { variant, .. } => assert_eq!(variant, DrawVariant::Indexed),
        other => panic!("unexpected outcome {:?}", other),
    }

    // instanced
    let mut op = RenderOperation::non_indexed(OperationType::TriangleList, 12);
    op.vertex_data.has_instance_data = true;
    match submit(&mut device, &table, &op).unwrap() {
        DrawOutcome::Drawn { variant, .. } => assert_eq!(variant, DrawVariant::Instanced),
        other => panic!("unexpected outcome {:?}", other),
    }

    // plain
    let op = RenderOperation::non_indexed(OperationType::TriangleList, 12);
    match submit(&mut device, &table, &op).unwrap() {
        DrawOutcome::Drawn { variant, .. } => assert_eq!(variant, DrawVariant::Plain),
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[test]
fn test_indexed_draw_uses_index_counts() {
    let (mut device, state) = mock_device();
    let table = graphics_table();
    let mut op = RenderOperation::non_indexed(OperationType::TriangleList, 4);
    op.vertex_data.vertex_start = 2;
    op.index_data = Some(IndexData {
        buffer: make_index_buffer_handle(),
        index_type: IndexType::U32,
        index_start: 6,
        index_count: 36,
    });

    let outcome = submit(&mut device, &table, &op).unwrap();
    match outcome {
        DrawOutcome::Drawn {
            primitive_count, ..
        } => assert_eq!(primitive_count, 12),
        other => panic!("unexpected outcome {:?}", other),
    }

    let state = state.lock().unwrap();
    assert!(state
        .calls
        .contains(&"bind_index_buffer(U32, 0)".to_string()));
    assert!(state.calls.contains(&"draw_indexed(36, 6, 2)".to_string()));
}

#[test]
fn test_global_instancing_multiplies_instances() {
    let (mut device, state) = mock_device();
    let table = graphics_table();
    let mut op = RenderOperation::non_indexed(OperationType::TriangleList, 3);
    op.instance_count = 4;
    op.use_global_instancing = true;

    let mut no_passes = || false;
    DrawTranslator::submit(&mut device, &table, &op, Some(8), &mut no_passes).unwrap();

    assert!(state
        .lock()
        .unwrap()
        .calls
        .contains(&"draw_instanced(3, 32, 0)".to_string()));
}

#[test]
fn test_zero_primitive_count_skips_draw() {
    let (mut device, state) = mock_device();
    let table = graphics_table();
    // 2 vertices cannot form a triangle
    let op = RenderOperation::non_indexed(OperationType::TriangleList, 2);

    let outcome = submit(&mut device, &table, &op).unwrap();
    assert_eq!(outcome, DrawOutcome::Skipped);
    let state = state.lock().unwrap();
    assert_eq!(state.draws, 0);
    assert_eq!(state.calls_matching("set_primitive_topology"), 0);
}

#[test]
fn test_pass_iteration_loops_draw() {
    let (mut device, state) = mock_device();
    let table = graphics_table();
    let op = RenderOperation::non_indexed(OperationType::TriangleList, 3);

    let mut remaining = 2u32;
    let mut two_more_passes = move || {
        if remaining > 0 {
            remaining -= 1;
            true
        } else {
            false
        }
    };
    let outcome =
        DrawTranslator::submit(&mut device, &table, &op, None, &mut two_more_passes).unwrap();
    match outcome {
        DrawOutcome::Drawn { passes, .. } => assert_eq!(passes, 3),
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(state.lock().unwrap().draws, 3);
}
