//! Unit tests for the pipeline state cache
//!
//! The core property: resolve rebuilds the native object if and only if at
//! least one field changed since the last resolve.

use crate::binding::{BindingTranslator, ShaderStage};
use crate::device::mock_device::{make_texture_view_handle, MockDevice, MockDeviceState};
use crate::device::{NativeCallError, NativeDevice};
use crate::pipeline::{
    PipelineContext, PipelineStateCache, PolygonMode, SceneBlendFactor, SceneBlendOperation,
};
use std::sync::{Arc, Mutex};

fn mock_device() -> (MockDevice, Arc<Mutex<MockDeviceState>>) {
    let state = Arc::new(Mutex::new(MockDeviceState::default()));
    (MockDevice::new(state.clone()), state)
}

#[test]
fn test_first_resolve_builds_all_states() {
    let (mut device, state) = mock_device();
    let mut ctx = PipelineContext::new();
    let mut cache = PipelineStateCache::new();

    cache.apply_graphics_states(&mut device, &mut ctx).unwrap();

    let state = state.lock().unwrap();
    assert_eq!(state.blend_states_created, 1);
    assert_eq!(state.rasterizer_states_created, 1);
    assert_eq!(state.depth_stencil_states_created, 1);
}

#[test]
fn test_repeated_resolve_without_mutation_reuses_handles() {
    let (mut device, state) = mock_device();
    let mut ctx = PipelineContext::new();
    let mut cache = PipelineStateCache::new();

    let blend_a = cache.resolve_blend(&mut device, &mut ctx).unwrap();
    let blend_b = cache.resolve_blend(&mut device, &mut ctx).unwrap();
    let blend_c = cache.resolve_blend(&mut device, &mut ctx).unwrap();

    assert_eq!(blend_a, blend_b);
    assert_eq!(blend_b, blend_c);
    assert_eq!(state.lock().unwrap().blend_states_created, 1);
}

#[test]
fn test_mutation_triggers_exactly_one_rebuild() {
    let (mut device, state) = mock_device();
    let mut ctx = PipelineContext::new();
    let mut cache = PipelineStateCache::new();

    let first = cache.resolve_blend(&mut device, &mut ctx).unwrap();

    ctx.set_scene_blending(
        SceneBlendFactor::SourceAlpha,
        SceneBlendFactor::OneMinusSourceAlpha,
        SceneBlendOperation::Add,
        false,
    );

    let second = cache.resolve_blend(&mut device, &mut ctx).unwrap();
    let third = cache.resolve_blend(&mut device, &mut ctx).unwrap();

    assert_ne!(first, second);
    assert_eq!(second, third);
    assert_eq!(state.lock().unwrap().blend_states_created, 2);
}

#[test]
fn test_categories_rebuild_independently() {
    let (mut device, state) = mock_device();
    let mut ctx = PipelineContext::new();
    let mut cache = PipelineStateCache::new();

    cache.apply_graphics_states(&mut device, &mut ctx).unwrap();
    ctx.set_polygon_mode(PolygonMode::Wireframe);
    cache.apply_graphics_states(&mut device, &mut ctx).unwrap();

    let state = state.lock().unwrap();
    assert_eq!(state.blend_states_created, 1);
    assert_eq!(state.rasterizer_states_created, 2);
    assert_eq!(state.depth_stencil_states_created, 1);
}

#[test]
fn test_rebuild_failure_is_fatal_and_carries_operation() {
    let (mut device, state) = mock_device();
    let mut ctx = PipelineContext::new();
    let mut cache = PipelineStateCache::new();

    state.lock().unwrap().fail_next_create =
        Some(NativeCallError::new(0x70057, "invalid descriptor"));

    let err = cache.resolve_blend(&mut device, &mut ctx).unwrap_err();
    let msg = format!("{}", err);
    assert!(msg.contains("create blend state"));
    assert!(msg.contains("invalid descriptor"));
    assert!(msg.contains("0x70057"));
}

#[test]
fn test_invalidate_forces_rebuild_without_descriptor_change() {
    let (mut device, state) = mock_device();
    let mut ctx = PipelineContext::new();
    let mut cache = PipelineStateCache::new();

    cache.apply_graphics_states(&mut device, &mut ctx).unwrap();
    cache.invalidate();
    // descriptors untouched, but the cached handles died with the device
    cache.apply_graphics_states(&mut device, &mut ctx).unwrap();

    assert_eq!(state.lock().unwrap().blend_states_created, 2);
}

#[test]
fn test_sampler_resolution_depends_on_used_units() {
    let (mut device, state) = mock_device();
    let mut ctx = PipelineContext::new();
    let mut cache = PipelineStateCache::new();
    let mut bindings = BindingTranslator::new();

    // Three units, the middle one unused
    bindings
        .bind_texture(ShaderStage::Fragment, 0, Some(make_texture_view_handle()))
        .unwrap();
    bindings
        .bind_texture(ShaderStage::Fragment, 2, Some(make_texture_view_handle()))
        .unwrap();

    let rebuilt = cache
        .resolve_samplers(&mut device, &mut ctx, bindings.table())
        .unwrap();
    assert!(rebuilt);

    // Only the used units got sampler objects; the gap stays None
    assert_eq!(state.lock().unwrap().sampler_states_created, 2);
    let samplers = cache.stage_samplers(ShaderStage::Fragment);
    assert_eq!(samplers.len(), 3);
    assert!(samplers[0].is_some());
    assert!(samplers[1].is_none());
    assert!(samplers[2].is_some());
}

#[test]
fn test_sampler_resolution_skips_when_clean() {
    let (mut device, state) = mock_device();
    let mut ctx = PipelineContext::new();
    let mut cache = PipelineStateCache::new();
    let mut bindings = BindingTranslator::new();

    bindings
        .bind_texture(ShaderStage::Fragment, 0, Some(make_texture_view_handle()))
        .unwrap();

    assert!(cache
        .resolve_samplers(&mut device, &mut ctx, bindings.table())
        .unwrap());
    assert!(!cache
        .resolve_samplers(&mut device, &mut ctx, bindings.table())
        .unwrap());
    assert_eq!(state.lock().unwrap().sampler_states_created, 1);
}

#[test]
fn test_unbinding_last_texture_shrinks_used_units() {
    let (mut device, _state) = mock_device();
    let mut ctx = PipelineContext::new();
    let mut cache = PipelineStateCache::new();
    let mut bindings = BindingTranslator::new();

    bindings
        .bind_texture(ShaderStage::Fragment, 0, Some(make_texture_view_handle()))
        .unwrap();
    bindings
        .bind_texture(ShaderStage::Fragment, 1, Some(make_texture_view_handle()))
        .unwrap();
    cache
        .resolve_samplers(&mut device, &mut ctx, bindings.table())
        .unwrap();
    assert_eq!(cache.stage_samplers(ShaderStage::Fragment).len(), 2);

    bindings.bind_texture(ShaderStage::Fragment, 1, None).unwrap();
    ctx.mark_samplers_dirty();
    cache
        .resolve_samplers(&mut device, &mut ctx, bindings.table())
        .unwrap();
    assert_eq!(cache.stage_samplers(ShaderStage::Fragment).len(), 1);
}

#[test]
fn test_sampler_lod_bias_adjustment() {
    use crate::pipeline::SamplerStateDesc;

    let desc = SamplerStateDesc {
        mip_lod_bias: 2.0,
        ..SamplerStateDesc::default()
    };
    let resolved = desc.resolved();
    assert!((resolved.mip_lod_bias - 1.5).abs() < f32::EPSILON);

    let extreme = SamplerStateDesc {
        mip_lod_bias: 100.0,
        ..SamplerStateDesc::default()
    };
    assert!((extreme.resolved().mip_lod_bias - 15.99).abs() < f32::EPSILON);

    let negative = SamplerStateDesc {
        mip_lod_bias: -100.0,
        ..SamplerStateDesc::default()
    };
    assert!((negative.resolved().mip_lod_bias + 16.0).abs() < f32::EPSILON);
}
