/// Tests for reflection-driven descriptor resolution

use super::*;
use crate::backend::reflection::{BindingType, ReflectedBinding, ShaderReflection, ShaderStageFlags};
use crate::backend::types::DescriptorSlot;
use crate::descriptor_set::DescriptorSet;
use crate::handle::{BufferId, TextureId};
use crate::resources::RenderResources;
use slotmap::SlotMap;

fn buffer_id() -> BufferId {
    let mut map: SlotMap<BufferId, ()> = SlotMap::with_key();
    map.insert(())
}

fn texture_id() -> TextureId {
    let mut map: SlotMap<TextureId, ()> = SlotMap::with_key();
    map.insert(())
}

fn reflection_with(bindings: Vec<ReflectedBinding>) -> ShaderReflection {
    ShaderReflection {
        bindings,
        push_constants: vec![],
    }
}

#[test]
fn test_resolves_name_to_set_and_binding() {
    let reflection = reflection_with(vec![ReflectedBinding::new(
        "u_globals",
        0,
        3,
        BindingType::UniformBuffer,
        1,
        ShaderStageFlags::VERTEX,
    )]);

    let mut set = DescriptorSet::new();
    set.bind_buffer("u_globals", buffer_id());

    let resolved =
        resolve_descriptor_set(DescriptorSlot::Global, set.descriptors(), &reflection).unwrap();
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].binding, 3);
    assert_eq!(resolved[0].binding_type, BindingType::UniformBuffer);
}

#[test]
fn test_unresolved_name_is_skipped_not_fatal() {
    let reflection = reflection_with(vec![]);

    let mut set = DescriptorSet::new();
    set.bind_buffer("u_never_declared", buffer_id());

    let resolved =
        resolve_descriptor_set(DescriptorSlot::Global, set.descriptors(), &reflection).unwrap();
    assert!(resolved.is_empty());
}

#[test]
fn test_name_in_other_set_is_skipped_for_this_slot() {
    let reflection = reflection_with(vec![ReflectedBinding::new(
        "u_per_draw",
        2,
        0,
        BindingType::UniformBuffer,
        1,
        ShaderStageFlags::FRAGMENT,
    )]);

    let mut set = DescriptorSet::new();
    set.bind_buffer("u_per_draw", buffer_id());

    // Bound at Global (set 0), but reflected in set 2
    let at_global =
        resolve_descriptor_set(DescriptorSlot::Global, set.descriptors(), &reflection).unwrap();
    assert!(at_global.is_empty());

    // Bound at PerDraw (set 2), it resolves
    let at_per_draw =
        resolve_descriptor_set(DescriptorSlot::PerDraw, set.descriptors(), &reflection).unwrap();
    assert_eq!(at_per_draw.len(), 1);
}

#[test]
fn test_inconsistent_set_indices_error() {
    let reflection = reflection_with(vec![
        ReflectedBinding::new(
            "u_shared",
            0,
            0,
            BindingType::UniformBuffer,
            1,
            ShaderStageFlags::VERTEX,
        ),
        ReflectedBinding::new(
            "u_shared",
            1,
            0,
            BindingType::UniformBuffer,
            1,
            ShaderStageFlags::FRAGMENT,
        ),
    ]);

    let mut set = DescriptorSet::new();
    set.bind_buffer("u_shared", buffer_id());

    assert!(resolve_descriptor_set(DescriptorSlot::Global, set.descriptors(), &reflection).is_err());
}

#[test]
fn test_type_mismatch_is_skipped() {
    let reflection = reflection_with(vec![ReflectedBinding::new(
        "u_albedo",
        0,
        0,
        BindingType::CombinedImageSampler,
        1,
        ShaderStageFlags::FRAGMENT,
    )]);

    // Bind a buffer where the shader wants a sampled texture
    let mut set = DescriptorSet::new();
    set.bind_buffer("u_albedo", buffer_id());

    let resolved =
        resolve_descriptor_set(DescriptorSlot::Global, set.descriptors(), &reflection).unwrap();
    assert!(resolved.is_empty());
}

#[test]
fn test_mixed_resolution_keeps_accumulation_order() {
    let reflection = reflection_with(vec![
        ReflectedBinding::new(
            "u_globals",
            0,
            0,
            BindingType::UniformBuffer,
            1,
            ShaderStageFlags::VERTEX,
        ),
        ReflectedBinding::new(
            "u_albedo",
            0,
            1,
            BindingType::CombinedImageSampler,
            1,
            ShaderStageFlags::FRAGMENT,
        ),
    ]);

    let mut set = DescriptorSet::new();
    set.bind_buffer("u_globals", buffer_id());
    set.bind_texture("u_albedo", texture_id());
    set.bind_buffer("u_unused", buffer_id());

    let resolved =
        resolve_descriptor_set(DescriptorSlot::Global, set.descriptors(), &reflection).unwrap();
    assert_eq!(resolved.len(), 2);
    assert_eq!(resolved[0].binding, 0);
    assert_eq!(resolved[1].binding, 1);
}

#[test]
fn test_attach_resources_fails_on_stale_id() {
    let reflection = reflection_with(vec![ReflectedBinding::new(
        "u_globals",
        0,
        0,
        BindingType::UniformBuffer,
        1,
        ShaderStageFlags::VERTEX,
    )]);

    let mut set = DescriptorSet::new();
    set.bind_buffer("u_globals", buffer_id());

    let resolved =
        resolve_descriptor_set(DescriptorSlot::Global, set.descriptors(), &reflection).unwrap();

    // The buffer ID was never registered with these handlers
    let resources = RenderResources::new();
    assert!(attach_resources(&resolved, &resources).is_err());
}

#[test]
fn test_attach_resources_resolves_live_ids() {
    use crate::backend::null::NullBackend;
    use crate::backend::types::{BufferDesc, BufferUsage};

    let mut backend = NullBackend::new();
    let mut resources = RenderResources::new();
    let buffer = resources
        .buffers
        .create(
            &mut backend,
            &BufferDesc {
                size: 64,
                usage: BufferUsage::UNIFORM,
            },
        )
        .unwrap();

    let reflection = reflection_with(vec![ReflectedBinding::new(
        "u_globals",
        0,
        0,
        BindingType::UniformBuffer,
        1,
        ShaderStageFlags::VERTEX,
    )]);

    let mut set = DescriptorSet::new();
    set.bind_buffer("u_globals", buffer);

    let resolved =
        resolve_descriptor_set(DescriptorSlot::Global, set.descriptors(), &reflection).unwrap();
    let attached = attach_resources(&resolved, &resources).unwrap();
    assert_eq!(attached.len(), 1);
}
