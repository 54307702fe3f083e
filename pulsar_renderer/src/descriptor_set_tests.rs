/// Tests for name-based descriptor sets

use super::*;
use crate::handle::{BufferId, TextureId};
use slotmap::SlotMap;

fn buffer_ids(n: usize) -> Vec<BufferId> {
    let mut map: SlotMap<BufferId, ()> = SlotMap::with_key();
    (0..n).map(|_| map.insert(())).collect()
}

fn texture_ids(n: usize) -> Vec<TextureId> {
    let mut map: SlotMap<TextureId, ()> = SlotMap::with_key();
    (0..n).map(|_| map.insert(())).collect()
}

// ============================================================================
// Tests: Name hashing
// ============================================================================

#[test]
fn test_name_hash_is_deterministic() {
    assert_eq!(
        descriptor_name_hash("u_albedo"),
        descriptor_name_hash("u_albedo")
    );
}

#[test]
fn test_name_hash_differs_between_names() {
    assert_ne!(
        descriptor_name_hash("u_albedo"),
        descriptor_name_hash("u_normal")
    );
}

#[test]
fn test_name_hash_known_values() {
    // FNV-1a 32-bit reference values
    assert_eq!(descriptor_name_hash(""), 0x811c9dc5);
    assert_eq!(descriptor_name_hash("a"), 0xe40c292c);
}

#[test]
fn test_name_hash_usable_in_const_context() {
    const HASH: u32 = descriptor_name_hash("u_view_projection");
    assert_eq!(HASH, descriptor_name_hash("u_view_projection"));
}

// ============================================================================
// Tests: Binding
// ============================================================================

#[test]
fn test_new_set_is_empty() {
    let set = DescriptorSet::new();
    assert!(set.is_empty());
    assert_eq!(set.len(), 0);
}

#[test]
fn test_bind_appends_in_order() {
    let buffers = buffer_ids(2);
    let textures = texture_ids(1);

    let mut set = DescriptorSet::new();
    set.bind_buffer("u_globals", buffers[0]);
    set.bind_texture("u_albedo", textures[0]);
    set.bind_buffer("u_lights", buffers[1]);

    let descriptors = set.descriptors();
    assert_eq!(descriptors.len(), 3);
    assert_eq!(descriptors[0].name_hash, descriptor_name_hash("u_globals"));
    assert_eq!(descriptors[1].name_hash, descriptor_name_hash("u_albedo"));
    assert_eq!(descriptors[2].name_hash, descriptor_name_hash("u_lights"));
}

#[test]
fn test_rebind_same_name_overwrites_in_place() {
    let buffers = buffer_ids(2);

    let mut set = DescriptorSet::new();
    set.bind_buffer("u_globals", buffers[0]);
    set.bind_buffer("u_globals", buffers[1]);

    assert_eq!(set.len(), 1);
    assert_eq!(
        set.descriptors()[0].resource,
        DescriptorResource::Buffer(buffers[1])
    );
}

#[test]
fn test_rebind_may_change_resource_kind() {
    let buffers = buffer_ids(1);
    let textures = texture_ids(1);

    let mut set = DescriptorSet::new();
    set.bind_buffer("u_data", buffers[0]);
    set.bind_texture("u_data", textures[0]);

    assert_eq!(set.len(), 1);
    assert_eq!(
        set.descriptors()[0].resource,
        DescriptorResource::Texture(textures[0])
    );
}

#[test]
fn test_rebind_keeps_original_position() {
    let buffers = buffer_ids(3);

    let mut set = DescriptorSet::new();
    set.bind_buffer("a", buffers[0]);
    set.bind_buffer("b", buffers[1]);
    set.bind_buffer("a", buffers[2]);

    assert_eq!(set.len(), 2);
    assert_eq!(set.descriptors()[0].name_hash, descriptor_name_hash("a"));
    assert_eq!(
        set.descriptors()[0].resource,
        DescriptorResource::Buffer(buffers[2])
    );
}

#[test]
fn test_clone_snapshots_bindings() {
    let buffers = buffer_ids(2);

    let mut set = DescriptorSet::new();
    set.bind_buffer("u_globals", buffers[0]);

    let snapshot = set.clone();
    set.bind_buffer("u_globals", buffers[1]);

    // The snapshot still holds the binding captured at clone time
    assert_eq!(
        snapshot.descriptors()[0].resource,
        DescriptorResource::Buffer(buffers[0])
    );
    assert_eq!(
        set.descriptors()[0].resource,
        DescriptorResource::Buffer(buffers[1])
    );
}

#[test]
fn test_clear_removes_all_bindings() {
    let buffers = buffer_ids(1);

    let mut set = DescriptorSet::new();
    set.bind_buffer("u_globals", buffers[0]);
    set.clear();

    assert!(set.is_empty());
}
