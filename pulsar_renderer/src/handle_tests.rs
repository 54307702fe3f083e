/// Tests for typed resource IDs

use super::*;
use slotmap::SlotMap;

#[test]
fn test_default_is_invalid() {
    let id = BufferId::default();
    assert!(!id.is_valid());
    assert_eq!(id, BufferId::invalid());
}

#[test]
fn test_allocated_id_is_valid() {
    let mut map: SlotMap<BufferId, u32> = SlotMap::with_key();
    let id = map.insert(7);
    assert!(id.is_valid());
    assert_eq!(map[id], 7);
}

#[test]
fn test_stale_id_does_not_resolve_after_recycle() {
    let mut map: SlotMap<TextureId, &str> = SlotMap::with_key();
    let first = map.insert("first");
    map.remove(first);

    // The slot gets recycled, but the generation bump invalidates `first`
    let second = map.insert("second");
    assert!(map.get(first).is_none());
    assert_eq!(map.get(second), Some(&"second"));
    assert_ne!(first, second);
}

#[test]
fn test_invalid_id_never_resolves() {
    let map: SlotMap<ImageId, u32> = SlotMap::with_key();
    assert!(map.get(ImageId::invalid()).is_none());
}

#[test]
fn test_ids_of_different_kinds_are_distinct_types() {
    // Purely a compile-time property; exercise the raw escape hatch instead
    let mut buffers: SlotMap<BufferId, ()> = SlotMap::with_key();
    let mut images: SlotMap<ImageId, ()> = SlotMap::with_key();
    let b = buffers.insert(());
    let i = images.insert(());
    assert_ne!(b.raw(), 0);
    assert_ne!(i.raw(), 0);
}

#[test]
fn test_raw_is_stable_for_equal_ids() {
    let mut map: SlotMap<GraphicsPipelineId, ()> = SlotMap::with_key();
    let id = map.insert(());
    let copy = id;
    assert_eq!(id.raw(), copy.raw());
}
