/// Tests for the buffer handler

use super::*;
use crate::backend::null::NullBackend;
use crate::backend::types::{BufferDesc, BufferUsage};

fn storage_desc(size: u64) -> BufferDesc {
    BufferDesc {
        size,
        usage: BufferUsage::STORAGE,
    }
}

#[test]
fn test_create_and_resolve() {
    let mut backend = NullBackend::new();
    let mut handler = BufferHandler::new();

    let id = handler.create(&mut backend, &storage_desc(256)).unwrap();
    assert!(handler.contains(id));
    assert_eq!(handler.get(id).unwrap().size(), 256);
    assert_eq!(handler.len(), 1);
}

#[test]
fn test_destroy_recycles_id() {
    let mut backend = NullBackend::new();
    let mut handler = BufferHandler::new();

    let id = handler.create(&mut backend, &storage_desc(64)).unwrap();
    assert!(handler.destroy(id));
    assert!(!handler.contains(id));
    assert!(handler.get(id).is_err());

    // The recycled slot produces a distinct ID
    let next = handler.create(&mut backend, &storage_desc(64)).unwrap();
    assert_ne!(id, next);
    assert!(handler.get(id).is_err());
    assert!(handler.get(next).is_ok());
}

#[test]
fn test_destroy_twice_returns_false() {
    let mut backend = NullBackend::new();
    let mut handler = BufferHandler::new();

    let id = handler.create(&mut backend, &storage_desc(64)).unwrap();
    assert!(handler.destroy(id));
    assert!(!handler.destroy(id));
}

#[test]
fn test_update_roundtrip() {
    let mut backend = NullBackend::new();
    let mut handler = BufferHandler::new();

    let id = handler.create(&mut backend, &storage_desc(16)).unwrap();
    handler.update(id, 4, &[1, 2, 3, 4]).unwrap();

    let gpu = handler.get(id).unwrap();
    let null_buffer = gpu
        .as_any()
        .downcast_ref::<crate::backend::null::NullBuffer>()
        .unwrap();
    assert_eq!(&null_buffer.contents()[4..8], &[1, 2, 3, 4]);
}

#[test]
fn test_update_typed_uses_pod_bytes() {
    let mut backend = NullBackend::new();
    let mut handler = BufferHandler::new();

    let id = handler.create(&mut backend, &storage_desc(8)).unwrap();
    handler.update_typed::<u32>(id, 0, &[0xAABBCCDD, 0x11223344]).unwrap();

    let gpu = handler.get(id).unwrap();
    let null_buffer = gpu
        .as_any()
        .downcast_ref::<crate::backend::null::NullBuffer>()
        .unwrap();
    assert_eq!(null_buffer.contents(), 0xAABBCCDDu32.to_ne_bytes()
        .iter()
        .chain(0x11223344u32.to_ne_bytes().iter())
        .copied()
        .collect::<Vec<u8>>());
}

// ============================================================================
// Tests: Temporary buffer lifetime
// ============================================================================

#[test]
fn test_temporary_alive_for_exactly_k_ticks() {
    let mut backend = NullBackend::new();
    let mut handler = BufferHandler::new();

    let k = 3;
    let id = handler
        .create_temporary(&mut backend, &storage_desc(32), k)
        .unwrap();

    // Alive in the creation frame
    assert!(handler.contains(id));

    // Alive at each of the next K frame-start ticks
    for tick in 1..=k {
        handler.begin_frame();
        assert!(handler.contains(id), "expired too early at tick {}", tick);
    }

    // Unresolvable at tick K+1, ID recycled
    handler.begin_frame();
    assert!(!handler.contains(id));
    assert!(handler.get(id).is_err());
}

#[test]
fn test_temporary_lifetime_one() {
    let mut backend = NullBackend::new();
    let mut handler = BufferHandler::new();

    let id = handler
        .create_temporary(&mut backend, &storage_desc(32), 1)
        .unwrap();

    handler.begin_frame();
    assert!(handler.contains(id));

    handler.begin_frame();
    assert!(!handler.contains(id));
}

#[test]
fn test_independent_temporary_lifetimes() {
    let mut backend = NullBackend::new();
    let mut handler = BufferHandler::new();

    let short = handler
        .create_temporary(&mut backend, &storage_desc(32), 1)
        .unwrap();
    let long = handler
        .create_temporary(&mut backend, &storage_desc(32), 3)
        .unwrap();

    handler.begin_frame();
    handler.begin_frame();
    assert!(!handler.contains(short));
    assert!(handler.contains(long));

    handler.begin_frame();
    handler.begin_frame();
    assert!(!handler.contains(long));
}

#[test]
fn test_manual_destroy_of_temporary_is_clean() {
    let mut backend = NullBackend::new();
    let mut handler = BufferHandler::new();

    let id = handler
        .create_temporary(&mut backend, &storage_desc(32), 2)
        .unwrap();
    assert!(handler.destroy(id));

    // Ticking past the original lifetime must not disturb other buffers
    let other = handler.create(&mut backend, &storage_desc(32)).unwrap();
    for _ in 0..4 {
        handler.begin_frame();
    }
    assert!(handler.contains(other));
}

#[test]
fn test_stale_temporary_id_stays_stale_after_recycle() {
    let mut backend = NullBackend::new();
    let mut handler = BufferHandler::new();

    let temp = handler
        .create_temporary(&mut backend, &storage_desc(32), 1)
        .unwrap();
    handler.begin_frame();
    handler.begin_frame();

    // Slot may be reused, but the stale ID never resolves to the new buffer
    let reused = handler.create(&mut backend, &storage_desc(32)).unwrap();
    assert!(handler.get(temp).is_err());
    assert!(handler.get(reused).is_ok());
}
