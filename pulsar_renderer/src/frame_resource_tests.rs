/// Tests for the per-frame resource ring

use super::*;

#[test]
fn test_from_fn_initializes_each_slot() {
    let ring: FrameResource<usize, 3> = FrameResource::from_fn(|i| i * 10);
    assert_eq!(*ring.get(0), 0);
    assert_eq!(*ring.get(1), 10);
    assert_eq!(*ring.get(2), 20);
}

#[test]
fn test_frame_index_wraps_modulo() {
    let ring: FrameResource<usize, 2> = FrameResource::from_fn(|i| i);
    assert_eq!(*ring.get(0), 0);
    assert_eq!(*ring.get(1), 1);
    assert_eq!(*ring.get(2), 0);
    assert_eq!(*ring.get(3), 1);
    assert_eq!(*ring.get(101), 1);
}

#[test]
fn test_write_to_current_slot_preserves_older_slot() {
    let mut ring: FrameResource<u32, 2> = FrameResource::default();

    *ring.get_mut(0) = 7;
    *ring.get_mut(1) = 9;

    // Advancing to frame 2 writes slot 0; slot 1 (frame 1) is untouched
    *ring.get_mut(2) = 11;
    assert_eq!(*ring.get(2), 11);
    assert_eq!(*ring.get(1), 9);
}

#[test]
fn test_default_frame_count() {
    let ring: FrameResource<u32> = FrameResource::default();
    assert_eq!(ring.len(), FRAMES_IN_FLIGHT);
}

#[test]
fn test_slot_helper_matches_get() {
    assert_eq!(FrameResource::<u32, 2>::slot(5), 1);
    assert_eq!(FrameResource::<u32, 3>::slot(5), 2);
}

#[test]
fn test_iter_visits_all_slots() {
    let ring: FrameResource<usize, 4> = FrameResource::from_fn(|i| i);
    let collected: Vec<usize> = ring.iter().copied().collect();
    assert_eq!(collected, vec![0, 1, 2, 3]);
}
