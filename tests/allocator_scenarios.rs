//! Concrete allocator scenarios from the engine's invariant list, exercised
//! through the public crate API rather than the allocators' own inline
//! unit tests.

use astral::util::{IntervalAllocator, TileAllocator};

#[test]
fn interval_allocator_coalesce_then_satisfy_larger_request() {
    let mut allocator = IntervalAllocator::new(1, 8);
    let a = allocator.allocate(3).unwrap();
    let b = allocator.allocate(2).unwrap();
    let c = allocator.allocate(3).unwrap();
    assert_eq!((a.start, a.end()), (0, 3));
    assert_eq!((b.start, b.end()), (3, 5));
    assert_eq!((c.start, c.end()), (5, 8));

    allocator.release(b);
    allocator.release(a);
    assert!(allocator.check_invariants());

    let merged = allocator.allocate(5).unwrap();
    assert_eq!((merged.start, merged.end()), (0, 5));
}

#[test]
fn tile_allocator_split_and_coalesce_back_to_root() {
    let mut allocator = TileAllocator::new(6, 6, 1, 1, 1);
    let a = allocator.allocate_tile(5, 6).unwrap(); // 32x64
    let b = allocator.allocate_tile(5, 5).unwrap(); // 32x32
    let c = allocator.allocate_tile(5, 5).unwrap(); // 32x32

    allocator.release_tile(b);
    allocator.release_tile(c);
    assert!(allocator.check_no_free_siblings());

    let root = allocator.allocate_tile(6, 6).unwrap();
    assert_eq!((root.width(), root.height()), (64, 64));
    allocator.release_tile(root);
    allocator.release_tile(a);
}

#[test]
fn region_of_100x50_covers_exactly_with_no_t_junctions() {
    let mut allocator = TileAllocator::new(7, 7, 4, 4, 1);
    let region = allocator.allocate_region(100, 50).unwrap();

    let total_area: u64 = region
        .tiles
        .iter()
        .map(|t| t.width() as u64 * t.height() as u64)
        .sum();
    assert_eq!(total_area, 100 * 50);
    assert!(region.tiles.len() >= 2 && region.tiles.len() <= 4);
}

#[test]
fn interval_allocator_single_slot_layer_is_exhausted_after_one_allocation() {
    let mut allocator = IntervalAllocator::new(1, 1);
    assert!(allocator.allocate(1).is_some());
    assert!(allocator.allocate(1).is_none());
}
