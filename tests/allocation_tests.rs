//! Allocation Tests
//!
//! Lookups are issued on every kernel launch, so `find` must not touch the
//! heap. This file installs an instrumented global allocator and therefore
//! holds a single test, keeping other threads from polluting the counts.

use autotune_cache::{compose_key, AlgorithmsCache};
use stats_alloc::{Region, StatsAlloc, INSTRUMENTED_SYSTEM};
use std::alloc::System;

#[global_allocator]
static GLOBAL: &StatsAlloc<System> = &INSTRUMENTED_SYSTEM;

#[test]
fn test_find_and_key_composition_do_not_allocate() {
    let cache: AlgorithmsCache<i64> = AlgorithmsCache::new();
    let shape = [1i64, 3, 224, 224];
    let present = compose_key!(shape, 1i32);
    cache.set(present, 5);

    let region = Region::new(GLOBAL);

    let absent = compose_key!(shape, 2i32);
    for _ in 0..100 {
        assert!(cache.find(present));
        assert!(!cache.find(absent));
    }
    let algo = cache.get_with(present, |algo| *algo).unwrap_or(-1);

    let change = region.change();
    assert_eq!(change.allocations, 0);
    assert_eq!(change.reallocations, 0);

    assert_eq!(algo, 5);
    assert_eq!(cache.hits(), 100);
    assert_eq!(cache.misses(), 100);
}
