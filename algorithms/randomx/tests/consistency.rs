//! Consistency & Regression Tests
//!
//! Verifies that the different ways of reaching a dataset item agree.
//! - Cache items vs materialized ranges
//! - Light vs Full dataset sources
//! - Bare VM vs pooled handle
//! - Light vs Fast mode (ignored by default: needs 2 GiB)

#![allow(clippy::pedantic, clippy::nursery)]
#![allow(clippy::unwrap_used)]

use std::sync::{Arc, OnceLock};

use randomx::{Cache, Dataset, DatasetSource, Mode, RandomX, Vm};

const KEY: &[u8] = b"test key 000";

fn cache() -> Arc<Cache> {
    static CACHE: OnceLock<Arc<Cache>> = OnceLock::new();
    Arc::clone(CACHE.get_or_init(|| Arc::new(Cache::new(KEY).unwrap())))
}

// =============================================================================
// DATASET CONSISTENCY
// =============================================================================

#[test]
fn test_range_matches_cache_items() {
    let cache = cache();
    // Spans several parallel batches and ends on a partial one.
    let start = 1_000;
    let count = 2 * 4096 + 17;
    let dataset = Dataset::init_range(&cache, start, count).unwrap();

    assert_eq!(dataset.start(), start);
    assert_eq!(dataset.len(), count as usize);
    assert!(!dataset.is_complete());

    for index in start..start + count {
        assert_eq!(
            dataset.get(index),
            Some(&cache.dataset_item(index)),
            "CONSISTENCY FAILURE at item {index}"
        );
    }
    assert_eq!(dataset.get(start - 1), None);
    assert_eq!(dataset.get(start + count), None);
}

#[test]
fn test_full_source_matches_light_source() {
    let cache = cache();
    let range = Arc::new(Dataset::init_range(&cache, 34_000_000, 64).unwrap());
    let light = DatasetSource::Light(Arc::clone(&cache));
    let full = DatasetSource::Full(range);

    for index in 34_000_000..34_000_064 {
        assert_eq!(full.item(index), light.item(index));
    }
}

#[test]
#[should_panic(expected = "outside materialized range")]
fn test_full_source_outside_range_panics() {
    let cache = cache();
    let full = DatasetSource::Full(Arc::new(Dataset::init_range(&cache, 10, 4).unwrap()));
    let _ = full.item(14);
}

#[test]
fn test_empty_range() {
    let dataset = Dataset::init_range(&cache(), 0, 0).unwrap();
    assert!(dataset.is_empty());
    assert_eq!(dataset.get(0), None);
}

// =============================================================================
// VM CONSISTENCY
// =============================================================================

#[test]
fn test_bare_vm_matches_handle() {
    let source = DatasetSource::Light(cache());
    let rx = RandomX::new(KEY, Mode::Light).unwrap();
    let mut vm = Vm::new();

    let first = vm.calculate_hash(b"This is a test", &source);
    assert_eq!(first, rx.hash(b"This is a test"));

    // A reused VM carries no state from the previous hash.
    let _ = vm.calculate_hash(b"Lorem ipsum dolor sit amet", &source);
    assert_eq!(vm.calculate_hash(b"This is a test", &source), first);
}

#[test]
#[ignore = "materializes the 2 GiB dataset"]
fn test_fast_mode_matches_light_mode() {
    let fast = RandomX::new(KEY, Mode::Fast).unwrap();
    let light = RandomX::new(KEY, Mode::Light).unwrap();

    for input in [&b"This is a test"[..], b"Lorem ipsum dolor sit amet"] {
        assert_eq!(fast.hash(input), light.hash(input));
    }
    assert_eq!(
        hex::encode(fast.hash(b"This is a test")),
        "639183aae1bf4c9a35884cb46b09cad9175f04efd7684e7262a0ac1c2f0b4e3f"
    );
}
